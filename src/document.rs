//! JSON 查询文档的解析器
//!
//! 文档沿用数组字面量的写法描述过滤条件:
//!
//! ```text
//! {
//!   "filter": {
//!     "name": "John",                          // (name eq 'John')
//!     "city": ["eq", "New York", "or"],        // (city eq 'New York') or ...
//!     "age": [["ge", 20], ["le", 60]],         // 同一字段上的多个操作
//!     "born": ["between", [{"$date": "1990-01-01"}, {"$date": "1999-12-31"}]],
//!     "id": ["gt", {"$guid": "64fd1ec3-1d41-ee11-9d4a-86afca43b09d"}],
//!     "emails": ["any", ["contains", "gmail"]],
//!     "users": ["all", {"age": ["ge", 20]}],
//!     "_0": ["group", {"a": ["eq", 1, "or"], "b": 2}],
//!     "tags": ["raw", "/any(t: t eq 'x')"]
//!   },
//!   "orderBy": [["name", "asc"], [["address", "city"], "desc"]],
//!   "select": ["name"], "expand": ["orders"],
//!   "top": 10, "skip": 20, "count": true
//! }
//! ```
//!
//! 未知运算符或形状不符的操作数会被静默丢弃 (记录 debug 日志),
//! 只有无法解释的结构 (非法 JSON, 非对象的 filter, 错误的日期) 才返回错误

use chrono::NaiveDate;
use serde_json::Value as Json;

use crate::ast::{Entry, Filter, Op, Operand, Operation, Predicate};
use crate::operator::{Join, Operator};
use crate::order_by::{OrderBy, OrderByItem};
use crate::query::QueryOptions;
use crate::value::{Guid, Value};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected {expected} at '{path}'")]
    Shape { path: String, expected: &'static str },

    #[error("invalid date '{value}' at '{path}': {source}")]
    Date {
        path: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

pub type Result<T> = std::result::Result<T, DocumentError>;

fn shape(path: &str, expected: &'static str) -> DocumentError {
    DocumentError::Shape {
        path: path.to_string(),
        expected,
    }
}

/// 从 JSON 文本解析查询选项
pub fn parse_options_str(input: &str) -> Result<QueryOptions> {
    let json: Json = serde_json::from_str(input)?;
    parse_options(&json)
}

/// 从 JSON 文本解析过滤条件
pub fn parse_filter_str(input: &str) -> Result<Filter> {
    let json: Json = serde_json::from_str(input)?;
    parse_filter(&json, "filter")
}

pub fn parse_options(json: &Json) -> Result<QueryOptions> {
    let object = json.as_object().ok_or_else(|| shape("$", "an object"))?;
    let mut options = QueryOptions::new();

    for (key, value) in object {
        if value.is_null() {
            continue;
        }
        match key.as_str() {
            "select" => options.select = parse_string_list(value, "select")?,
            "expand" => options.expand = parse_string_list(value, "expand")?,
            "filter" => options.filter = Some(parse_filter(value, "filter")?),
            "top" => options.top = Some(parse_count(value, "top")?),
            "skip" => options.skip = Some(parse_count(value, "skip")?),
            "orderBy" | "orderby" => options.order_by = Some(parse_order_by(value)?),
            "count" => options.count = value.as_bool().ok_or_else(|| shape("count", "a boolean"))?,
            other => tracing::debug!(key = other, "ignoring unknown option"),
        }
    }

    Ok(options)
}

/// 解析字段到条目的映射, 字段顺序与文档中一致
pub fn parse_filter(json: &Json, path: &str) -> Result<Filter> {
    let object = json.as_object().ok_or_else(|| shape(path, "an object"))?;
    let mut filter = Filter::new();

    for (field, value) in object {
        let field_path = format!("{}.{}", path, field);
        match parse_entry(value, &field_path)? {
            Some(entry) => {
                filter.insert(field.as_str(), entry);
            }
            None => tracing::debug!(path = %field_path, "entry dropped"),
        }
    }

    Ok(filter)
}

fn parse_entry(json: &Json, path: &str) -> Result<Option<Entry>> {
    match json {
        Json::Array(items) => match items.first() {
            // 操作列表: [["ge", 20], ["le", 60]]
            Some(Json::Array(_)) => {
                let mut operations = Vec::new();
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, i);
                    match item {
                        Json::Array(parts) => {
                            if let Some(op) = parse_operation(parts, &item_path)? {
                                operations.push(op);
                            }
                        }
                        _ => tracing::debug!(path = %item_path, "operation is not an array"),
                    }
                }
                Ok(Some(Entry::Operations(operations)))
            }
            // 单个操作: ["ge", 20]
            Some(Json::String(_)) => Ok(parse_operation(items, path)?.map(Entry::Operation)),
            _ => Ok(None),
        },
        other => Ok(parse_scalar(other, path)?.map(Entry::Value)),
    }
}

/// 解析 `[operator, operand, join?]`
fn parse_operation(parts: &[Json], path: &str) -> Result<Option<Operation>> {
    let Some(keyword) = parts.first().and_then(Json::as_str) else {
        return Ok(None);
    };
    let Some(operator) = Operator::from_keyword(keyword) else {
        tracing::debug!(path, operator = keyword, "unknown operator");
        return Ok(None);
    };
    let Some(operand) = parts.get(1) else {
        return Ok(None);
    };

    let join = match parts.get(2).and_then(Json::as_str) {
        Some(s) => Join::from_keyword(s).unwrap_or_else(|| {
            tracing::debug!(path, join = s, "unknown join operator, using 'and'");
            Join::And
        }),
        None => Join::And,
    };

    let op = match operator {
        Operator::Compare(op) => {
            parse_operand(operand, path)?.map(|operand| Op::Compare { op, operand })
        }
        Operator::Function(func) => {
            parse_operand(operand, path)?.map(|operand| Op::Function { func, operand })
        }
        Operator::In => parse_scalar_list(operand, path)?.map(Op::In),
        Operator::Between(kind) => {
            parse_bounds(operand, path)?.map(|bounds| Op::Between { kind, bounds })
        }
        Operator::Lambda(kind) => {
            let predicate = match operand {
                Json::Array(inner) => parse_operation(inner, path)?.map(Predicate::from),
                Json::Object(_) => Some(Predicate::Filter(parse_filter(operand, path)?)),
                _ => None,
            };
            predicate.map(|predicate| Op::Lambda { kind, predicate })
        }
        Operator::Group => match operand {
            Json::Object(_) => Some(Op::Group(parse_filter(operand, path)?)),
            _ => None,
        },
        Operator::Raw => operand.as_str().map(|s| Op::Raw(s.to_string())),
    };

    Ok(op.map(|op| Operation { op, join }))
}

fn parse_operand(json: &Json, path: &str) -> Result<Option<Operand>> {
    match json {
        Json::Array(_) => Ok(parse_scalar_list(json, path)?.map(Operand::List)),
        other => Ok(parse_scalar(other, path)?.map(Operand::Scalar)),
    }
}

/// 非标量元素会被跳过
fn parse_scalar_list(json: &Json, path: &str) -> Result<Option<Vec<Value>>> {
    let Json::Array(items) = json else {
        return Ok(None);
    };
    let mut values = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if let Some(value) = parse_scalar(item, &format!("{}[{}]", path, i))? {
            values.push(value);
        }
    }
    Ok(Some(values))
}

/// 区间边界保留原始长度, 非标量元素记为 `Undefined`, 交给编译器检查个数
fn parse_bounds(json: &Json, path: &str) -> Result<Option<Vec<Value>>> {
    let Json::Array(items) = json else {
        return Ok(None);
    };
    let mut bounds = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let value = parse_scalar(item, &format!("{}[{}]", path, i))?;
        bounds.push(value.unwrap_or(Value::Undefined));
    }
    Ok(Some(bounds))
}

fn parse_count(json: &Json, path: &str) -> Result<u64> {
    json.as_u64()
        .ok_or_else(|| shape(path, "a non-negative integer"))
}

fn parse_scalar(json: &Json, path: &str) -> Result<Option<Value>> {
    let value = match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Undefined),
        },
        Json::String(s) => Value::String(s.clone()),
        Json::Object(object) => {
            if let Some(date) = object.get("$date") {
                let text = date.as_str().ok_or_else(|| shape(path, "a date string"))?;
                let parsed = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|source| {
                    DocumentError::Date {
                        path: path.to_string(),
                        value: text.to_string(),
                        source,
                    }
                })?;
                Value::Date(parsed)
            } else if let Some(guid) = object.get("$guid") {
                let text = guid.as_str().ok_or_else(|| shape(path, "a guid string"))?;
                Value::Guid(Guid::new(text))
            } else {
                return Ok(None);
            }
        }
        Json::Array(_) => return Ok(None),
    };
    Ok(Some(value))
}

fn parse_string_list(json: &Json, path: &str) -> Result<Vec<String>> {
    match json {
        Json::String(s) => Ok(vec![s.clone()]),
        Json::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| shape(path, "an array of strings"))
            })
            .collect(),
        _ => Err(shape(path, "an array of strings")),
    }
}

/// `["name", "asc"]`, `[["a", "b"], "desc"]`, 或由它们组成的数组
pub fn parse_order_by(json: &Json) -> Result<OrderBy> {
    let items = json
        .as_array()
        .ok_or_else(|| shape("orderBy", "an array"))?;

    let single = matches!(
        (items.first(), items.get(1)),
        (Some(Json::String(_)), _) | (Some(Json::Array(_)), Some(Json::String(_)))
    );
    if single {
        return Ok(OrderBy(vec![parse_order_by_item(items, "orderBy")?]));
    }

    let mut order_by = OrderBy::new();
    for (i, item) in items.iter().enumerate() {
        let item_path = format!("orderBy[{}]", i);
        let pair = item
            .as_array()
            .ok_or_else(|| shape(&item_path, "a [path, direction] pair"))?;
        order_by.0.push(parse_order_by_item(pair, &item_path)?);
    }
    Ok(order_by)
}

fn parse_order_by_item(pair: &[Json], path: &str) -> Result<OrderByItem> {
    let [field, direction] = pair else {
        return Err(shape(path, "a [path, direction] pair"));
    };
    let direction = direction
        .as_str()
        .ok_or_else(|| shape(path, "a direction string"))?;
    let segments = match field {
        Json::String(s) => vec![s.clone()],
        Json::Array(_) => parse_string_list(field, path)?,
        _ => return Err(shape(path, "a path string or segment array")),
    };
    Ok(OrderByItem::nested(segments, direction))
}
