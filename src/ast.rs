use std::borrow::Cow;

use chrono::NaiveDate;
use indexmap::IndexMap;

use crate::operator::{ComparisonOp, Family, Join, LambdaKind, Operator, RangeKind, StringFunction};
use crate::value::{Guid, Value};

/// 过滤条件的根节点: 字段路径到过滤条目的有序映射
///
/// 插入顺序决定输出中子句从左到右的顺序, 重复插入同名字段会原地覆盖
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    entries: IndexMap<String, Entry>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式添加一个字段, 例如 `Filter::new().field("name", "John")`
    pub fn field(mut self, path: impl Into<String>, entry: impl Into<Entry>) -> Self {
        self.insert(path, entry);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, entry: impl Into<Entry>) -> Option<Entry> {
        self.entries.insert(path.into(), entry.into())
    }

    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 为每个字段路径加上前缀, 用于 lambda 内部的对象谓词 (`x/age`)
    pub fn prefixed(&self, prefix: &str) -> Filter {
        let entries = self
            .entries
            .iter()
            .map(|(k, v)| (format!("{}/{}", prefix, k), v.clone()))
            .collect();
        Filter { entries }
    }
}

impl<K: Into<String>, E: Into<Entry>> FromIterator<(K, E)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, E)>>(iter: I) -> Self {
        let mut filter = Filter::new();
        for (k, e) in iter {
            filter.insert(k, e);
        }
        filter
    }
}

/// 单个字段上的过滤条目
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// 裸值, 等价于 `eq`
    Value(Value),
    Operation(Operation),
    /// 作用于同一字段的多个操作, 按顺序连接
    Operations(Vec<Operation>),
}

impl Entry {
    /// 统一展开为操作列表
    pub fn operations(&self) -> Cow<'_, [Operation]> {
        match self {
            Entry::Value(v) => Cow::Owned(vec![Operation::eq(v.clone())]),
            Entry::Operation(op) => Cow::Borrowed(std::slice::from_ref(op)),
            Entry::Operations(ops) => Cow::Borrowed(ops.as_slice()),
        }
    }
}

/// 一个过滤操作及其之后使用的连接符
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub op: Op,
    /// 本子句与下一个子句之间的连接符, 默认 `and`
    pub join: Join,
}

/// 按运算符族划分的操作
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Compare { op: ComparisonOp, operand: Operand },
    Function { func: StringFunction, operand: Operand },
    In(Vec<Value>),
    /// 区间, 正常情况下恰好两个边界值
    Between { kind: RangeKind, bounds: Vec<Value> },
    Lambda { kind: LambdaKind, predicate: Predicate },
    /// 嵌套分组, 额外加一层括号
    Group(Filter),
    /// 原样拼接在字段名之后的片段
    Raw(String),
}

impl Op {
    pub fn operator(&self) -> Operator {
        match self {
            Op::Compare { op, .. } => Operator::Compare(*op),
            Op::Function { func, .. } => Operator::Function(*func),
            Op::In(_) => Operator::In,
            Op::Between { kind, .. } => Operator::Between(*kind),
            Op::Lambda { kind, .. } => Operator::Lambda(*kind),
            Op::Group(_) => Operator::Group,
            Op::Raw(_) => Operator::Raw,
        }
    }

    pub fn family(&self) -> Family {
        self.operator().family()
    }
}

/// 比较与字符串函数的操作数: 单值或值列表
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(Value),
    /// 每个值各生成一个子句, 用 `or` 连接
    List(Vec<Value>),
}

/// lambda (`any`/`all`) 的内部谓词
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// 直接作用于 lambda 变量本身
    Operation(Box<Operation>),
    /// 作用于 lambda 变量的属性, 字段名会加上 `x/` 前缀
    Filter(Filter),
}

impl Operation {
    pub fn new(op: Op) -> Self {
        Self { op, join: Join::And }
    }

    pub fn compare(op: ComparisonOp, operand: impl Into<Operand>) -> Self {
        Self::new(Op::Compare { op, operand: operand.into() })
    }

    pub fn eq(operand: impl Into<Operand>) -> Self {
        Self::compare(ComparisonOp::Eq, operand)
    }

    pub fn ne(operand: impl Into<Operand>) -> Self {
        Self::compare(ComparisonOp::Ne, operand)
    }

    pub fn gt(operand: impl Into<Operand>) -> Self {
        Self::compare(ComparisonOp::Gt, operand)
    }

    pub fn ge(operand: impl Into<Operand>) -> Self {
        Self::compare(ComparisonOp::Ge, operand)
    }

    pub fn lt(operand: impl Into<Operand>) -> Self {
        Self::compare(ComparisonOp::Lt, operand)
    }

    pub fn le(operand: impl Into<Operand>) -> Self {
        Self::compare(ComparisonOp::Le, operand)
    }

    pub fn function(func: StringFunction, operand: impl Into<Operand>) -> Self {
        Self::new(Op::Function { func, operand: operand.into() })
    }

    pub fn contains(operand: impl Into<Operand>) -> Self {
        Self::function(StringFunction::Contains, operand)
    }

    pub fn starts_with(operand: impl Into<Operand>) -> Self {
        Self::function(StringFunction::StartsWith, operand)
    }

    pub fn ends_with(operand: impl Into<Operand>) -> Self {
        Self::function(StringFunction::EndsWith, operand)
    }

    pub fn is_in<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::new(Op::In(values.into_iter().map(Into::into).collect()))
    }

    pub fn range(kind: RangeKind, bounds: Vec<Value>) -> Self {
        Self::new(Op::Between { kind, bounds })
    }

    pub fn between(lo: impl Into<Value>, hi: impl Into<Value>) -> Self {
        Self::range(RangeKind::Inclusive, vec![lo.into(), hi.into()])
    }

    pub fn between_exclusive(lo: impl Into<Value>, hi: impl Into<Value>) -> Self {
        Self::range(RangeKind::Exclusive, vec![lo.into(), hi.into()])
    }

    pub fn any(predicate: impl Into<Predicate>) -> Self {
        Self::new(Op::Lambda {
            kind: LambdaKind::Any,
            predicate: predicate.into(),
        })
    }

    pub fn all(predicate: impl Into<Predicate>) -> Self {
        Self::new(Op::Lambda {
            kind: LambdaKind::All,
            predicate: predicate.into(),
        })
    }

    pub fn group(filter: Filter) -> Self {
        Self::new(Op::Group(filter))
    }

    pub fn raw(fragment: impl Into<String>) -> Self {
        Self::new(Op::Raw(fragment.into()))
    }

    pub fn with_join(mut self, join: Join) -> Self {
        self.join = join;
        self
    }

    /// 与下一个子句之间使用 `or`
    pub fn or(self) -> Self {
        self.with_join(Join::Or)
    }
}

macro_rules! impl_scalar_conversions {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Operand {
                fn from(v: $t) -> Self {
                    Operand::Scalar(v.into())
                }
            }

            impl From<$t> for Entry {
                fn from(v: $t) -> Self {
                    Entry::Value(v.into())
                }
            }
        )*
    };
}

impl_scalar_conversions!(i32, i64, u32, f64, bool, &str, String, NaiveDate, Guid, Value);

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(values: Vec<T>) -> Self {
        Operand::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Operand::Scalar(v.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Entry {
    fn from(v: Option<T>) -> Self {
        Entry::Value(v.into())
    }
}

impl From<Operation> for Entry {
    fn from(op: Operation) -> Self {
        Entry::Operation(op)
    }
}

impl From<Vec<Operation>> for Entry {
    fn from(ops: Vec<Operation>) -> Self {
        Entry::Operations(ops)
    }
}

impl From<Operation> for Predicate {
    fn from(op: Operation) -> Self {
        Predicate::Operation(Box::new(op))
    }
}

impl From<Filter> for Predicate {
    fn from(filter: Filter) -> Self {
        Predicate::Filter(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_and_overwrite() {
        let mut filter = Filter::new().field("b", 1).field("a", 2).field("c", 3);
        let previous = filter.insert("a", 20);

        assert_eq!(previous, Some(Entry::Value(Value::Int(2))));
        let keys: Vec<_> = filter.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(filter.get("a"), Some(&Entry::Value(Value::Int(20))));
    }

    #[test]
    fn test_bare_value_expands_to_eq() {
        let entry = Entry::from("John");
        let ops = entry.operations();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0], Operation::eq("John"));
        assert_eq!(ops[0].join, Join::And);
    }

    #[test]
    fn test_operand_shapes() {
        assert_eq!(Operand::from(20), Operand::Scalar(Value::Int(20)));
        assert_eq!(
            Operand::from(vec![1, 2]),
            Operand::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(Operand::from(Option::<&str>::None), Operand::Scalar(Value::Undefined));
    }

    #[test]
    fn test_operator_of_each_family() {
        assert_eq!(Operation::ge(1).op.family(), Family::Comparison);
        assert_eq!(Operation::contains("a").op.family(), Family::StringFunction);
        assert_eq!(Operation::is_in([1, 2]).op.family(), Family::Set);
        assert_eq!(Operation::between(1, 2).op.family(), Family::Range);
        assert_eq!(Operation::any(Operation::eq(1)).op.family(), Family::Lambda);
        assert_eq!(Operation::group(Filter::new()).op.family(), Family::Group);
        assert_eq!(Operation::raw(" in (1)").op.family(), Family::Raw);
    }

    #[test]
    fn test_join_setters() {
        assert_eq!(Operation::eq(1).or().join, Join::Or);
        assert_eq!(Operation::eq(1).or().with_join(Join::And).join, Join::And);
    }

    #[test]
    fn test_prefixed_keys() {
        let filter = Filter::new().field("age", Operation::ge(20)).field("name", "John");
        let prefixed = filter.prefixed("x");
        let keys: Vec<_> = prefixed.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["x/age", "x/name"]);
    }
}
