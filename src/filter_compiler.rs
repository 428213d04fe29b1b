//! Filter compiler that turns a `Filter` into an OData `$filter` expression.

use std::fmt;

use crate::ast::{Filter, Op, Operand, Operation, Predicate};
use crate::operator::{Family, Join, LambdaKind, RangeKind};
use crate::value::{normalize, Value};

/// Variable bound by `any`/`all` lambdas.
pub const LAMBDA_VARIABLE: &str = "x";

/// Non-fatal problem found while compiling. The offending operation is left out.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    RangeArity {
        field: String,
        kind: RangeKind,
        given: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::RangeArity { field, kind, given } => write!(
                f,
                "{:?} range on '{}' requires exactly 2 values, {} given",
                kind, field, given
            ),
        }
    }
}

/// Result of filter compilation with any diagnostics raised on the way
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompileResult {
    /// Empty when nothing survived; callers then omit `$filter` entirely.
    pub expression: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// A rendered clause and the connective that follows it.
#[derive(Debug)]
struct Clause {
    text: String,
    join: Join,
}

#[derive(Debug, Default)]
struct FilterCompiler {
    diagnostics: Vec<Diagnostic>,
}

/// Compile a filter mapping, keeping diagnostics.
pub fn compile(filter: &Filter) -> CompileResult {
    let mut compiler = FilterCompiler::default();
    let expression = compiler.compile_filter(filter);
    CompileResult {
        expression,
        diagnostics: compiler.diagnostics,
    }
}

/// Compile a filter mapping into its expression string.
pub fn compile_filter(filter: &Filter) -> String {
    compile(filter).expression
}

impl FilterCompiler {
    /// Render every field in insertion order and join the surviving clauses
    fn compile_filter(&mut self, filter: &Filter) -> String {
        let mut clauses = Vec::new();

        for (field, entry) in filter.iter() {
            for operation in entry.operations().iter() {
                match self.compile_operation(field, operation) {
                    Some(clause) => clauses.push(clause),
                    None => tracing::debug!(
                        field,
                        operator = ?operation.op.operator(),
                        "operation dropped"
                    ),
                }
            }
        }

        join_clauses(&clauses)
    }

    /// Compile one operation together with the join that follows it
    fn compile_operation(&mut self, field: &str, operation: &Operation) -> Option<Clause> {
        let text = self.compile_op(field, &operation.op)?;
        // lambda groups never hand `or` to their neighbours
        let join = match operation.op.family() {
            Family::Lambda => Join::And,
            _ => operation.join,
        };
        Some(Clause { text, join })
    }

    fn compile_op(&mut self, field: &str, op: &Op) -> Option<String> {
        match op {
            Op::Compare { op, operand } => compile_operand(operand, |value| {
                format!("({} {} {})", field, op.as_str(), value)
            }),
            Op::Function { func, operand } => compile_operand(operand, |value| {
                format!("{}({}, {})", func.as_str(), field, value)
            }),
            Op::In(values) => {
                let items: Vec<String> = values.iter().filter_map(normalize).collect();
                if items.is_empty() {
                    return None;
                }
                Some(format!("({} in ({}))", field, items.join(",")))
            }
            Op::Between { kind, bounds } => self.compile_range(field, *kind, bounds),
            Op::Lambda { kind, predicate } => self.compile_lambda(field, *kind, predicate),
            Op::Group(inner) => {
                let inner = self.compile_filter(inner);
                if inner.is_empty() {
                    return None;
                }
                Some(format!("({})", inner))
            }
            Op::Raw(fragment) => Some(format!("({}{})", field, fragment)),
        }
    }

    /// `((field ge lo) and (field le hi))` or the exclusive `gt`/`lt` form
    fn compile_range(&mut self, field: &str, kind: RangeKind, bounds: &[Value]) -> Option<String> {
        if bounds.len() != 2 {
            tracing::warn!(
                field,
                given = bounds.len(),
                "range operation requires exactly 2 values"
            );
            self.diagnostics.push(Diagnostic::RangeArity {
                field: field.to_string(),
                kind,
                given: bounds.len(),
            });
            return None;
        }

        let lo = normalize(&bounds[0])?;
        let hi = normalize(&bounds[1])?;
        let (lo_op, hi_op) = kind.bounds();

        Some(format!(
            "(({field} {} {lo}) and ({field} {} {hi}))",
            lo_op.as_str(),
            hi_op.as_str(),
        ))
    }

    /// `(field/any(x: inner))`
    fn compile_lambda(
        &mut self,
        field: &str,
        kind: LambdaKind,
        predicate: &Predicate,
    ) -> Option<String> {
        let inner = match predicate {
            Predicate::Operation(operation) => self.compile_op(LAMBDA_VARIABLE, &operation.op)?,
            Predicate::Filter(filter) => {
                let inner = self.compile_filter(&filter.prefixed(LAMBDA_VARIABLE));
                if inner.is_empty() {
                    return None;
                }
                inner
            }
        };

        Some(format!(
            "({}/{}({}: {}))",
            field,
            kind.as_str(),
            LAMBDA_VARIABLE,
            inner
        ))
    }
}

/// A list operand becomes one clause per value, or-joined and wrapped.
fn compile_operand(operand: &Operand, render: impl Fn(&str) -> String) -> Option<String> {
    match operand {
        Operand::Scalar(value) => normalize(value).map(|v| render(&v)),
        Operand::List(values) => {
            let parts: Vec<String> = values
                .iter()
                .filter_map(normalize)
                .map(|v| render(&v))
                .collect();
            if parts.is_empty() {
                return None;
            }
            Some(format!("({})", parts.join(Join::Or.separator())))
        }
    }
}

/// Each clause is followed by its own join; the last clause's join is dropped.
fn join_clauses(clauses: &[Clause]) -> String {
    let mut out = String::new();
    let mut pending: Option<Join> = None;

    for clause in clauses {
        if let Some(join) = pending {
            out.push_str(join.separator());
        }
        out.push_str(&clause.text);
        pending = Some(clause.join);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Guid;

    const GUID: &str = "64fd1ec3-1d41-ee11-9d4a-86afca43b09d";

    #[test]
    fn test_default_join_is_and() {
        let filter = Filter::new()
            .field("name", "John")
            .field("age", Operation::ge(20));
        assert_eq!(compile_filter(&filter), "(name eq 'John') and (age ge 20)");
    }

    #[test]
    fn test_or_governs_following_separator() {
        let filter = Filter::new()
            .field("city", Operation::eq("New York").or())
            .field("name", "John");
        assert_eq!(compile_filter(&filter), "(city eq 'New York') or (name eq 'John')");
    }

    #[test]
    fn test_all_omitted_yields_empty_string() {
        let filter = Filter::new()
            .field("a", Value::Null)
            .field("b", Value::Undefined)
            .field("c", f64::NAN)
            .field("d", Operation::contains(Value::Undefined).or())
            .field("e", Operation::between(Value::Null, 3));
        let result = compile(&filter);
        assert_eq!(result.expression, "");
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_omitted_fields_are_skipped() {
        let filter = Filter::new()
            .field("name", "John")
            .field("age", Value::Undefined)
            .field("someId", f64::NAN)
            .field("lastName", Operation::contains(Value::Undefined));
        assert_eq!(compile_filter(&filter), "(name eq 'John')");
    }

    #[test]
    fn test_dropped_operation_does_not_leak_its_join() {
        let filter = Filter::new()
            .field("a", Operation::eq(1).or())
            .field("b", Operation::contains(Value::Undefined))
            .field("c", 2);
        assert_eq!(compile_filter(&filter), "(a eq 1) or (c eq 2)");

        let filter = Filter::new()
            .field("a", Operation::eq(1))
            .field("b", Operation::eq(Value::Null).or())
            .field("c", 2);
        assert_eq!(compile_filter(&filter), "(a eq 1) and (c eq 2)");
    }

    #[test]
    fn test_trailing_dropped_operation_strips_last_rendered_join() {
        // the `or` of the last surviving clause is what gets stripped
        let filter = Filter::new().field(
            "a",
            vec![
                Operation::eq(1),
                Operation::eq(2).or(),
                Operation::eq(Value::Undefined),
            ],
        );
        assert_eq!(compile_filter(&filter), "(a eq 1) and (a eq 2)");
    }

    #[test]
    fn test_operation_list_on_one_field() {
        let filter = Filter::new().field(
            "anotherProp",
            vec![Operation::ge(50), Operation::le(100)],
        );
        assert_eq!(
            compile_filter(&filter),
            "(anotherProp ge 50) and (anotherProp le 100)"
        );
    }

    #[test]
    fn test_comparison_over_list_is_or_joined() {
        let filter = Filter::new()
            .field("someProp", Operation::ge(vec![20, 30, 40]))
            .field("x", 1);
        assert_eq!(
            compile_filter(&filter),
            "((someProp ge 20) or (someProp ge 30) or (someProp ge 40)) and (x eq 1)"
        );
    }

    #[test]
    fn test_list_skips_omitted_values() {
        let filter = Filter::new().field(
            "tag",
            Operation::contains(vec![Value::from("a"), Value::Null, Value::from("b")]),
        );
        assert_eq!(
            compile_filter(&filter),
            "(contains(tag, 'a') or contains(tag, 'b'))"
        );

        let filter = Filter::new().field("tag", Operation::eq(vec![Value::Null]));
        assert_eq!(compile_filter(&filter), "");
    }

    #[test]
    fn test_in_operator() {
        let filter = Filter::new()
            .field("age", Operation::is_in([10, 20, 30]))
            .field("height", Operation::le(180));
        assert_eq!(
            compile_filter(&filter),
            "(age in (10,20,30)) and (height le 180)"
        );

        let filter = Filter::new().field("name", Operation::is_in(["a", "b"]));
        assert_eq!(compile_filter(&filter), "(name in ('a','b'))");
    }

    #[test]
    fn test_in_with_nothing_left_is_dropped() {
        let filter = Filter::new()
            .field("age", Operation::is_in(Vec::<Value>::new()))
            .field("id", Operation::is_in([Value::Null]))
            .field("name", "John");
        assert_eq!(compile_filter(&filter), "(name eq 'John')");
    }

    #[test]
    fn test_string_functions() {
        let filter = Filter::new()
            .field("name", Operation::starts_with("joh"))
            .field("email", Operation::ends_with("gmail.com"))
            .field("address", Operation::contains("NYC"))
            .field("height", Operation::le(180));
        assert_eq!(
            compile_filter(&filter),
            "startswith(name, 'joh') and endswith(email, 'gmail.com') and contains(address, 'NYC') and (height le 180)"
        );
    }

    #[test]
    fn test_between_inclusive() {
        let filter = Filter::new().field("age", Operation::between(20, 30));
        assert_eq!(compile_filter(&filter), "((age ge 20) and (age le 30))");
    }

    #[test]
    fn test_between_exclusive_with_dates() {
        let filter = Filter::new()
            .field("age", Operation::between_exclusive(20, 30))
            .field("height", Operation::le(180))
            .field(
                "aDate",
                Operation::between_exclusive(Value::ymd(2023, 4, 1), Value::ymd(2023, 5, 1)),
            );
        assert_eq!(
            compile_filter(&filter),
            "((age gt 20) and (age lt 30)) and (height le 180) and ((aDate gt 2023-05-01) and (aDate lt 2023-06-01))"
        );
    }

    #[test]
    fn test_range_arity_reports_diagnostic() {
        let filter = Filter::new()
            .field("age", Operation::range(RangeKind::Inclusive, vec![Value::Int(1)]))
            .field("name", "John");
        let result = compile(&filter);

        assert_eq!(result.expression, "(name eq 'John')");
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::RangeArity {
                field: "age".to_string(),
                kind: RangeKind::Inclusive,
                given: 1,
            }]
        );
        assert!(result.diagnostics[0].to_string().contains("exactly 2 values, 1 given"));
    }

    #[test]
    fn test_raw_fragments() {
        let filter = Filter::new()
            .field("name", "Store")
            .field("users", Operation::raw("/any(w: w/age ge 20)"))
            .field("employeeId", Operation::raw(" in (1, 2, null)"));
        assert_eq!(
            compile_filter(&filter),
            "(name eq 'Store') and (users/any(w: w/age ge 20)) and (employeeId in (1, 2, null))"
        );
    }

    #[test]
    fn test_nested_group() {
        let inner = Filter::new()
            .field("a", Operation::eq("x").or())
            .field("b", Operation::is_in([1, 2]));
        let filter = Filter::new().field("g", Operation::group(inner));
        assert_eq!(compile_filter(&filter), "((a eq 'x') or (b in (1,2)))");
    }

    #[test]
    fn test_multiple_nested_groups() {
        let first = Filter::new()
            .field("name", Operation::eq("John").or())
            .field("age", Operation::ge(20).or())
            .field("houseId", Operation::is_in([10, 20, 30]));
        let second = Filter::new()
            .field(
                "birthDate",
                vec![Operation::between(Value::ymd(2023, 4, 1), Value::ymd(2023, 5, 1)).or()],
            )
            .field("address", Operation::contains("NYC"));
        let filter = Filter::new()
            .field("height", Operation::le(180))
            .field("_0", Operation::group(first))
            .field("email", Operation::contains("gmail.com"))
            .field("_1", Operation::group(second));

        assert_eq!(
            compile_filter(&filter),
            "(height le 180) and ((name eq 'John') or (age ge 20) or (houseId in (10,20,30))) and contains(email, 'gmail.com') and (((birthDate ge 2023-05-01) and (birthDate le 2023-06-01)) or contains(address, 'NYC'))"
        );
    }

    #[test]
    fn test_empty_group_is_dropped() {
        let filter = Filter::new()
            .field("_0", Operation::group(Filter::new().field("a", Value::Null)).or())
            .field("name", "John");
        assert_eq!(compile_filter(&filter), "(name eq 'John')");
    }

    #[test]
    fn test_group_honours_its_join() {
        let filter = Filter::new()
            .field("_0", Operation::group(Filter::new().field("a", 1)).or())
            .field("b", 2);
        assert_eq!(compile_filter(&filter), "((a eq 1)) or (b eq 2)");
    }

    #[test]
    fn test_lambda_over_scalar() {
        let filter = Filter::new().field("emails", Operation::any(Operation::contains("gmail")));
        assert_eq!(compile_filter(&filter), "(emails/any(x: contains(x, 'gmail')))");

        let filter = Filter::new().field("userNames", Operation::all(Operation::ge(30)));
        assert_eq!(compile_filter(&filter), "(userNames/all(x: (x ge 30)))");
    }

    #[test]
    fn test_lambda_over_object() {
        let inner = Filter::new().field("age", Operation::ge(20)).field("name", "John");
        let filter = Filter::new().field("users", Operation::all(inner));
        assert_eq!(
            compile_filter(&filter),
            "(users/all(x: (x/age ge 20) and (x/name eq 'John')))"
        );
    }

    #[test]
    fn test_lambda_any_mixed() {
        let filter = Filter::new()
            .field("height", Operation::le(180))
            .field("emails", Operation::any(Operation::contains("gmail")))
            .field(
                "users",
                Operation::any(Filter::new().field("age", Operation::ge(20)).field("name", "John")),
            )
            .field("userNames", Operation::any(Operation::ge(30)))
            .field("employees", Operation::any(Filter::new().field("companyId", 20)));
        assert_eq!(
            compile_filter(&filter),
            "(height le 180) and (emails/any(x: contains(x, 'gmail'))) and (users/any(x: (x/age ge 20) and (x/name eq 'John'))) and (userNames/any(x: (x ge 30))) and (employees/any(x: (x/companyId eq 20)))"
        );
    }

    #[test]
    fn test_lambda_ignores_or_join() {
        let filter = Filter::new()
            .field("emails", Operation::any(Operation::contains("gmail")).or())
            .field("name", "John");
        assert_eq!(
            compile_filter(&filter),
            "(emails/any(x: contains(x, 'gmail'))) and (name eq 'John')"
        );
    }

    #[test]
    fn test_lambda_with_omitted_predicate_is_dropped() {
        let filter = Filter::new()
            .field("emails", Operation::any(Operation::contains(Value::Undefined)))
            .field("users", Operation::all(Filter::new().field("age", Value::Null)))
            .field("name", "John");
        assert_eq!(compile_filter(&filter), "(name eq 'John')");
    }

    #[test]
    fn test_large_filter() {
        let filter = Filter::new()
            .field("name", "John")
            .field("city", Operation::eq("New York").or())
            .field("age", Value::Undefined)
            .field("someProp", Operation::ge(vec![20, 30, 40]))
            .field("anotherProp", vec![Operation::ge(50), Operation::le(100)])
            .field("guidProp", Operation::gt(Guid::new(GUID)))
            .field("yetAnotherProp/its/nested", Value::ymd(2023, 4, 1))
            .field("lastName", Operation::contains(Value::Undefined));

        assert_eq!(
            compile_filter(&filter),
            format!(
                "(name eq 'John') and (city eq 'New York') or ((someProp ge 20) or (someProp ge 30) or (someProp ge 40)) and (anotherProp ge 50) and (anotherProp le 100) and (guidProp gt {}) and (yetAnotherProp/its/nested eq 2023-05-01)",
                GUID
            )
        );
    }
}
