//! Operator names, families and the join connective.

use std::fmt;

/// `(field op value)` comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "eq",
            ComparisonOp::Ne => "ne",
            ComparisonOp::Gt => "gt",
            ComparisonOp::Ge => "ge",
            ComparisonOp::Lt => "lt",
            ComparisonOp::Le => "le",
        }
    }
}

/// `func(field, value)` string functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringFunction {
    Contains,
    StartsWith,
    EndsWith,
}

impl StringFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StringFunction::Contains => "contains",
            StringFunction::StartsWith => "startswith",
            StringFunction::EndsWith => "endswith",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeKind {
    /// `ge lo and le hi`
    Inclusive,
    /// `gt lo and lt hi`
    Exclusive,
}

impl RangeKind {
    /// Lower and upper comparison for this range.
    pub fn bounds(&self) -> (ComparisonOp, ComparisonOp) {
        match self {
            RangeKind::Inclusive => (ComparisonOp::Ge, ComparisonOp::Le),
            RangeKind::Exclusive => (ComparisonOp::Gt, ComparisonOp::Lt),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LambdaKind {
    Any,
    All,
}

impl LambdaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LambdaKind::Any => "any",
            LambdaKind::All => "all",
        }
    }
}

/// Connective placed after a clause, before the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Join {
    #[default]
    And,
    Or,
}

impl Join {
    pub fn as_str(&self) -> &'static str {
        match self {
            Join::And => "and",
            Join::Or => "or",
        }
    }

    /// The keyword padded with spaces, as it appears between clauses.
    pub fn separator(&self) -> &'static str {
        match self {
            Join::And => " and ",
            Join::Or => " or ",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "and" => Some(Join::And),
            "or" => Some(Join::Or),
            _ => None,
        }
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering path an operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Comparison,
    StringFunction,
    Set,
    Range,
    Lambda,
    Group,
    Raw,
}

/// Every operator a filter operation can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Compare(ComparisonOp),
    Function(StringFunction),
    In,
    Between(RangeKind),
    Lambda(LambdaKind),
    Group,
    Raw,
}

impl Operator {
    /// Resolves the textual operator names used in JSON query documents.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let op = match keyword.to_ascii_lowercase().as_str() {
            "eq" => Operator::Compare(ComparisonOp::Eq),
            "ne" => Operator::Compare(ComparisonOp::Ne),
            "gt" => Operator::Compare(ComparisonOp::Gt),
            "ge" => Operator::Compare(ComparisonOp::Ge),
            "lt" => Operator::Compare(ComparisonOp::Lt),
            "le" => Operator::Compare(ComparisonOp::Le),
            "contains" => Operator::Function(StringFunction::Contains),
            "startswith" => Operator::Function(StringFunction::StartsWith),
            "endswith" => Operator::Function(StringFunction::EndsWith),
            "in" => Operator::In,
            "between" | "betweeninclusive" => Operator::Between(RangeKind::Inclusive),
            "betweenexclusive" => Operator::Between(RangeKind::Exclusive),
            "any" => Operator::Lambda(LambdaKind::Any),
            "all" => Operator::Lambda(LambdaKind::All),
            "group" | "nested" => Operator::Group,
            "raw" => Operator::Raw,
            _ => return None,
        };
        Some(op)
    }

    pub fn family(&self) -> Family {
        match self {
            Operator::Compare(_) => Family::Comparison,
            Operator::Function(_) => Family::StringFunction,
            Operator::In => Family::Set,
            Operator::Between(_) => Family::Range,
            Operator::Lambda(_) => Family::Lambda,
            Operator::Group => Family::Group,
            Operator::Raw => Family::Raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_resolve_case_insensitively() {
        assert_eq!(
            Operator::from_keyword("GE"),
            Some(Operator::Compare(ComparisonOp::Ge))
        );
        assert_eq!(
            Operator::from_keyword("startsWith"),
            Some(Operator::Function(StringFunction::StartsWith))
        );
        assert_eq!(
            Operator::from_keyword("betweenExclusive"),
            Some(Operator::Between(RangeKind::Exclusive))
        );
        assert_eq!(Operator::from_keyword("nested"), Some(Operator::Group));
    }

    #[test]
    fn test_unknown_keyword() {
        assert_eq!(Operator::from_keyword("like"), None);
        assert_eq!(Operator::from_keyword(""), None);
        assert_eq!(Join::from_keyword("xor"), None);
    }

    #[test]
    fn test_families() {
        assert_eq!(Operator::In.family(), Family::Set);
        assert_eq!(
            Operator::Lambda(LambdaKind::All).family(),
            Family::Lambda
        );
        assert_eq!(
            Operator::Function(StringFunction::EndsWith).family(),
            Family::StringFunction
        );
    }

    #[test]
    fn test_range_bounds() {
        assert_eq!(
            RangeKind::Inclusive.bounds(),
            (ComparisonOp::Ge, ComparisonOp::Le)
        );
        assert_eq!(
            RangeKind::Exclusive.bounds(),
            (ComparisonOp::Gt, ComparisonOp::Lt)
        );
    }

    #[test]
    fn test_join_separator() {
        assert_eq!(Join::default(), Join::And);
        assert_eq!(Join::Or.separator(), " or ");
        assert_eq!(Join::And.to_string(), "and");
    }
}
