//! Scalar values and their OData literal form.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone};

/// An identifier rendered without quotes, e.g. a GUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Guid(pub String);

impl Guid {
    pub fn new(inner: impl Into<String>) -> Self {
        Self(inner.into())
    }

    pub fn inner(&self) -> &str {
        &self.0
    }
}

impl From<uuid::Uuid> for Guid {
    fn from(id: uuid::Uuid) -> Self {
        Guid(id.hyphenated().to_string())
    }
}

/// A scalar operand.
///
/// `Null`, `Undefined` and a NaN `Float` carry no literal; an operation
/// holding one of them is dropped from the output.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Guid(Guid),
    Null,
    Undefined,
}

impl Value {
    /// Builds a date from a 0-indexed month. Impossible dates become `Undefined`.
    pub fn ymd(year: i32, month0: u32, day: u32) -> Self {
        month0
            .checked_add(1)
            .and_then(|month| NaiveDate::from_ymd_opt(year, month, day))
            .map(Value::Date)
            .unwrap_or(Value::Undefined)
    }

    pub fn is_omitted(&self) -> bool {
        match self {
            Value::Null | Value::Undefined => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }
}

/// Renders a value as an OData literal, or `None` when it must be omitted.
pub fn normalize(value: &Value) -> Option<String> {
    if value.is_omitted() {
        return None;
    }
    let literal = match value {
        Value::String(s) => format!("'{}'", s),
        Value::Int(n) => n.to_string(),
        Value::Float(f) if f.is_infinite() => {
            let literal = if *f > 0.0 { "INF" } else { "-INF" };
            literal.to_string()
        }
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Date(d) => format_date(d),
        Value::Guid(g) => g.inner().to_string(),
        Value::Null | Value::Undefined => return None,
    };
    Some(literal)
}

/// `YYYY-MM-DD`, zero padded.
pub fn format_date(date: &NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Int(n as i64)
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f as f64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::Date(dt.date())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(dt: DateTime<Tz>) -> Self {
        Value::Date(dt.date_naive())
    }
}

impl From<Guid> for Value {
    fn from(g: Guid) -> Self {
        Value::Guid(g)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(id: uuid::Uuid) -> Self {
        Value::Guid(id.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Undefined)
    }
}
