//! `$orderby` rendering.

use std::fmt;

/// Sort direction. Anything other than `asc`/`desc` is passed through as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
    Other(String),
}

impl Direction {
    pub fn as_str(&self) -> &str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
            Direction::Other(s) => s,
        }
    }
}

impl From<&str> for Direction {
    fn from(s: &str) -> Self {
        match s {
            "asc" => Direction::Asc,
            "desc" => Direction::Desc,
            other => Direction::Other(other.to_string()),
        }
    }
}

impl From<String> for Direction {
    fn from(s: String) -> Self {
        Direction::from(s.as_str())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `path direction` pair. `path` holds the property segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByItem {
    pub path: Vec<String>,
    pub direction: Direction,
}

impl OrderByItem {
    pub fn new(path: impl Into<String>, direction: impl Into<Direction>) -> Self {
        Self {
            path: vec![path.into()],
            direction: direction.into(),
        }
    }

    pub fn nested<I, S>(segments: I, direction: impl Into<Direction>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: segments.into_iter().map(Into::into).collect(),
            direction: direction.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("{} {}", self.path.join("/"), self.direction)
    }
}

impl From<(&str, &str)> for OrderByItem {
    fn from((path, direction): (&str, &str)) -> Self {
        OrderByItem::new(path, direction)
    }
}

impl<const N: usize> From<([&str; N], &str)> for OrderByItem {
    fn from((segments, direction): ([&str; N], &str)) -> Self {
        OrderByItem::nested(segments, direction)
    }
}

/// Ordered list of sort clauses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderBy(pub Vec<OrderByItem>);

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, item: impl Into<OrderByItem>) -> Self {
        self.0.push(item.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<OrderByItem> for OrderBy {
    fn from(item: OrderByItem) -> Self {
        OrderBy(vec![item])
    }
}

impl From<(&str, &str)> for OrderBy {
    fn from(pair: (&str, &str)) -> Self {
        OrderBy(vec![pair.into()])
    }
}

impl<const N: usize> From<([&str; N], &str)> for OrderBy {
    fn from(pair: ([&str; N], &str)) -> Self {
        OrderBy(vec![pair.into()])
    }
}

impl From<Vec<OrderByItem>> for OrderBy {
    fn from(items: Vec<OrderByItem>) -> Self {
        OrderBy(items)
    }
}

impl<T: Into<OrderByItem>> FromIterator<T> for OrderBy {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        OrderBy(iter.into_iter().map(Into::into).collect())
    }
}

/// Comma-joins every pair in input order. No deduplication.
pub fn render_order_by(order_by: &OrderBy) -> String {
    order_by
        .0
        .iter()
        .map(OrderByItem::render)
        .collect::<Vec<_>>()
        .join(",")
}
