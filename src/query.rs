//! Query string assembly: `$select`, `$expand`, `$filter`, `$top`, `$skip`, `$orderby`, `$count`.

use crate::ast::Filter;
use crate::filter_compiler::{compile, Diagnostic};
use crate::order_by::{render_order_by, OrderBy};

/// Everything that can go into an OData query string. Empty/`None` parts are left out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryOptions {
    pub select: Vec<String>,
    pub expand: Vec<String>,
    pub filter: Option<Filter>,
    pub top: Option<u64>,
    pub skip: Option<u64>,
    pub order_by: Option<OrderBy>,
    pub count: bool,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn expand<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expand = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn top(mut self, top: u64) -> Self {
        self.top = Some(top);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn order_by(mut self, order_by: impl Into<OrderBy>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn count(mut self, count: bool) -> Self {
        self.count = count;
        self
    }
}

/// Query string together with the diagnostics raised while compiling `$filter`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssembleResult {
    pub query: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Concatenates the present segments in fixed order, `&`-joined.
pub fn assemble(options: &QueryOptions) -> String {
    assemble_with_diagnostics(options).query
}

/// Same as [`assemble`], compiling the filter once and keeping its diagnostics.
pub fn assemble_with_diagnostics(options: &QueryOptions) -> AssembleResult {
    let mut segments: Vec<String> = Vec::new();
    let mut diagnostics = Vec::new();

    if !options.select.is_empty() {
        segments.push(format!("$select={}", options.select.join(",")));
    }
    if !options.expand.is_empty() {
        segments.push(format!("$expand={}", options.expand.join(",")));
    }
    if let Some(filter) = &options.filter {
        let compiled = compile(filter);
        diagnostics = compiled.diagnostics;
        if !compiled.expression.is_empty() {
            segments.push(format!("$filter={}", compiled.expression));
        }
    }
    if let Some(top) = options.top {
        segments.push(format!("$top={}", top));
    }
    if let Some(skip) = options.skip {
        segments.push(format!("$skip={}", skip));
    }
    if let Some(order_by) = &options.order_by {
        if !order_by.is_empty() {
            segments.push(format!("$orderby={}", render_order_by(order_by)));
        }
    }
    if options.count {
        segments.push("$count=true".to_string());
    }

    AssembleResult {
        query: segments.join("&"),
        diagnostics,
    }
}

/// The query string alone, without a leading `?`.
pub fn build_query_string(options: &QueryOptions) -> String {
    assemble(options)
}

/// `base_url?query`, or `base_url` unchanged when no segment is produced.
pub fn build_url(base_url: &str, options: Option<&QueryOptions>) -> String {
    let query = options.map(assemble).unwrap_or_default();
    append_query(base_url, &query)
}

/// Appends `?query` unless the query is empty.
pub fn append_query(base_url: &str, query: &str) -> String {
    if query.is_empty() {
        return base_url.to_string();
    }
    format!("{}?{}", base_url, query)
}
