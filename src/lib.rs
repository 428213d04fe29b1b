//! Builds OData v4 query strings from typed filter, ordering and paging options.
//!
//! ```
//! use odata_query_builder::{build_url, Filter, Operation, QueryOptions};
//!
//! let options = QueryOptions::new()
//!     .filter(Filter::new().field("name", "John").field("age", Operation::ge(20)))
//!     .order_by(("name", "asc"));
//!
//! assert_eq!(
//!     build_url("https://example.com", Some(&options)),
//!     "https://example.com?$filter=(name eq 'John') and (age ge 20)&$orderby=name asc"
//! );
//! ```

pub mod ast;
pub mod config;
pub mod document;
pub mod filter_compiler;
pub mod operator;
pub mod order_by;
pub mod query;
pub mod value;

pub use ast::{Entry, Filter, Op, Operand, Operation, Predicate};
pub use filter_compiler::{compile, compile_filter, CompileResult, Diagnostic};
pub use operator::{ComparisonOp, Family, Join, LambdaKind, Operator, RangeKind, StringFunction};
pub use order_by::{render_order_by, Direction, OrderBy, OrderByItem};
pub use query::{
    append_query, assemble, assemble_with_diagnostics, build_query_string, build_url,
    AssembleResult, QueryOptions,
};
pub use value::{normalize, Guid, Value};
