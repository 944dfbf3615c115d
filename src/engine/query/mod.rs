//! Structured Query Module
//!
//! JSON query documents, their validation, and the SQL they render to

pub mod error;
pub mod parser;
pub mod spec;

pub use error::ValidationError;
pub use parser::translate_structured_query;
pub use spec::{Bound, JoinClause, JoinKind, QuerySpec};
