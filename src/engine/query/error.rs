//! Structured query validation errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Query document must be a JSON object")]
    NotAnObject,

    #[error("Query document has no From clause")]
    MissingFrom,

    #[error("{clause} must be {expected}")]
    InvalidClause {
        clause: &'static str,
        expected: &'static str,
    },

    #[error("{clause} entry is missing field {field}")]
    MissingJoinField {
        clause: &'static str,
        field: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ValidationError>;
