//! Wide-column store error types

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WideColumnError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store not found: {0}")]
    StoreNotFound(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Format version {found} not supported (min: {min}, max: {max})")]
    UnsupportedFormatVersion {
        found: u32,
        min: u32,
        max: u32,
    },
}

pub type Result<T> = std::result::Result<T, WideColumnError>;
