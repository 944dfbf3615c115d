//! Relational Adapter Layer
//!
//! Trait-based abstraction over the relational table store. The broker only
//! needs to run translated queries and get typed rows back; SQLite is the
//! shipped backend.

pub mod sqlite;

pub use sqlite::SqliteAdapter;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::filter::FilterExpression;
use crate::engine::query::QuerySpec;

/// Universal result type for adapter operations
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Relational backend contract. All operations return rows in backend order.
pub trait RelationalBackend: Send + Sync {
    /// Get all user table names
    fn list_tables(&self) -> AdapterResult<Vec<String>>;

    /// Run a structured query
    fn query(&self, spec: &QuerySpec) -> AdapterResult<Vec<RelationalRow>>;

    /// Rows of one table matching an ad-hoc filter, optionally projected
    fn filter_rows(
        &self,
        table: &str,
        select: &[String],
        filter: &FilterExpression,
    ) -> AdapterResult<Vec<RelationalRow>>;

    /// Rows whose key columns match; both keys empty yields nothing
    fn lookup(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> AdapterResult<Vec<RelationalRow>>;

    /// Run an administrative command
    fn administer(&self, command: &AdminCommand) -> AdapterResult<Vec<RelationalRow>>;
}

/// Scalar as reported by the relational store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelationalValue {
    Text(String),
    Int32(i32),
    Int64(i64),
    Double(f64),
    /// Any other column type, in its native string form
    Other(String),
}

/// One result row; property order is column order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationalRow {
    pub properties: Vec<(String, RelationalValue)>,
}

impl RelationalRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: RelationalValue) -> Self {
        self.properties.push((name.to_string(), value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&RelationalValue> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// Administrative commands. The first six act on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminCommand {
    Analyze(String),
    Check(String),
    Repair(String),
    Optimize(String),
    ShowIndexes(String),
    ShowKeys(String),
    ShowEngines,
    ShowStatus,
    ShowPlugins,
    ShowOpenTables,
}

impl AdminCommand {
    /// Resolve a command from its URL path segments
    pub fn from_path(command: &str, table: Option<&str>) -> Option<Self> {
        let command = match (command, table) {
            ("analyze", Some(t)) => AdminCommand::Analyze(t.to_string()),
            ("check", Some(t)) => AdminCommand::Check(t.to_string()),
            ("repair", Some(t)) => AdminCommand::Repair(t.to_string()),
            ("optimize", Some(t)) => AdminCommand::Optimize(t.to_string()),
            ("indexes", Some(t)) => AdminCommand::ShowIndexes(t.to_string()),
            ("keys", Some(t)) => AdminCommand::ShowKeys(t.to_string()),
            ("engines", None) => AdminCommand::ShowEngines,
            ("status", None) => AdminCommand::ShowStatus,
            ("plugins", None) => AdminCommand::ShowPlugins,
            ("open-tables", None) => AdminCommand::ShowOpenTables,
            _ => return None,
        };
        Some(command)
    }

    pub fn table(&self) -> Option<&str> {
        match self {
            AdminCommand::Analyze(t)
            | AdminCommand::Check(t)
            | AdminCommand::Repair(t)
            | AdminCommand::Optimize(t)
            | AdminCommand::ShowIndexes(t)
            | AdminCommand::ShowKeys(t) => Some(t),
            _ => None,
        }
    }
}

/// Quote an identifier (table or column name)
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Database adapter errors
#[derive(Debug)]
pub enum AdapterError {
    Connection(String),
    Query(String),
    NotFound(String),
    Internal(String),
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::Connection(e) => write!(f, "Connection error: {}", e),
            AdapterError::Query(e) => write!(f, "Query error: {}", e),
            AdapterError::NotFound(e) => write!(f, "Not found: {}", e),
            AdapterError::Internal(e) => write!(f, "Internal error: {}", e),
        }
    }
}

impl std::error::Error for AdapterError {}
