//! Bolt Wide-column Store
//!
//! A schema-less entity store where each entity is addressed by a
//! partition key + row key pair, carries a write timestamp, and holds an
//! ordered bag of EDM-typed properties. Tables live on disk as directories
//! of JSON entity files under a versioned `_meta.json`.

pub mod entity;
pub mod error;
pub mod meta;
pub mod query;
pub mod storage;
pub mod table;

pub use entity::{EdmValue, Entity, Property};
pub use error::WideColumnError;
pub use storage::TableStore;

use crate::engine::filter::FilterExpression;

/// Wide-column backend contract
pub trait WideColumnBackend: Send + Sync {
    /// Get all table names
    fn list_tables(&self) -> error::Result<Vec<String>>;

    /// Entities of one table matching an ad-hoc filter, optionally projected
    fn filter_entities(
        &self,
        table: &str,
        select: &[String],
        filter: &FilterExpression,
    ) -> error::Result<Vec<Entity>>;

    /// Point read; both keys empty yields nothing
    fn lookup(&self, table: &str, partition_key: &str, row_key: &str) -> error::Result<Vec<Entity>>;
}
