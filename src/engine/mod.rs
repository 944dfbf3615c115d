// Bolt Engine - Core module structure
pub mod adapter;
pub mod api;
pub mod cli;
pub mod condition;
pub mod config;
pub mod filter;
pub mod query;
pub mod serializer;
pub mod widecolumn;

pub use adapter::{RelationalBackend, SqliteAdapter};
pub use config::Config;
pub use filter::translate_ad_hoc_filter;
pub use query::translate_structured_query;
pub use serializer::{serialize_relational_rows, serialize_wide_column_rows};
pub use widecolumn::{TableStore, WideColumnBackend};
