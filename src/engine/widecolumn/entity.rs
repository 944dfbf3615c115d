//! Entity representation for the wide-column store

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PARTITION_KEY: &str = "PartitionKey";
pub const ROW_KEY: &str = "RowKey";
pub const TIMESTAMP: &str = "Timestamp";

/// EDM-typed property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EdmValue {
    #[serde(rename = "Edm.String")]
    String(String),
    #[serde(rename = "Edm.Int32")]
    Int32(i32),
    #[serde(rename = "Edm.Int64")]
    Int64(i64),
    #[serde(rename = "Edm.Double")]
    Double(f64),
    #[serde(rename = "Edm.Boolean")]
    Boolean(bool),
    #[serde(rename = "Edm.DateTime")]
    DateTime(DateTime<Utc>),
    #[serde(rename = "Edm.Binary")]
    Binary(Vec<u8>),
    #[serde(rename = "Edm.Guid")]
    Guid(Uuid),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: EdmValue,
}

/// A stored entity: key pair, timestamp, and an ordered property bag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "PartitionKey")]
    pub partition_key: String,

    #[serde(rename = "RowKey")]
    pub row_key: String,

    /// Last write time, stamped by the store
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "Properties", default)]
    pub properties: Vec<Property>,
}

impl Entity {
    pub fn new(partition_key: &str, row_key: &str) -> Self {
        Self {
            partition_key: partition_key.to_string(),
            row_key: row_key.to_string(),
            timestamp: Utc::now(),
            properties: Vec::new(),
        }
    }

    /// Append a property, or replace the value of an existing one in place
    pub fn with(mut self, name: &str, value: EdmValue) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: EdmValue) {
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.properties.push(Property {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&EdmValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Property lookup that also sees the key and timestamp system fields
    pub fn field(&self, name: &str) -> Option<EdmValue> {
        match name {
            PARTITION_KEY => Some(EdmValue::String(self.partition_key.clone())),
            ROW_KEY => Some(EdmValue::String(self.row_key.clone())),
            TIMESTAMP => Some(EdmValue::DateTime(self.timestamp)),
            _ => self.get(name).cloned(),
        }
    }

    /// Keep only the listed properties, in stored order
    pub fn project(mut self, select: &[String]) -> Self {
        if !select.is_empty() {
            self.properties.retain(|p| select.contains(&p.name));
        }
        self
    }
}

/// ISO-8601 UTC rendering; fractional seconds only when non-zero
pub fn iso8601(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
