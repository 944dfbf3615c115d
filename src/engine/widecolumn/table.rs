//! Table management for the wide-column store
//!
//! Each table is a directory; each entity one JSON file named after its
//! encoded partition and row key.

use std::fs;
use std::path::{Path, PathBuf};

use super::entity::Entity;
use super::error::{Result, WideColumnError};

pub struct Table {
    pub name: String,
    path: PathBuf,
}

impl Table {
    /// Open an existing table. A name that could never be created is not found.
    pub fn open(base_path: &Path, name: &str) -> Result<Self> {
        let path = base_path.join(name);

        if validate_table_name(name).is_err() || !path.is_dir() {
            return Err(WideColumnError::TableNotFound(name.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            path,
        })
    }

    /// Create a new table
    pub fn create(base_path: &Path, name: &str) -> Result<Self> {
        validate_table_name(name)?;

        let path = base_path.join(name);
        if path.exists() {
            return Err(WideColumnError::TableAlreadyExists(name.to_string()));
        }

        fs::create_dir_all(&path)?;

        Ok(Self {
            name: name.to_string(),
            path,
        })
    }

    fn entity_path(&self, partition_key: &str, row_key: &str) -> PathBuf {
        self.path.join(format!(
            "{}~{}.json",
            encode_key(partition_key),
            encode_key(row_key)
        ))
    }

    /// Insert an entity, replacing any entity with the same keys
    pub fn upsert(&self, entity: &Entity) -> Result<()> {
        let content = serde_json::to_string_pretty(entity)?;
        fs::write(self.entity_path(&entity.partition_key, &entity.row_key), content)?;
        Ok(())
    }

    /// Point read by key pair
    pub fn get(&self, partition_key: &str, row_key: &str) -> Result<Option<Entity>> {
        let path = self.entity_path(partition_key, row_key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// All entities ordered by partition key, then row key
    pub fn all(&self) -> Result<Vec<Entity>> {
        let mut entities = Vec::new();

        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            if path.is_file() && path.extension().map(|e| e == "json").unwrap_or(false) {
                let content = fs::read_to_string(&path)?;
                entities.push(serde_json::from_str::<Entity>(&content)?);
            }
        }

        entities.sort_by(|a, b| {
            (&a.partition_key, &a.row_key).cmp(&(&b.partition_key, &b.row_key))
        });
        Ok(entities)
    }
}

/// Keep `[A-Za-z0-9-]`, escape every other byte as `_XX`
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{:02X}", byte));
        }
    }
    out
}

/// Table names: alphanumeric, leading letter, 3 to 63 characters
pub fn validate_table_name(name: &str) -> Result<()> {
    if name.len() < 3 || name.len() > 63 {
        return Err(WideColumnError::InvalidTableName(
            "name must be 3 to 63 characters".to_string(),
        ));
    }

    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(WideColumnError::InvalidTableName(
            "name must start with a letter".to_string(),
        ));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(WideColumnError::InvalidTableName(
            "name must be alphanumeric".to_string(),
        ));
    }

    Ok(())
}
