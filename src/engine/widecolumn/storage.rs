//! Wide-column Storage Engine
//!
//! Main entry point for the file-backed entity store

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::entity::Entity;
use super::error::{Result, WideColumnError};
use super::meta::{Meta, META_FILE};
use super::query::EntityQuery;
use super::table::{validate_table_name, Table};
use super::WideColumnBackend;
use crate::engine::filter::FilterExpression;

pub struct TableStore {
    base_path: PathBuf,
}

impl TableStore {
    /// Open an existing store
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(WideColumnError::StoreNotFound(path.display().to_string()));
        }

        let meta = Meta::load(path)?;
        tracing::debug!(
            path = %path.display(),
            format_version = meta.format_version,
            "opened wide-column store"
        );

        Ok(Self {
            base_path: path.to_path_buf(),
        })
    }

    /// Create a new store
    pub fn create(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;
        Meta::new().save(path)?;
        tracing::info!(path = %path.display(), "created wide-column store");

        Ok(Self {
            base_path: path.to_path_buf(),
        })
    }

    /// Open or create a store
    pub fn open_or_create(path: &Path) -> Result<Self> {
        if path.join(META_FILE).exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    pub fn create_table(&self, name: &str) -> Result<Table> {
        Table::create(&self.base_path, name)
    }

    pub fn table(&self, name: &str) -> Result<Table> {
        Table::open(&self.base_path, name)
    }

    /// Insert or replace an entity; the write time becomes its Timestamp
    pub fn insert_entity(&self, table: &str, mut entity: Entity) -> Result<Entity> {
        entity.timestamp = Utc::now();
        self.table(table)?.upsert(&entity)?;
        Ok(entity)
    }
}

impl WideColumnBackend for TableStore {
    fn list_tables(&self) -> Result<Vec<String>> {
        let mut tables = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if validate_table_name(name).is_ok() {
                    tables.push(name.to_string());
                }
            }
        }

        tables.sort();
        Ok(tables)
    }

    fn filter_entities(
        &self,
        table: &str,
        select: &[String],
        filter: &FilterExpression,
    ) -> Result<Vec<Entity>> {
        let entities = self.table(table)?.all()?;
        let query = EntityQuery::new(select.to_vec(), filter.clone());
        Ok(query.execute(entities))
    }

    fn lookup(&self, table: &str, partition_key: &str, row_key: &str) -> Result<Vec<Entity>> {
        if partition_key.is_empty() && row_key.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .table(table)?
            .get(partition_key, row_key)?
            .into_iter()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::widecolumn::entity::EdmValue;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn named(pk: &str, rk: &str, name: &str) -> Entity {
        Entity::new(pk, rk).with("Name", EdmValue::String(name.to_string()))
    }

    fn seeded(dir: &Path) -> TableStore {
        let store = TableStore::create(dir).unwrap();
        store.create_table("people").unwrap();
        store.create_table("orders").unwrap();
        store.insert_entity("people", named("P1", "R1", "Alice")).unwrap();
        store.insert_entity("people", named("P1", "R2", "Bob")).unwrap();
        store
    }

    #[test]
    fn test_store_lifecycle() {
        let dir = tempdir().unwrap();
        let store = seeded(dir.path());

        assert_eq!(store.list_tables().unwrap(), vec!["orders", "people"]);
        assert_eq!(store.table("people").unwrap().all().unwrap().len(), 2);
        assert!(matches!(
            store.create_table("people"),
            Err(WideColumnError::TableAlreadyExists(_))
        ));
    }

    #[test]
    fn test_listing_skips_invalid_names() {
        let dir = tempdir().unwrap();
        let store = seeded(dir.path());
        for name in ["_staging", ".git", "ab", "9lives", "has-dash"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }

        let tables = store.list_tables().unwrap();
        assert_eq!(tables, vec!["orders", "people"]);
        for name in &tables {
            assert!(store.table(name).is_ok());
        }
    }

    #[test]
    fn test_insert_stamps_timestamp() {
        let dir = tempdir().unwrap();
        let store = seeded(dir.path());

        let stale = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let mut entity = named("P2", "R1", "Carol");
        entity.timestamp = stale;
        let stored = store.insert_entity("people", entity).unwrap();
        assert!(stored.timestamp > stale);
        assert_eq!(store.lookup("people", "P2", "R1").unwrap(), vec![stored]);
    }

    #[test]
    fn test_reopen() {
        let dir = tempdir().unwrap();
        seeded(dir.path());

        let store = TableStore::open(dir.path()).unwrap();
        assert_eq!(Meta::load(dir.path()).unwrap().engine, "bolt-widecolumn");
        assert_eq!(store.table("people").unwrap().all().unwrap().len(), 2);

        let missing = dir.path().join("missing");
        assert!(matches!(
            TableStore::open(&missing),
            Err(WideColumnError::StoreNotFound(_))
        ));
        assert!(TableStore::open_or_create(&missing).is_ok());
    }

    #[test]
    fn test_lookup() {
        let dir = tempdir().unwrap();
        let store = seeded(dir.path());

        let found = store.lookup("people", "P1", "R2").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("Name"), Some(&EdmValue::String("Bob".to_string())));

        assert!(store.lookup("people", "", "").unwrap().is_empty());
        assert!(store.lookup("people", "P9", "R9").unwrap().is_empty());
        assert!(matches!(
            store.lookup("ghosts", "P1", "R1"),
            Err(WideColumnError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_filter_entities() {
        let dir = tempdir().unwrap();
        let store = seeded(dir.path());

        let all = store
            .filter_entities("people", &["Missing".to_string()], &FilterExpression::default())
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].properties.is_empty());
        assert!(matches!(
            store.filter_entities("ghosts", &[], &FilterExpression::default()),
            Err(WideColumnError::TableNotFound(_))
        ));
    }
}
