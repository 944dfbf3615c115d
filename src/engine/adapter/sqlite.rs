//! SQLite Adapter
//!
//! Implements RelationalBackend for SQLite using rusqlite + r2d2 connection pooling.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::ValueRef;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::{
    quote_ident, AdapterError, AdapterResult, AdminCommand, RelationalBackend, RelationalRow,
    RelationalValue,
};
use crate::engine::filter::FilterExpression;
use crate::engine::query::QuerySpec;

type DbPool = Pool<SqliteConnectionManager>;
type DbConn = PooledConnection<SqliteConnectionManager>;

pub const DEFAULT_PARTITION_KEY_COLUMN: &str = "PartitionKey";
pub const DEFAULT_ROW_KEY_COLUMN: &str = "RowKey";

pub struct SqliteAdapter {
    pool: DbPool,
    db_path: PathBuf,
    partition_key_column: String,
    row_key_column: String,
}

impl SqliteAdapter {
    pub fn new(db_path: &Path) -> AdapterResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| AdapterError::Connection(e.to_string()))?;

        let adapter = Self::with_pool(pool, db_path.to_path_buf());
        adapter.init_connection()?;
        Ok(adapter)
    }

    pub fn in_memory() -> AdapterResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| AdapterError::Connection(e.to_string()))?;

        let adapter = Self::with_pool(pool, PathBuf::from(":memory:"));
        adapter.init_connection()?;
        Ok(adapter)
    }

    fn with_pool(pool: DbPool, db_path: PathBuf) -> Self {
        Self {
            pool,
            db_path,
            partition_key_column: DEFAULT_PARTITION_KEY_COLUMN.to_string(),
            row_key_column: DEFAULT_ROW_KEY_COLUMN.to_string(),
        }
    }

    /// Override the columns used for key lookups
    pub fn with_key_columns(mut self, partition_key: &str, row_key: &str) -> Self {
        self.partition_key_column = partition_key.to_string();
        self.row_key_column = row_key.to_string();
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn init_connection(&self) -> AdapterResult<()> {
        let conn = self.get_conn()?;

        let _: String = conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
            .map_err(|e| AdapterError::Connection(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys=ON")
            .map_err(|e| AdapterError::Connection(e.to_string()))?;

        Ok(())
    }

    fn get_conn(&self) -> AdapterResult<DbConn> {
        self.pool
            .get()
            .map_err(|e| AdapterError::Connection(e.to_string()))
    }

    /// Execute multiple statements as a batch
    pub fn execute_batch(&self, sql: &str) -> AdapterResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(sql)
            .map_err(|e| AdapterError::Query(e.to_string()))
    }

    /// Run a row-returning statement with positional text parameters
    fn run(&self, sql: &str, params: &[String]) -> AdapterResult<Vec<RelationalRow>> {
        let conn = self.get_conn()?;
        let start = Instant::now();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| AdapterError::Query(e.to_string()))?;

        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                let mut out = RelationalRow::new();
                for (i, name) in column_names.iter().enumerate() {
                    let value = Self::value_ref_to_relational(row.get_ref(i)?);
                    out.properties.push((name.clone(), value));
                }
                Ok(out)
            })
            .map_err(|e| AdapterError::Query(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AdapterError::Query(e.to_string()))?;

        tracing::debug!(
            sql,
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "sqlite query"
        );
        Ok(rows)
    }

    /// Convert a rusqlite ValueRef to a relational scalar
    fn value_ref_to_relational(val: ValueRef<'_>) -> RelationalValue {
        match val {
            ValueRef::Integer(i) => RelationalValue::Int64(i),
            ValueRef::Real(f) => RelationalValue::Double(f),
            ValueRef::Text(t) => RelationalValue::Text(String::from_utf8_lossy(t).to_string()),
            ValueRef::Blob(b) => RelationalValue::Other(String::from_utf8_lossy(b).to_string()),
            ValueRef::Null => RelationalValue::Other(String::new()),
        }
    }

    /// Column names of a table or view, in declaration order
    fn table_columns(&self, table: &str) -> AdapterResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
            .map_err(|e| AdapterError::Query(e.to_string()))?;

        let columns = stmt
            .query_map([table], |row| row.get(0))
            .map_err(|e| AdapterError::Query(e.to_string()))?
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| AdapterError::Query(e.to_string()))?;

        if columns.is_empty() {
            return Err(AdapterError::NotFound(format!("table {}", table)));
        }
        Ok(columns)
    }

    fn ensure_table(&self, table: &str) -> AdapterResult<()> {
        self.table_columns(table).map(|_| ())
    }

    /// Reject names that are not columns of `table`.
    ///
    /// SQLite reads an unknown double-quoted identifier as a string literal,
    /// so an unchecked name would compare or project a constant.
    fn ensure_columns<'a, I>(&self, table: &str, names: I) -> AdapterResult<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let columns = self.table_columns(table)?;
        match names.into_iter().find(|name| !columns.iter().any(|c| c == name)) {
            Some(missing) => Err(AdapterError::Query(format!(
                "no such column in {}: {}",
                table, missing
            ))),
            None => Ok(()),
        }
    }

    fn status_row(table: &str, op: &str, msg: &str) -> RelationalRow {
        RelationalRow::new()
            .with("Table", RelationalValue::Text(table.to_string()))
            .with("Op", RelationalValue::Text(op.to_string()))
            .with("Msg_type", RelationalValue::Text("status".to_string()))
            .with("Msg_text", RelationalValue::Text(msg.to_string()))
    }
}

impl RelationalBackend for SqliteAdapter {
    fn list_tables(&self) -> AdapterResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .map_err(|e| AdapterError::Query(e.to_string()))?;

        let tables = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| AdapterError::Query(e.to_string()))?
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| AdapterError::Query(e.to_string()))?;

        Ok(tables)
    }

    fn query(&self, spec: &QuerySpec) -> AdapterResult<Vec<RelationalRow>> {
        self.run(&spec.to_sql(), &[])
    }

    fn filter_rows(
        &self,
        table: &str,
        select: &[String],
        filter: &FilterExpression,
    ) -> AdapterResult<Vec<RelationalRow>> {
        let attributes = filter
            .primary
            .iter()
            .chain(filter.attached_secondary().map(|(_, second)| second))
            .map(|c| c.attribute.as_str());
        self.ensure_columns(table, select.iter().map(String::as_str).chain(attributes))?;

        let columns = if select.is_empty() {
            "*".to_string()
        } else {
            select
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = format!("SELECT {} FROM {}", columns, quote_ident(table));
        let mut params = Vec::new();

        if let Some(ref primary) = filter.primary {
            sql.push_str(&format!(
                " WHERE {} {} ?1",
                quote_ident(&primary.attribute),
                primary.operator.to_sql()
            ));
            params.push(primary.value.clone());

            if let Some((combinator, second)) = filter.attached_secondary() {
                sql.push_str(&format!(
                    " {} {} {} ?2",
                    combinator.to_sql(),
                    quote_ident(&second.attribute),
                    second.operator.to_sql()
                ));
                params.push(second.value.clone());
            }
        }

        self.run(&sql, &params)
    }

    fn lookup(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> AdapterResult<Vec<RelationalRow>> {
        if partition_key.is_empty() && row_key.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_columns(
            table,
            [self.partition_key_column.as_str(), self.row_key_column.as_str()],
        )?;

        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1 AND {} = ?2",
            quote_ident(table),
            quote_ident(&self.partition_key_column),
            quote_ident(&self.row_key_column)
        );
        self.run(&sql, &[partition_key.to_string(), row_key.to_string()])
    }

    fn administer(&self, command: &AdminCommand) -> AdapterResult<Vec<RelationalRow>> {
        if let Some(table) = command.table() {
            self.ensure_table(table)?;
        }

        match command {
            AdminCommand::Analyze(t) => {
                self.execute_batch(&format!("ANALYZE {}", quote_ident(t)))?;
                Ok(vec![Self::status_row(t, "analyze", "OK")])
            }
            AdminCommand::Check(t) => {
                let sql = format!("PRAGMA integrity_check('{}')", t.replace('\'', "''"));
                let rows = self.run(&sql, &[])?;
                Ok(rows
                    .iter()
                    .filter_map(|row| match row.properties.first() {
                        Some((_, RelationalValue::Text(msg))) => {
                            Some(Self::status_row(t, "check", msg))
                        }
                        _ => None,
                    })
                    .collect())
            }
            AdminCommand::Repair(t) => {
                self.execute_batch(&format!("REINDEX {}", quote_ident(t)))?;
                Ok(vec![Self::status_row(t, "repair", "OK")])
            }
            AdminCommand::Optimize(t) => {
                self.execute_batch("VACUUM")?;
                Ok(vec![Self::status_row(t, "optimize", "OK")])
            }
            AdminCommand::ShowIndexes(t) => self.run(
                "SELECT name AS Key_name, \"unique\" AS Is_unique, origin AS Origin \
                 FROM pragma_index_list(?1)",
                &[t.clone()],
            ),
            AdminCommand::ShowKeys(t) => self.run(
                "SELECT name AS Column_name, pk AS Seq_in_index FROM pragma_table_info(?1) \
                 WHERE pk > 0 ORDER BY pk",
                &[t.clone()],
            ),
            AdminCommand::ShowEngines => self.run(
                "SELECT 'SQLite' AS Engine, 'DEFAULT' AS Support, sqlite_version() AS Version",
                &[],
            ),
            AdminCommand::ShowStatus => self.run(
                "SELECT name AS Name, type AS Type, ncol AS Columns FROM pragma_table_list \
                 WHERE schema = 'main' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                &[],
            ),
            AdminCommand::ShowPlugins => self.run(
                "SELECT compile_options AS Name FROM pragma_compile_options",
                &[],
            ),
            AdminCommand::ShowOpenTables => self.run(
                "SELECT name AS Database, file AS File FROM pragma_database_list",
                &[],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::filter::translate_ad_hoc_filter;
    use crate::engine::query::translate_structured_query;
    use serde_json::json;
    use std::collections::HashMap;

    fn seeded() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter
            .execute_batch(
                "CREATE TABLE people (
                    PartitionKey TEXT, RowKey TEXT, Name TEXT, Age INTEGER, Score REAL
                 );
                 CREATE INDEX people_name ON people (Name);
                 CREATE TABLE pets (id INTEGER PRIMARY KEY, owner TEXT, kind TEXT);
                 INSERT INTO people VALUES ('p1', 'r1', 'Alice', 30, 1.5);
                 INSERT INTO people VALUES ('p1', 'r2', 'Bob', 25, 2.0);
                 INSERT INTO people VALUES ('p2', 'r1', 'Carol', 41, NULL);
                 INSERT INTO pets (owner, kind) VALUES ('Alice', 'cat'), ('Bob', 'dog');",
            )
            .unwrap();
        adapter
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn names(rows: &[RelationalRow]) -> Vec<String> {
        rows.iter()
            .map(|r| match r.get("Name") {
                Some(RelationalValue::Text(s)) => s.clone(),
                other => panic!("unexpected {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_list_tables() {
        let adapter = seeded();
        assert_eq!(adapter.list_tables().unwrap(), vec!["people", "pets"]);
    }

    #[test]
    fn test_structured_query_with_join() {
        let adapter = seeded();
        let spec = translate_structured_query(&json!({
            "Select": "people.Name, pets.kind",
            "From": "people",
            "Join": {"TableName": "pets", "Conditions": "pets.owner = people.Name"},
            "Order": "people.Name"
        }))
        .unwrap();

        let rows = adapter.query(&spec).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("kind"), Some(&RelationalValue::Text("cat".to_string())));
        assert_eq!(names(&rows), vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_structured_query_limit_offset() {
        let adapter = seeded();
        let spec = translate_structured_query(&json!({
            "From": "people", "Order": "Age", "Limit": 1, "Offset": "1"
        }))
        .unwrap();
        let rows = adapter.query(&spec).unwrap();
        assert_eq!(names(&rows), vec!["Alice"]);
    }

    #[test]
    fn test_bad_sql_is_a_query_error() {
        let adapter = seeded();
        let spec = QuerySpec::from_table("missing_table");
        assert!(matches!(adapter.query(&spec), Err(AdapterError::Query(_))));
    }

    #[test]
    fn test_value_types() {
        let adapter = seeded();
        let filter = translate_ad_hoc_filter(&params(&[
            ("first_attr", "Name"),
            ("first_con", "eq"),
            ("first_val", "Carol"),
        ]));
        let rows = adapter.filter_rows("people", &[], &filter).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Age"), Some(&RelationalValue::Int64(41)));
        assert_eq!(rows[0].get("Score"), Some(&RelationalValue::Other(String::new())));
        let order: Vec<&str> = rows[0]
            .properties
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(order, vec!["PartitionKey", "RowKey", "Name", "Age", "Score"]);
    }

    #[test]
    fn test_filter_combinators() {
        let adapter = seeded();
        let base = [
            ("first_attr", "Age"),
            ("first_con", "ge"),
            ("first_val", "30"),
            ("second_attr", "Name"),
            ("second_con", "eq"),
            ("second_val", "Bob"),
        ];

        let mut or = params(&base);
        or.insert("join".to_string(), "or".to_string());
        let rows = adapter
            .filter_rows("people", &[], &translate_ad_hoc_filter(&or))
            .unwrap();
        assert_eq!(names(&rows), vec!["Alice", "Bob", "Carol"]);

        let mut and = params(&base);
        and.insert("join".to_string(), "and".to_string());
        let rows = adapter
            .filter_rows("people", &[], &translate_ad_hoc_filter(&and))
            .unwrap();
        assert!(rows.is_empty());

        let mut banana = params(&base);
        banana.insert("join".to_string(), "banana".to_string());
        let rows = adapter
            .filter_rows("people", &[], &translate_ad_hoc_filter(&banana))
            .unwrap();
        assert_eq!(names(&rows), vec!["Alice", "Carol"]);
    }

    #[test]
    fn test_filter_projection_and_no_filter() {
        let adapter = seeded();
        let rows = adapter
            .filter_rows("people", &["Name".to_string()], &FilterExpression::default())
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].properties.len(), 1);
    }

    #[test]
    fn test_filter_unknown_columns_are_errors() {
        let adapter = seeded();

        let filter = translate_ad_hoc_filter(&params(&[
            ("first_attr", "Nope"),
            ("first_con", "eq"),
            ("first_val", "Nope"),
        ]));
        let result = adapter.filter_rows("people", &[], &filter);
        assert!(matches!(result, Err(AdapterError::Query(ref msg)) if msg.contains("Nope")));

        let select = vec!["Name".to_string(), "Nope".to_string()];
        let result = adapter.filter_rows("people", &select, &FilterExpression::default());
        assert!(matches!(result, Err(AdapterError::Query(_))));

        // an unattached second condition is never applied, so it is not checked
        let filter = translate_ad_hoc_filter(&params(&[
            ("first_attr", "Name"),
            ("first_con", "eq"),
            ("first_val", "Bob"),
            ("second_attr", "Nope"),
            ("second_con", "eq"),
            ("second_val", "x"),
        ]));
        assert_eq!(names(&adapter.filter_rows("people", &[], &filter).unwrap()), vec!["Bob"]);
    }

    #[test]
    fn test_lookup_missing_key_columns() {
        let adapter = seeded();
        let result = adapter.lookup("pets", "Bob", "dog");
        assert!(matches!(result, Err(AdapterError::Query(_))));
    }

    #[test]
    fn test_filter_unknown_table() {
        let adapter = seeded();
        let result = adapter.filter_rows("nope", &[], &FilterExpression::default());
        assert!(matches!(result, Err(AdapterError::NotFound(_))));
    }

    #[test]
    fn test_lookup() {
        let adapter = seeded();
        let rows = adapter.lookup("people", "p1", "r2").unwrap();
        assert_eq!(names(&rows), vec!["Bob"]);
        assert!(adapter.lookup("people", "", "").unwrap().is_empty());
        assert!(adapter.lookup("people", "p9", "r9").unwrap().is_empty());
    }

    #[test]
    fn test_lookup_custom_key_columns() {
        let adapter = seeded().with_key_columns("owner", "kind");
        let rows = adapter.lookup("pets", "Bob", "dog").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&RelationalValue::Int64(2)));
    }

    #[test]
    fn test_admin_commands() {
        let adapter = seeded();

        let rows = adapter
            .administer(&AdminCommand::Analyze("people".to_string()))
            .unwrap();
        assert_eq!(rows[0].get("Msg_text"), Some(&RelationalValue::Text("OK".to_string())));

        let rows = adapter
            .administer(&AdminCommand::Check("people".to_string()))
            .unwrap();
        assert_eq!(rows[0].get("Msg_text"), Some(&RelationalValue::Text("ok".to_string())));

        let rows = adapter
            .administer(&AdminCommand::ShowIndexes("people".to_string()))
            .unwrap();
        assert_eq!(
            rows[0].get("Key_name"),
            Some(&RelationalValue::Text("people_name".to_string()))
        );

        let rows = adapter
            .administer(&AdminCommand::ShowKeys("pets".to_string()))
            .unwrap();
        assert_eq!(rows[0].get("Column_name"), Some(&RelationalValue::Text("id".to_string())));

        let rows = adapter.administer(&AdminCommand::ShowEngines).unwrap();
        assert_eq!(rows[0].get("Engine"), Some(&RelationalValue::Text("SQLite".to_string())));

        let rows = adapter.administer(&AdminCommand::ShowStatus).unwrap();
        assert_eq!(rows.len(), 2);

        assert!(!adapter.administer(&AdminCommand::ShowPlugins).unwrap().is_empty());
        assert!(!adapter.administer(&AdminCommand::ShowOpenTables).unwrap().is_empty());
        assert!(adapter.administer(&AdminCommand::Repair("pets".to_string())).is_ok());
        assert!(adapter.administer(&AdminCommand::Optimize("pets".to_string())).is_ok());
    }

    #[test]
    fn test_admin_unknown_table() {
        let adapter = seeded();
        let result = adapter.administer(&AdminCommand::Analyze("ghost".to_string()));
        assert!(matches!(result, Err(AdapterError::NotFound(_))));
    }
}
