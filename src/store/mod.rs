//! DuckDB working store.
//!
//! The store wraps a single DuckDB connection that is threaded explicitly
//! through schema setup, loading and export. It is opened once per run and
//! closed by the orchestrator before the working files are deleted.

mod loader;
mod schema;

pub use loader::{insert_statement, InsertOutcome, Loader, MAX_ROWS_PER_STATEMENT};
pub use schema::{ensure_schema, purge, schema_ddl, CUSTOMERS_DDL, ORDERS_DDL};

use anyhow::{Context, Result};
use duckdb::Connection;
use std::path::{Path, PathBuf};

use crate::model::{Customer, Record};

/// The working database for one run
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open (or create) a file-backed database
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open DuckDB database: {}", path.display()))?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a throwaway in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to create in-memory DuckDB database")?;
        Ok(Self { conn, path: None })
    }

    /// Path of the database file, if file-backed
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get the underlying DuckDB connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Execute statements that don't return results
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .with_context(|| format!("Failed to execute: {}", sql))
    }

    /// Number of rows in a relation
    pub fn count(&self, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", table);
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .with_context(|| format!("Failed to count rows in {}", table))?;
        Ok(count as u64)
    }

    /// All values of one column rendered as text, in ascending order
    pub fn column_values(&self, table: &str, column: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT CAST(\"{col}\" AS VARCHAR) FROM \"{table}\" WHERE \"{col}\" IS NOT NULL ORDER BY 1",
            col = column,
            table = table
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .with_context(|| format!("Failed to prepare query: {}", sql))?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .with_context(|| format!("Failed to execute query: {}", sql))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read {}.{}", table, column))?;
        Ok(values)
    }

    /// Tax ids of every stored customer, sorted
    pub fn tax_ids(&self) -> Result<Vec<String>> {
        self.column_values(Customer::TABLE, "tax_id")
    }

    /// Close the connection, surfacing any error DuckDB reports
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| anyhow::Error::new(e).context("Failed to close DuckDB database"))
    }
}

/// Files DuckDB keeps next to a database file
pub fn database_files(path: &Path) -> Vec<PathBuf> {
    let mut wal = path.as_os_str().to_owned();
    wal.push(".wal");
    vec![path.to_path_buf(), PathBuf::from(wal)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_has_no_path() {
        let store = Store::in_memory().unwrap();
        assert!(store.path().is_none());
    }

    #[test]
    fn test_database_files_include_wal() {
        let files = database_files(Path::new("seeds/data.duckdb"));
        assert_eq!(
            files,
            vec![
                PathBuf::from("seeds/data.duckdb"),
                PathBuf::from("seeds/data.duckdb.wal")
            ]
        );
    }

    #[test]
    fn test_count_and_values() {
        let store = Store::in_memory().unwrap();
        store
            .execute_batch("CREATE TABLE t (v VARCHAR); INSERT INTO t VALUES ('b'), ('a'), (NULL);")
            .unwrap();
        assert_eq!(store.count("t").unwrap(), 3);
        assert_eq!(store.column_values("t", "v").unwrap(), vec!["a", "b"]);
    }
}
