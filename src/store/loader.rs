//! Batch loading with explicit uniqueness-conflict filtering.
//!
//! Rows whose unique keys already exist in the relation, or repeat a key
//! seen earlier in the same batch, are dropped before anything is written.
//! The surviving rows go in as multi-row INSERT statements within a single
//! transaction, so a structural failure leaves the relation untouched.

use ahash::AHashSet;
use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::Serialize;

use super::Store;
use crate::model::{Record, SqlValue};

/// Maximum rows per INSERT statement
pub const MAX_ROWS_PER_STATEMENT: usize = 1_000;

/// Result of loading one batch into a relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct InsertOutcome {
    /// Target relation
    pub table: String,
    /// Rows offered
    pub attempted: usize,
    /// Rows written
    pub accepted: usize,
    /// Rows dropped for violating a uniqueness constraint
    pub conflicts: usize,
}

impl InsertOutcome {
    pub fn empty(table: &str) -> Self {
        Self {
            table: table.to_string(),
            attempted: 0,
            accepted: 0,
            conflicts: 0,
        }
    }
}

impl std::fmt::Display for InsertOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rows inserted into {} ({} conflicts skipped)",
            self.accepted, self.table, self.conflicts
        )
    }
}

/// Writes batches into a relation of the store
pub struct Loader<'a> {
    store: &'a Store,
}

impl<'a> Loader<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Insert `records`, skipping rows that would violate a uniqueness
    /// constraint. The batch is consumed either way.
    pub fn insert<T: Record>(&self, records: Vec<T>) -> Result<InsertOutcome> {
        let attempted = records.len();
        if attempted == 0 {
            return Ok(InsertOutcome::empty(T::TABLE));
        }

        let mut taken = self.existing_keys::<T>()?;
        let mut rows: Vec<Vec<SqlValue>> = Vec::with_capacity(attempted);
        for record in records {
            let keys = record.unique_keys();
            let conflict = keys.iter().zip(&taken).any(|(key, seen)| seen.contains(key));
            if conflict {
                continue;
            }
            for (key, seen) in keys.into_iter().zip(taken.iter_mut()) {
                seen.insert(key);
            }
            rows.push(record.values());
        }

        let accepted = rows.len();
        self.write(T::TABLE, T::COLUMNS, &rows)?;

        Ok(InsertOutcome {
            table: T::TABLE.to_string(),
            attempted,
            accepted,
            conflicts: attempted - accepted,
        })
    }

    /// Current values of every unique column of `T`'s relation
    fn existing_keys<T: Record>(&self) -> Result<Vec<AHashSet<String>>> {
        T::UNIQUE_COLUMNS
            .iter()
            .map(|column| -> Result<AHashSet<String>> {
                let values = self.store.column_values(T::TABLE, column)?;
                Ok(values.into_iter().collect())
            })
            .collect()
    }

    fn write(&self, table: &str, columns: &[&str], rows: &[Vec<SqlValue>]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        self.store.execute_batch("BEGIN TRANSACTION;")?;
        for chunk in rows.chunks(MAX_ROWS_PER_STATEMENT) {
            let sql = insert_statement(table, columns, chunk);
            if let Err(e) = self.store.connection().execute_batch(&sql) {
                let _ = self.store.connection().execute_batch("ROLLBACK;");
                return Err(e).with_context(|| format!("Failed to insert into {}", table));
            }
        }
        self.store
            .execute_batch("COMMIT;")
            .with_context(|| format!("Failed to commit rows into {}", table))
    }
}

/// Generate a multi-row INSERT statement
pub fn insert_statement(table: &str, columns: &[&str], rows: &[Vec<SqlValue>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut sql = format!("INSERT INTO \"{}\" (", table);
    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push('"');
        sql.push_str(col);
        sql.push('"');
    }
    sql.push_str(") VALUES\n");

    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            sql.push_str(",\n");
        }
        sql.push('(');
        for (j, value) in row.iter().enumerate() {
            if j > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&value.to_sql());
        }
        sql.push(')');
    }
    sql.push(';');

    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_statement_with_columns() {
        let rows = vec![
            vec![SqlValue::from("alice"), SqlValue::Decimal(1.0)],
            vec![SqlValue::from("bob"), SqlValue::Null],
        ];
        let sql = insert_statement("users", &["name", "score"], &rows);
        assert_eq!(
            sql,
            "INSERT INTO \"users\" (\"name\", \"score\") VALUES\n('alice', 1.00),\n('bob', NULL);"
        );
    }

    #[test]
    fn test_insert_statement_empty() {
        assert!(insert_statement("users", &["name"], &[]).is_empty());
    }

    #[test]
    fn test_outcome_display() {
        let outcome = InsertOutcome {
            table: "customers".to_string(),
            attempted: 10,
            accepted: 8,
            conflicts: 2,
        };
        assert_eq!(
            outcome.to_string(),
            "8 rows inserted into customers (2 conflicts skipped)"
        );
    }
}
