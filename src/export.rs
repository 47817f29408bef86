//! CSV export of the finished relations.
//!
//! DuckDB's `EXPORT DATABASE` writes one CSV per relation together with
//! `schema.sql` and `load.sql` descriptors. The descriptors are transient and
//! removed at cleanup; the CSV files are re-read to confirm every row landed.

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::{Customer, Order, Record};
use crate::store::Store;

/// Descriptor files written by `EXPORT DATABASE`
pub const DESCRIPTOR_FILES: &[&str] = &["schema.sql", "load.sql"];

/// One exported relation
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ExportedFile {
    pub table: String,
    pub path: PathBuf,
    /// Data rows, header excluded
    pub rows: u64,
}

/// Everything written by one export
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct ExportReport {
    pub directory: PathBuf,
    pub files: Vec<ExportedFile>,
}

impl ExportReport {
    pub fn file(&self, table: &str) -> Option<&ExportedFile> {
        self.files.iter().find(|f| f.table == table)
    }
}

pub struct Exporter<'a> {
    store: &'a Store,
}

impl<'a> Exporter<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Export both relations to `dir`. Call only after all loading is done.
    pub fn export(&self, dir: &Path) -> Result<ExportReport> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

        let target = dir.display().to_string().replace('\'', "''");
        self.store
            .execute_batch(&format!(
                "EXPORT DATABASE '{}' (FORMAT CSV, HEADER true, DELIMITER ',');",
                target
            ))
            .context("Failed to export database")?;

        let mut report = ExportReport {
            directory: dir.to_path_buf(),
            files: Vec::new(),
        };
        for table in [Customer::TABLE, Order::TABLE] {
            let path = find_table_file(dir, table)?;
            let rows = count_csv_rows(&path)?;
            let expected = self.store.count(table)?;
            if rows != expected {
                anyhow::bail!(
                    "Exported {} has {} rows but the relation holds {}",
                    path.display(),
                    rows,
                    expected
                );
            }
            report.files.push(ExportedFile {
                table: table.to_string(),
                path,
                rows,
            });
        }
        Ok(report)
    }
}

/// Locate the CSV DuckDB wrote for `table`
pub fn find_table_file(dir: &Path, table: &str) -> Result<PathBuf> {
    let direct = dir.join(format!("{}.csv", table));
    if direct.is_file() {
        return Ok(direct);
    }

    // Some DuckDB versions prefix the file with the schema name
    let suffix = format!("_{}", table);
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        let is_csv = path.extension().is_some_and(|ext| ext == "csv");
        let matches = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| stem.ends_with(&suffix));
        if is_csv && matches {
            return Ok(path);
        }
    }
    anyhow::bail!("No exported CSV found for {} in {}", table, dir.display())
}

/// Data rows in a CSV file with a header line
pub fn count_csv_rows(path: &Path) -> Result<u64> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rows = 0u64;
    for record in reader.records() {
        record.with_context(|| format!("Malformed CSV in {}", path.display()))?;
        rows += 1;
    }
    Ok(rows)
}

/// Header of a CSV file
pub fn csv_header(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(reader.headers()?.iter().map(str::to_string).collect())
}

/// Descriptor paths inside `dir`
pub fn descriptor_paths(dir: &Path) -> Vec<PathBuf> {
    DESCRIPTOR_FILES.iter().map(|name| dir.join(name)).collect()
}
