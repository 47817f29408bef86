//! End-to-end generation run.
//!
//! Sequence: ensure schema, purge, load customers, read back tax ids, load
//! orders, report statistics, export, then close the store and delete the
//! working files. Cleanup runs on every exit path: the working files are
//! owned by a guard declared before the store, so the store is dropped (and
//! its connection closed) first, then the files are removed.

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

use crate::batch::{Batch, BatchBuilder, BatchReport, RngSource};
use crate::config::{GenConfig, ShortBatchPolicy};
use crate::export::{descriptor_paths, ExportReport, Exporter};
use crate::generator::RecordGenerator;
use crate::model::{Customer, Order, Record};
use crate::progress::Console;
use crate::store::{self, database_files, InsertOutcome, Loader, Store};

/// One generated-and-loaded batch
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct LoadSummary {
    pub index: usize,
    pub batch: BatchReport,
    pub insert: InsertOutcome,
}

/// Outcome of a complete run
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct RunSummary {
    pub seed: u64,
    pub customers: u64,
    pub orders: u64,
    pub avg_orders_per_customer: f64,
    pub customer_batches: Vec<LoadSummary>,
    pub order_batches: Vec<LoadSummary>,
    pub export: ExportReport,
    pub warnings: Vec<String>,
    pub elapsed_secs: f64,
}

/// Average orders per customer, zero when there are no customers
pub fn average_orders(customers: u64, orders: u64) -> f64 {
    if customers == 0 {
        0.0
    } else {
        orders as f64 / customers as f64
    }
}

/// Deletes the working database and export descriptors when dropped
pub struct TransientFiles {
    paths: Vec<PathBuf>,
}

impl TransientFiles {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Files removed on cleanup for this configuration
    pub fn for_config(config: &GenConfig) -> Self {
        let mut paths = descriptor_paths(&config.output_dir);
        if !config.keep_database {
            paths.extend(database_files(&config.database_path()));
        }
        Self::new(paths)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Drop for TransientFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            if path.exists() {
                let _ = std::fs::remove_file(path);
            }
        }
    }
}

/// Which relation a load loop is filling
#[derive(Debug, Clone, Copy)]
enum Target {
    Customers,
    Orders,
}

impl Target {
    fn label(self) -> &'static str {
        match self {
            Target::Customers => "customers",
            Target::Orders => "orders",
        }
    }
}

/// Drives a run for one configuration
pub struct Pipeline<'a> {
    config: &'a GenConfig,
    console: &'a Console,
    chunk_size: Option<usize>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a GenConfig, console: &'a Console) -> Self {
        Self {
            config,
            console,
            chunk_size: None,
        }
    }

    /// Override the sub-chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Run every stage and clean up afterwards, whatever the outcome
    pub fn run(&self) -> Result<RunSummary> {
        self.config.validate()?;
        let start = Instant::now();

        let _cleanup = TransientFiles::for_config(self.config);
        let store = Store::open(&self.config.database_path())?;
        let mut summary = self.run_stages(&store)?;
        store.close()?;

        summary.elapsed_secs = start.elapsed().as_secs_f64();
        Ok(summary)
    }

    /// Every stage up to and including export, against an open store
    pub fn run_stages(&self, store: &Store) -> Result<RunSummary> {
        let console = self.console;
        let config = self.config;

        store::ensure_schema(store)?;
        store::purge(store)?;

        let generator = RecordGenerator::new(config.reference_date())
            .with_coupon_probability(config.coupon_probability);
        let mut builder = BatchBuilder::new(&generator, RngSource::new(config.seed));
        if let Some(size) = self.chunk_size {
            builder = builder.with_chunk_size(size);
        }
        let mut warnings = Vec::new();

        console.info("Generating customers...");
        let customer_batches = self.load_relation(
            store,
            Target::Customers,
            config.customers,
            config.customer_batch,
            &mut warnings,
            |index, size, progress| builder.customers_with_progress(index, size, progress),
        )?;

        let tax_ids = store.tax_ids()?;

        console.info("");
        console.info("Generating orders...");
        let order_batches = self.load_relation(
            store,
            Target::Orders,
            config.orders,
            config.order_batch,
            &mut warnings,
            |index, size, progress| builder.orders_with_progress(index, size, &tax_ids, progress),
        )?;

        let customers = store.count(Customer::TABLE)?;
        let orders = store.count(Order::TABLE)?;
        let avg = average_orders(customers, orders);
        console.info("");
        console.info("Statistics:");
        console.info(format!("- Total customers generated: {}", customers));
        console.info(format!("- Total orders generated: {}", orders));
        console.info(format!("- Average orders per customer: {:.2}", avg));

        console.info("");
        console.info("Exporting to CSV...");
        let export = Exporter::new(store).export(&config.output_dir)?;
        for file in &export.files {
            console.info(format!("  {} rows -> {}", file.rows, file.path.display()));
        }

        Ok(RunSummary {
            seed: config.seed,
            customers,
            orders,
            avg_orders_per_customer: avg,
            customer_batches,
            order_batches,
            export,
            warnings,
            elapsed_secs: 0.0,
        })
    }

    /// Generate and load batches until `total` rows are accepted or the
    /// short-batch policy says stop
    fn load_relation<T, F>(
        &self,
        store: &Store,
        target: Target,
        total: usize,
        batch_size: usize,
        warnings: &mut Vec<String>,
        mut build: F,
    ) -> Result<Vec<LoadSummary>>
    where
        T: Record,
        F: FnMut(usize, usize, &mut dyn FnMut(usize, usize)) -> Batch<T>,
    {
        let console = self.console;
        let policy = self.config.short_batch;
        let planned = total.div_ceil(batch_size);
        let loader = Loader::new(store);

        let mut summaries = Vec::new();
        let mut loaded = 0usize;
        let mut stalled = 0usize;
        let mut index = 0usize;

        console.start_bar(target.label(), total as u64);
        while loaded < total {
            let size = match policy {
                ShortBatchPolicy::Retry => {
                    if stalled >= self.config.max_stalled_batches {
                        break;
                    }
                    batch_size.min(total - loaded)
                }
                ShortBatchPolicy::Accept | ShortBatchPolicy::Reject => {
                    if index >= planned {
                        break;
                    }
                    batch_size.min(total - index * batch_size)
                }
            };

            console.info(format!(
                "Processing {} {}-{}...",
                target.label(),
                loaded + 1,
                loaded + size
            ));
            let mut report_chunk = |done: usize, of: usize| {
                console.info(format!("  Generated {}/{} {}...", done, of, target.label()));
            };
            let batch = build(index, size, &mut report_chunk);
            for warning in &batch.report.warnings {
                console.warn(warning);
            }
            warnings.extend(batch.report.warnings.iter().cloned());

            let report = batch.report;
            let insert = if batch.records.is_empty() {
                InsertOutcome::empty(T::TABLE)
            } else {
                loader.insert(batch.records).with_context(|| {
                    format!("Loading {} batch {} failed", target.label(), index + 1)
                })?
            };
            console.info(format!("  {}", insert));

            loaded += insert.accepted;
            stalled = if insert.accepted == 0 { stalled + 1 } else { 0 };
            console.set_bar_position(loaded as u64);
            summaries.push(LoadSummary {
                index,
                batch: report,
                insert,
            });
            index += 1;
        }
        console.finish_bar();

        if loaded < total {
            let message = format!(
                "Only {} of {} {} were loaded",
                loaded,
                total,
                target.label()
            );
            if policy == ShortBatchPolicy::Reject {
                anyhow::bail!("{} (short batch policy: reject)", message);
            }
            console.warn(&message);
            warnings.push(message);
        }
        Ok(summaries)
    }
}

/// Run a pipeline for `config`, reporting to `console`
pub fn run(config: &GenConfig, console: &Console) -> Result<RunSummary> {
    Pipeline::new(config, console).run()
}

/// True when none of the run's transient files remain
pub fn is_clean(config: &GenConfig) -> bool {
    TransientFiles::for_config(config)
        .paths()
        .iter()
        .all(|p| !p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_average_orders() {
        assert_eq!(average_orders(100, 500), 5.0);
        assert_eq!(average_orders(0, 10), 0.0);
    }

    #[test]
    fn test_transient_files_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("schema.sql");
        let b = dir.path().join("load.sql");
        fs::write(&a, "x").unwrap();
        {
            let _guard = TransientFiles::new(vec![a.clone(), b.clone()]);
        }
        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn test_keep_database_spares_db_file() {
        let config = GenConfig {
            output_dir: PathBuf::from("out"),
            keep_database: true,
            ..Default::default()
        };
        let files = TransientFiles::for_config(&config);
        assert!(!files.paths().contains(&PathBuf::from("out").join("data.duckdb")));
        assert!(files.paths().contains(&PathBuf::from("out").join("load.sql")));
    }
}
