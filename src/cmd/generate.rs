//! Generate command CLI handler.

use anyhow::Context;
use duckseed::config::{ConfigOverrides, GenConfig, ShortBatchPolicy};
use duckseed::pipeline::{self, RunSummary};
use duckseed::progress::Console;
use std::path::PathBuf;

pub struct GenerateArgs {
    pub config: Option<PathBuf>,
    pub customers: Option<usize>,
    pub customer_batch: Option<usize>,
    pub orders: Option<usize>,
    pub order_batch: Option<usize>,
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub reference_date: Option<chrono::NaiveDate>,
    pub short_batch: Option<String>,
    pub keep_database: bool,
    pub json: bool,
    pub progress: bool,
    pub quiet: bool,
}

pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    let base = match args.config {
        Some(ref path) => GenConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => GenConfig::default(),
    };

    let short_batch = args
        .short_batch
        .map(|s| s.parse::<ShortBatchPolicy>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;

    let config = ConfigOverrides {
        customers: args.customers,
        customer_batch: args.customer_batch,
        orders: args.orders,
        order_batch: args.order_batch,
        seed: args.seed,
        output_dir: args.output,
        database_path: args.database,
        reference_date: args.reference_date,
        short_batch,
        keep_database: args.keep_database,
    }
    .apply(base);

    let console = Console::new()
        .with_quiet(args.quiet || args.json)
        .with_progress_bar(args.progress);

    if !args.json {
        console.info("Starting data generation with DuckDB...");
    }

    let summary = pipeline::run(&config, &console)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("✓ Generation completed");
    println!("  Customers:                   {}", summary.customers);
    println!("  Orders:                      {}", summary.orders);
    println!(
        "  Average orders per customer: {:.2}",
        summary.avg_orders_per_customer
    );
    println!("  Output directory:            {}", summary.export.directory.display());
    if !summary.warnings.is_empty() {
        println!("  Warnings:                    {}", summary.warnings.len());
    }
    println!();
    println!("Total execution time: {:.2} seconds", summary.elapsed_secs);
}
