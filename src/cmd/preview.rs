//! Preview command: generate records in memory and print them.

use chrono::{Local, NaiveDate};
use duckseed::batch::{BatchBuilder, RngSource};
use duckseed::generator::RecordGenerator;
use duckseed::model::{Customer, Order};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct PreviewJson<'a> {
    customers: &'a [Customer],
    orders: &'a [Order],
}

pub fn run(
    customers: usize,
    orders: usize,
    seed: u64,
    reference_date: Option<NaiveDate>,
    format: &str,
) -> anyhow::Result<()> {
    let today = reference_date.unwrap_or_else(|| Local::now().date_naive());
    let generator = RecordGenerator::new(today);
    let builder = BatchBuilder::new(&generator, RngSource::new(seed));

    let customer_batch = builder.customers(0, customers);
    let tax_ids: Vec<String> = customer_batch
        .records
        .iter()
        .map(|c| c.tax_id.clone())
        .collect();
    let order_batch = builder.orders(0, orders, &tax_ids);

    for warning in customer_batch
        .report
        .warnings
        .iter()
        .chain(&order_batch.report.warnings)
    {
        eprintln!("warning: {}", warning);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format.to_lowercase().as_str() {
        "json" => {
            let preview = PreviewJson {
                customers: &customer_batch.records,
                orders: &order_batch.records,
            };
            serde_json::to_writer_pretty(&mut out, &preview)?;
            writeln!(out)?;
        }
        "csv" => {
            write_csv(&mut out, &customer_batch.records)?;
            writeln!(out)?;
            write_csv(&mut out, &order_batch.records)?;
        }
        other => anyhow::bail!("Unknown format: {}. Valid: csv, json", other),
    }
    Ok(())
}

fn write_csv<W: Write, T: Serialize>(out: &mut W, records: &[T]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
