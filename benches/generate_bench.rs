//! Benchmarks for record generation and SQL rendering.
//!
//! Tests:
//! - Customer batch generation at varying sizes
//! - Order batch generation against a fixed customer pool
//! - Multi-row INSERT rendering

use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use duckseed::batch::{BatchBuilder, RngSource};
use duckseed::generator::RecordGenerator;
use duckseed::model::{Customer, Record};
use duckseed::store::insert_statement;
use std::hint::black_box;

fn generator() -> RecordGenerator {
    RecordGenerator::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
}

fn bench_customer_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("customer_batch");
    let gen = generator();

    for size in [1_000u64, 10_000, 50_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("customers", size), &size, |b, &size| {
            let builder = BatchBuilder::new(&gen, RngSource::new(42));
            b.iter(|| black_box(builder.customers(0, size as usize).len()))
        });
    }

    group.finish();
}

fn bench_order_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_batch");
    let gen = generator();
    let builder = BatchBuilder::new(&gen, RngSource::new(42));
    let tax_ids: Vec<String> = builder
        .customers(0, 1_000)
        .records
        .into_iter()
        .map(|c| c.tax_id)
        .collect();

    for size in [1_000u64, 10_000, 50_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("orders", size), &size, |b, &size| {
            b.iter(|| black_box(builder.orders(1, size as usize, &tax_ids).len()))
        });
    }

    group.finish();
}

fn bench_insert_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_statement");
    let gen = generator();
    let customers = BatchBuilder::new(&gen, RngSource::new(7))
        .customers(0, 1_000)
        .records;
    let rows: Vec<_> = customers.iter().map(Customer::values).collect();

    group.throughput(Throughput::Elements(rows.len() as u64));
    group.bench_function("customers_1000_rows", |b| {
        b.iter(|| black_box(insert_statement(Customer::TABLE, Customer::COLUMNS, &rows).len()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_customer_batches,
    bench_order_batches,
    bench_insert_rendering
);
criterion_main!(benches);
