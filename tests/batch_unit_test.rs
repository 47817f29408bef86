//! Unit tests for record generation and batch assembly.

use ahash::AHashSet;
use chrono::NaiveDate;
use duckseed::batch::{BatchBuilder, RngSource};
use duckseed::fake::{email_for_tax_id, is_valid_tax_id};
use duckseed::generator::RecordGenerator;
use duckseed::model::OrderStatus;

fn generator() -> RecordGenerator {
    RecordGenerator::new(NaiveDate::from_ymd_opt(2025, 5, 20).unwrap())
}

#[test]
fn test_customer_batch_unique_tax_ids_and_emails() {
    let gen = generator();
    let builder = BatchBuilder::new(&gen, RngSource::new(42)).with_chunk_size(250);
    let batch = builder.customers(0, 1_000);

    let tax_ids: AHashSet<&str> = batch.records.iter().map(|c| c.tax_id.as_str()).collect();
    let emails: AHashSet<&str> = batch.records.iter().map(|c| c.email.as_str()).collect();
    assert_eq!(tax_ids.len(), batch.len());
    assert_eq!(emails.len(), batch.len());
}

#[test]
fn test_customer_batch_never_exceeds_request() {
    let gen = generator();
    let builder = BatchBuilder::new(&gen, RngSource::new(3)).with_chunk_size(7);
    for requested in [0, 1, 7, 8, 50] {
        let batch = builder.customers(0, requested);
        assert!(batch.len() <= requested);
        assert_eq!(
            batch.len() + batch.report.duplicates_dropped + batch.report.failed_records,
            requested
        );
    }
}

#[test]
fn test_customer_fields_satisfy_invariants() {
    let gen = generator();
    let today = gen.reference_date();
    let two_years_ago = NaiveDate::from_ymd_opt(2023, 5, 20).unwrap();
    let batch = BatchBuilder::new(&gen, RngSource::new(8)).customers(0, 300);

    for c in &batch.records {
        assert!(is_valid_tax_id(&c.tax_id));
        assert_eq!(c.email, email_for_tax_id(&c.tax_id));
        assert_eq!(c.country, "Brazil");
        assert!(matches!(c.gender.code(), "M" | "F"));
        let age = today.years_since(c.birth_date).unwrap();
        assert!((18..=90).contains(&age));
        assert!(c.registration_date >= two_years_ago && c.registration_date <= today);
        assert_eq!(c.postal_code.len(), 9);
        assert!(c.phone.starts_with('('));
    }
}

#[test]
fn test_orders_reference_known_customers() {
    let gen = generator();
    let builder = BatchBuilder::new(&gen, RngSource::new(42)).with_chunk_size(64);
    let customers = builder.customers(0, 20);
    let tax_ids: Vec<String> = customers.records.iter().map(|c| c.tax_id.clone()).collect();

    let orders = builder.orders(0, 400, &tax_ids);
    assert_eq!(orders.len(), 400);
    for order in &orders.records {
        assert!(tax_ids.contains(&order.tax_id));
        assert!(OrderStatus::ALL.contains(&order.status));
        assert_eq!(order.delivery_country, "Brazil");
    }
}

#[test]
fn test_coupon_and_discount_agree() {
    let gen = generator();
    let tax_ids = vec!["529.982.247-25".to_string()];
    let orders = BatchBuilder::new(&gen, RngSource::new(99)).orders(0, 1_000, &tax_ids);

    for order in &orders.records {
        match &order.coupon {
            Some(code) => {
                assert!(order.discount_value > 0.0);
                assert!(code.starts_with("CUPOM"));
                assert_eq!(code.len(), "CUPOM".len() + 8);
            }
            None => assert_eq!(order.discount_value, 0.0),
        }
    }
}

#[test]
fn test_same_seed_same_batches() {
    let gen = generator();
    let a = BatchBuilder::new(&gen, RngSource::new(42)).with_chunk_size(30);
    let b = BatchBuilder::new(&gen, RngSource::new(42)).with_chunk_size(30);

    assert_eq!(a.customers(2, 90).records, b.customers(2, 90).records);

    let tax_ids = vec!["111.444.777-35".to_string(), "529.982.247-25".to_string()];
    assert_eq!(
        a.orders(0, 90, &tax_ids).records,
        b.orders(0, 90, &tax_ids).records
    );
}

#[test]
fn test_different_batches_differ() {
    let gen = generator();
    let builder = BatchBuilder::new(&gen, RngSource::new(42));
    let first = builder.customers(0, 5);
    let second = builder.customers(1, 5);
    assert_ne!(first.records, second.records);
}

#[test]
fn test_different_seeds_differ() {
    let gen = generator();
    let a = BatchBuilder::new(&gen, RngSource::new(1)).customers(0, 5);
    let b = BatchBuilder::new(&gen, RngSource::new(2)).customers(0, 5);
    assert_ne!(a.records, b.records);
}
