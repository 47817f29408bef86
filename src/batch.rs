//! Batch assembly in bounded sub-chunks.
//!
//! A batch of N records is produced `SUB_CHUNK_SIZE` records at a time. Each
//! sub-chunk draws from its own ChaCha stream, so a given (seed, batch,
//! chunk) always yields the same records regardless of what was generated
//! before it.

use ahash::AHashSet;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::SUB_CHUNK_SIZE;
use crate::generator::RecordGenerator;
use crate::model::{Customer, Order};

/// Entity tag mixed into stream ids so customers and orders never share a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Customer = 1,
    Order = 2,
}

/// Deterministic source of per-chunk random streams
#[derive(Debug, Clone, Copy)]
pub struct RngSource {
    seed: u64,
}

impl RngSource {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// RNG for one sub-chunk of one load batch
    pub fn stream(&self, entity: Entity, batch: usize, chunk: usize) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let id = ((entity as u64) << 56)
            | ((batch as u64 & 0xFF_FFFF) << 32)
            | (chunk as u64 & 0xFFFF_FFFF);
        rng.set_stream(id);
        rng
    }
}

/// What happened while building one batch
#[derive(Debug, Default, Clone, Serialize, schemars::JsonSchema)]
pub struct BatchReport {
    /// Records asked for
    pub requested: usize,
    /// Records in the finished batch
    pub produced: usize,
    /// Records whose generation failed
    pub failed_records: usize,
    /// Records dropped for repeating a tax id
    pub duplicates_dropped: usize,
    /// Sub-chunks that produced nothing
    pub skipped_chunks: usize,
    /// Recoverable problems, one line each
    pub warnings: Vec<String>,
}

impl BatchReport {
    fn new(requested: usize) -> Self {
        Self {
            requested,
            ..Default::default()
        }
    }

    /// Records missing relative to the request
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.produced)
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }
}

/// A finished batch plus its report
#[derive(Debug)]
pub struct Batch<T> {
    pub records: Vec<T>,
    pub report: BatchReport,
}

impl<T> Batch<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Sub-chunk bounds `(start, end)` covering `0..total`
pub fn chunk_ranges(total: usize, chunk_size: usize) -> Vec<(usize, usize)> {
    (0..total)
        .step_by(chunk_size.max(1))
        .map(|start| (start, (start + chunk_size).min(total)))
        .collect()
}

/// Keep the first customer seen for each tax id, counting the rest as dropped
pub fn dedupe_by_tax_id<I>(customers: I, report: &mut BatchReport) -> Vec<Customer>
where
    I: IntoIterator<Item = Customer>,
{
    let customers = customers.into_iter();
    let mut seen: AHashSet<String> = AHashSet::with_capacity(customers.size_hint().0);
    let mut kept = Vec::with_capacity(customers.size_hint().0);
    for customer in customers {
        if seen.insert(customer.tax_id.clone()) {
            kept.push(customer);
        } else {
            report.duplicates_dropped += 1;
        }
    }
    kept
}

/// Assembles customer and order batches
pub struct BatchBuilder<'a> {
    generator: &'a RecordGenerator,
    source: RngSource,
    chunk_size: usize,
}

impl<'a> BatchBuilder<'a> {
    pub fn new(generator: &'a RecordGenerator, source: RngSource) -> Self {
        Self {
            generator,
            source,
            chunk_size: SUB_CHUNK_SIZE,
        }
    }

    /// Override the sub-chunk size (tests use small chunks)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn customers(&self, batch_index: usize, count: usize) -> Batch<Customer> {
        self.customers_with_progress(batch_index, count, |_, _| {})
    }

    /// Build up to `count` customers with unique tax ids.
    ///
    /// The callback receives `(records_attempted, count)` after each sub-chunk.
    pub fn customers_with_progress<F>(
        &self,
        batch_index: usize,
        count: usize,
        mut progress: F,
    ) -> Batch<Customer>
    where
        F: FnMut(usize, usize),
    {
        let mut report = BatchReport::new(count);
        let mut chunks: Vec<Vec<Customer>> = Vec::new();

        let ranges = chunk_ranges(count, self.chunk_size);
        for (chunk_index, (start, end)) in ranges.into_iter().enumerate() {
            let mut rng = self.source.stream(Entity::Customer, batch_index, chunk_index);
            let mut candidates = Vec::with_capacity(end - start);

            for _ in start..end {
                match self.generator.customer(&mut rng) {
                    Ok(customer) => candidates.push(customer),
                    Err(e) => {
                        report.failed_records += 1;
                        report.warn(format!("Failed to generate customer: {}", e));
                    }
                }
            }
            let chunk = dedupe_by_tax_id(candidates, &mut report);

            if chunk.is_empty() {
                report.skipped_chunks += 1;
                report.warn(format!(
                    "Customer chunk {}-{} produced no records, skipped",
                    start + 1,
                    end
                ));
            } else {
                chunks.push(chunk);
            }
            progress(end, count);
        }

        let mut records = dedupe_by_tax_id(chunks.into_iter().flatten(), &mut report);
        // chunks never yield more than `count` candidates, so this is a no-op today
        records.truncate(count);

        report.produced = records.len();
        Batch { records, report }
    }

    pub fn orders(&self, batch_index: usize, count: usize, tax_ids: &[String]) -> Batch<Order> {
        self.orders_with_progress(batch_index, count, tax_ids, |_, _| {})
    }

    /// Build up to `count` orders referencing `tax_ids`.
    ///
    /// Orders are not de-duplicated; repeated customers are expected.
    pub fn orders_with_progress<F>(
        &self,
        batch_index: usize,
        count: usize,
        tax_ids: &[String],
        mut progress: F,
    ) -> Batch<Order>
    where
        F: FnMut(usize, usize),
    {
        let mut report = BatchReport::new(count);
        let mut records: Vec<Order> = Vec::with_capacity(count);

        let ranges = chunk_ranges(count, self.chunk_size);
        for (chunk_index, (start, end)) in ranges.into_iter().enumerate() {
            let mut rng = self.source.stream(Entity::Order, batch_index, chunk_index);
            let mut chunk = Vec::with_capacity(end - start);
            let mut first_error = None;

            for _ in start..end {
                match self.generator.order(&mut rng, tax_ids) {
                    Ok(order) => chunk.push(order),
                    Err(e) => {
                        report.failed_records += 1;
                        first_error.get_or_insert(e);
                    }
                }
            }

            if let Some(e) = first_error {
                report.warn(format!(
                    "Failed to generate {} orders in chunk {}-{}: {}",
                    (end - start) - chunk.len(),
                    start + 1,
                    end,
                    e
                ));
            }

            if chunk.is_empty() {
                report.skipped_chunks += 1;
                report.warn(format!(
                    "Order chunk {}-{} produced no records, skipped",
                    start + 1,
                    end
                ));
            } else {
                records.append(&mut chunk);
            }
            progress(end, count);
        }

        report.produced = records.len();
        Batch { records, report }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand_chacha::ChaCha8Rng;

    fn generator() -> RecordGenerator {
        RecordGenerator::new(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
    }

    #[test]
    fn test_chunk_ranges_uneven() {
        assert_eq!(chunk_ranges(25, 10), vec![(0, 10), (10, 20), (20, 25)]);
        assert_eq!(chunk_ranges(10, 10), vec![(0, 10)]);
        assert!(chunk_ranges(0, 10).is_empty());
    }

    #[test]
    fn test_streams_differ_per_chunk() {
        use rand::Rng;
        let source = RngSource::new(42);
        let a: u64 = source.stream(Entity::Customer, 0, 0).random();
        let b: u64 = source.stream(Entity::Customer, 0, 1).random();
        let c: u64 = source.stream(Entity::Order, 0, 0).random();
        let again: u64 = source.stream(Entity::Customer, 0, 0).random();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, again);
    }

    #[test]
    fn test_customer_batch_exact_size() {
        let gen = generator();
        let builder = BatchBuilder::new(&gen, RngSource::new(42)).with_chunk_size(30);
        let batch = builder.customers(0, 100);
        assert_eq!(batch.len() + batch.report.duplicates_dropped, 100);
        assert_eq!(batch.report.requested, 100);
        assert_eq!(batch.report.produced, batch.len());
    }

    #[test]
    fn test_progress_reports_every_chunk() {
        let gen = generator();
        let builder = BatchBuilder::new(&gen, RngSource::new(1)).with_chunk_size(40);
        let mut seen = Vec::new();
        builder.customers_with_progress(0, 100, |done, total| seen.push((done, total)));
        assert_eq!(seen, vec![(40, 100), (80, 100), (100, 100)]);
    }

    fn with_tax_id(seed: u64, tax_id: &str) -> Customer {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut customer = generator().customer(&mut rng).unwrap();
        customer.tax_id = tax_id.to_string();
        customer
    }

    #[test]
    fn test_dedupe_within_chunk_keeps_first() {
        let first = with_tax_id(1, "529.982.247-25");
        let repeat = with_tax_id(2, "529.982.247-25");
        let other = with_tax_id(3, "111.444.777-35");
        let mut report = BatchReport::new(3);

        let kept = dedupe_by_tax_id(vec![first.clone(), repeat, other.clone()], &mut report);
        assert_eq!(kept, vec![first, other]);
        assert_eq!(report.duplicates_dropped, 1);
    }

    #[test]
    fn test_dedupe_across_chunks() {
        let a = with_tax_id(1, "529.982.247-25");
        let b = with_tax_id(2, "111.444.777-35");
        let a_again = with_tax_id(3, "529.982.247-25");
        let b_again = with_tax_id(4, "111.444.777-35");
        let chunks = vec![vec![a.clone(), b.clone()], vec![a_again, b_again]];
        let mut report = BatchReport::new(4);

        let kept = dedupe_by_tax_id(chunks.into_iter().flatten(), &mut report);
        assert_eq!(kept.len(), 2);
        assert!(kept.len() <= report.requested);
        assert_eq!(kept[0].id, a.id);
        assert_eq!(kept[1].id, b.id);
        assert_eq!(report.duplicates_dropped, 2);
    }

    #[test]
    fn test_dedupe_without_duplicates_is_identity() {
        let customers = vec![with_tax_id(1, "529.982.247-25"), with_tax_id(2, "111.444.777-35")];
        let mut report = BatchReport::new(2);
        assert_eq!(dedupe_by_tax_id(customers.clone(), &mut report), customers);
        assert_eq!(report.duplicates_dropped, 0);
    }

    #[test]
    fn test_orders_without_customers_skip_every_chunk() {
        let gen = generator();
        let builder = BatchBuilder::new(&gen, RngSource::new(1)).with_chunk_size(10);
        let batch = builder.orders(0, 25, &[]);
        assert!(batch.is_empty());
        assert_eq!(batch.report.failed_records, 25);
        assert_eq!(batch.report.skipped_chunks, 3);
        assert_eq!(batch.report.shortfall(), 25);
        assert!(!batch.report.warnings.is_empty());
    }
}
