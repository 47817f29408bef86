//! Run configuration.
//!
//! Values come from built-in defaults, an optional YAML file and finally
//! command-line overrides, in that order of precedence.

use chrono::{Local, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Rows generated per sub-chunk. Bounds peak memory while building a batch.
pub const SUB_CHUNK_SIZE: usize = 10_000;

pub const DEFAULT_CUSTOMERS: usize = 10_000;
pub const DEFAULT_CUSTOMER_BATCH: usize = 5_000;
pub const DEFAULT_ORDERS: usize = 50_000;
pub const DEFAULT_ORDER_BATCH: usize = 5_000;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_COUPON_PROBABILITY: f64 = 0.2;
pub const DEFAULT_MAX_STALLED_BATCHES: usize = 3;

/// What to do when fewer rows were accepted than requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShortBatchPolicy {
    /// Keep the shortfall and report it as a warning
    Accept,
    /// Generate extra batches until the target is met or progress stalls
    #[default]
    Retry,
    /// Abort the run
    Reject,
}

impl std::str::FromStr for ShortBatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accept" => Ok(ShortBatchPolicy::Accept),
            "retry" => Ok(ShortBatchPolicy::Retry),
            "reject" => Ok(ShortBatchPolicy::Reject),
            _ => Err(format!(
                "Unknown short batch policy: {}. Valid options: accept, retry, reject",
                s
            )),
        }
    }
}

impl std::fmt::Display for ShortBatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShortBatchPolicy::Accept => write!(f, "accept"),
            ShortBatchPolicy::Retry => write!(f, "retry"),
            ShortBatchPolicy::Reject => write!(f, "reject"),
        }
    }
}

/// Complete configuration for a generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct GenConfig {
    /// Total customer rows to load
    pub customers: usize,
    /// Customers generated and loaded per batch
    pub customer_batch: usize,
    /// Total order rows to load
    pub orders: usize,
    /// Orders generated and loaded per batch
    pub order_batch: usize,
    /// Seed for the random source
    pub seed: u64,
    /// Directory that receives the exported CSV files
    pub output_dir: PathBuf,
    /// Working DuckDB file (defaults to `<output_dir>/data.duckdb`)
    pub database_path: Option<PathBuf>,
    /// Date treated as "today" by the date generators (defaults to the local date)
    pub reference_date: Option<NaiveDate>,
    /// Behaviour when a relation ends up short of its target
    pub short_batch: ShortBatchPolicy,
    /// Consecutive zero-progress batches tolerated by the retry policy
    pub max_stalled_batches: usize,
    /// Probability that an order carries a coupon
    pub coupon_probability: f64,
    /// Leave the working database on disk after the run
    pub keep_database: bool,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            customers: DEFAULT_CUSTOMERS,
            customer_batch: DEFAULT_CUSTOMER_BATCH,
            orders: DEFAULT_ORDERS,
            order_batch: DEFAULT_ORDER_BATCH,
            seed: DEFAULT_SEED,
            output_dir: PathBuf::from("seeds"),
            database_path: None,
            reference_date: None,
            short_batch: ShortBatchPolicy::default(),
            max_stalled_batches: DEFAULT_MAX_STALLED_BATCHES,
            coupon_probability: DEFAULT_COUPON_PROBABILITY,
            keep_database: false,
        }
    }
}

impl GenConfig {
    /// Load configuration from a YAML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: GenConfig = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Check option combinations that would make the run meaningless
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.customer_batch == 0 {
            anyhow::bail!("customer_batch must be greater than 0");
        }
        if self.order_batch == 0 {
            anyhow::bail!("order_batch must be greater than 0");
        }
        if !(0.0..=1.0).contains(&self.coupon_probability) {
            anyhow::bail!(
                "coupon_probability must be between 0 and 1, got {}",
                self.coupon_probability
            );
        }
        if self.output_dir.as_os_str().is_empty() {
            anyhow::bail!("output_dir must not be empty");
        }
        if self.short_batch == ShortBatchPolicy::Retry && self.max_stalled_batches == 0 {
            anyhow::bail!("max_stalled_batches must be greater than 0 with the retry policy");
        }
        Ok(())
    }

    /// Path of the working DuckDB file
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join("data.duckdb"))
    }

    /// The date generators treat as "today"
    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

/// Command-line overrides applied on top of defaults or a YAML file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub customers: Option<usize>,
    pub customer_batch: Option<usize>,
    pub orders: Option<usize>,
    pub order_batch: Option<usize>,
    pub seed: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub reference_date: Option<NaiveDate>,
    pub short_batch: Option<ShortBatchPolicy>,
    pub keep_database: bool,
}

impl ConfigOverrides {
    pub fn apply(self, mut config: GenConfig) -> GenConfig {
        if let Some(n) = self.customers {
            config.customers = n;
        }
        if let Some(n) = self.customer_batch {
            config.customer_batch = n;
        }
        if let Some(n) = self.orders {
            config.orders = n;
        }
        if let Some(n) = self.order_batch {
            config.order_batch = n;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if self.database_path.is_some() {
            config.database_path = self.database_path;
        }
        if self.reference_date.is_some() {
            config.reference_date = self.reference_date;
        }
        if let Some(policy) = self.short_batch {
            config.short_batch = policy;
        }
        config.keep_database |= self.keep_database;
        config
    }
}
