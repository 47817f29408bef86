pub mod batch;
pub mod config;
pub mod export;
pub mod fake;
pub mod generator;
pub mod json_schema;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod store;
