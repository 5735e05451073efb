//! Validation engine: execution, aggregation, caching, statistics

pub mod cache;
pub mod runner;
pub mod scorer;
pub mod stats;

pub use cache::{TtlCache, DEFAULT_TTL};
pub use runner::{CancellationToken, RunOptions, ValidationEngine};
pub use scorer::{CategoryScore, ValidationSummary};
pub use stats::RegistryStatistics;
