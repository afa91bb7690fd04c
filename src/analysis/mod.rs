//! Metric computation over loaded test records.

pub mod aggregator;

pub use aggregator::*;
