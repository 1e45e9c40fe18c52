//! Stats module - yearly aggregation

mod aggregator;

pub use aggregator::{YearlyAggregator, YearlyPoint, YearlySeries};
