//! Windowed aggregates (MIN, MAX, FIRST, LAST, AVERAGE, TOTAL) and 95th
//! percentiles of fixed-step time series.

pub mod aggregator;
pub mod config;
pub mod data;
pub mod manager;
pub mod report;
pub mod sample;

pub use aggregator::{AggregateKind, Aggregates, Aggregator};
pub use sample::Sample;
