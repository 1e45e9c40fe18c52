//! Data module - CSV loading and table queries

pub mod loader;
mod processor;

pub use loader::{LoaderError, LoaderOptions, TemperatureLoader};
pub use processor::{DataProcessor, TableSummary};
