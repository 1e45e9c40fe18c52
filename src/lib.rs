//! Temperature Atlas - historical land temperature map and trend viewer
//!
//! Loads a country-level temperature CSV, aggregates it per year and shows a
//! choropleth for a chosen year next to a trend chart for a chosen country.

pub mod cache;
pub mod charts;
pub mod config;
pub mod data;
pub mod gui;
pub mod stats;
