//! Data Processor Module
//! Read-only queries over the cleaned temperature table.

use super::loader::{COUNTRY, YEAR};
use polars::prelude::*;

/// Overview shown in the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableSummary {
    pub rows: usize,
    pub countries: usize,
    pub years: Option<(i32, i32)>,
}

/// Handles filtering and lookups on the cleaned table.
pub struct DataProcessor;

impl DataProcessor {
    /// Distinct country names, sorted. These populate the country dropdown.
    pub fn get_countries(df: &DataFrame) -> Vec<String> {
        df.column(COUNTRY)
            .ok()
            .and_then(|col| col.unique().ok())
            .map(|unique| {
                let mut countries: Vec<String> = unique
                    .as_materialized_series()
                    .str()
                    .map(|ca| ca.into_iter().flatten().map(str::to_string).collect())
                    .unwrap_or_default();
                countries.sort();
                countries
            })
            .unwrap_or_default()
    }

    /// Smallest and largest year present, or `None` for an empty table.
    pub fn get_year_range(df: &DataFrame) -> Option<(i32, i32)> {
        let years = df.column(YEAR).ok()?.i32().ok()?;
        Some((years.min()?, years.max()?))
    }

    pub fn summarize(df: &DataFrame) -> TableSummary {
        TableSummary {
            rows: df.height(),
            countries: Self::get_countries(df).len(),
            years: Self::get_year_range(df),
        }
    }

    /// Rows for a single country.
    pub fn filter_by_country(df: &DataFrame, country: &str) -> PolarsResult<DataFrame> {
        df.clone()
            .lazy()
            .filter(col(COUNTRY).eq(lit(country)))
            .collect()
    }

    /// Rows for a single year.
    pub fn filter_by_year(df: &DataFrame, year: i32) -> PolarsResult<DataFrame> {
        df.clone().lazy().filter(col(YEAR).eq(lit(year))).collect()
    }
}
