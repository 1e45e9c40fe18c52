//! Yearly Aggregator Module
//! Groups the cleaned table by (country, year) and computes moving averages.

use crate::data::loader::{AVERAGE_TEMPERATURE, COUNTRY, UNCERTAINTY, YEAR};
use crate::data::DataProcessor;
use polars::prelude::*;
use statrs::statistics::Statistics;

/// One year of one country's series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearlyPoint {
    pub year: i32,
    pub mean: f64,
    pub uncertainty: Option<f64>,
    pub moving_average: Option<f64>,
}

/// Yearly means for a single country, ordered by year ascending.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct YearlySeries {
    pub country: String,
    pub points: Vec<YearlyPoint>,
}

/// Handles grouping and rolling statistics.
pub struct YearlyAggregator;

impl YearlyAggregator {
    /// Mean temperature and uncertainty per (country, year).
    ///
    /// Output columns: [Country, year, AverageTemperature, AverageTemperatureUncertainty]
    pub fn yearly_means(df: &DataFrame) -> PolarsResult<DataFrame> {
        df.clone()
            .lazy()
            .group_by([col(COUNTRY), col(YEAR)])
            .agg([col(AVERAGE_TEMPERATURE).mean(), col(UNCERTAINTY).mean()])
            .sort_by_exprs([col(COUNTRY), col(YEAR)], SortMultipleOptions::default())
            .collect()
    }

    /// Year-ordered series for one country, with a trailing moving average when `window` is set.
    pub fn country_series(
        df: &DataFrame,
        country: &str,
        window: Option<usize>,
    ) -> PolarsResult<YearlySeries> {
        let rows = DataProcessor::filter_by_country(df, country)?;
        let grouped = Self::yearly_means(&rows)?;

        let years = grouped.column(YEAR)?.i32()?;
        let means = grouped.column(AVERAGE_TEMPERATURE)?.f64()?;
        let uncertainties = grouped.column(UNCERTAINTY)?.f64()?;

        let mut points: Vec<YearlyPoint> = years
            .into_iter()
            .zip(means)
            .zip(uncertainties)
            .filter_map(|((year, mean), uncertainty)| {
                Some(YearlyPoint {
                    year: year?,
                    mean: mean?,
                    uncertainty,
                    moving_average: None,
                })
            })
            .collect();

        if let Some(window) = window {
            let values: Vec<f64> = points.iter().map(|p| p.mean).collect();
            for (point, avg) in points.iter_mut().zip(Self::rolling_mean(&values, window)) {
                point.moving_average = avg;
            }
        }

        Ok(YearlySeries {
            country: country.to_string(),
            points,
        })
    }

    /// Trailing mean over `window` positions; `None` until a full window is available.
    pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
        if window == 0 {
            return vec![None; values.len()];
        }
        (0..values.len())
            .map(|i| {
                (i + 1 >= window).then(|| values[i + 1 - window..=i].iter().mean())
            })
            .collect()
    }

    /// Mean temperature per country for one year, sorted by country.
    pub fn means_for_year(df: &DataFrame, year: i32) -> PolarsResult<Vec<(String, f64)>> {
        let rows = DataProcessor::filter_by_year(df, year)?;
        let grouped = Self::yearly_means(&rows)?;

        let countries = grouped.column(COUNTRY)?.str()?;
        let means = grouped.column(AVERAGE_TEMPERATURE)?.f64()?;

        Ok(countries
            .into_iter()
            .zip(means)
            .filter_map(|(country, mean)| Some((country?.to_string(), mean?)))
            .collect())
    }
}
