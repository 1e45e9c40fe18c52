//! Temperature Loader Module
//! Reads the land temperature CSV and produces the cleaned table using Polars.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

pub const COUNTRY: &str = "Country";
pub const DATE: &str = "dt";
pub const YEAR: &str = "year";
pub const AVERAGE_TEMPERATURE: &str = "AverageTemperature";
pub const UNCERTAINTY: &str = "AverageTemperatureUncertainty";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Data file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Missing column `{0}`")]
    MissingColumn(String),
    #[error("No data loaded")]
    NoData,
}

/// Cleaning rules applied while loading.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoaderOptions {
    /// Header of the region column, renamed to `Country`.
    pub region_column: String,
    pub cutoff_year: Option<i32>,
    pub require_uncertainty: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            region_column: COUNTRY.to_string(),
            cutoff_year: None,
            require_uncertainty: false,
        }
    }
}

/// Holds the cleaned table for the current input file.
pub struct TemperatureLoader {
    df: Option<Arc<DataFrame>>,
    file_path: Option<PathBuf>,
    options: LoaderOptions,
}

impl TemperatureLoader {
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            df: None,
            file_path: None,
            options,
        }
    }

    /// Load `file_path` unless the same file is already loaded.
    pub fn load(&mut self, file_path: &Path) -> Result<Arc<DataFrame>, LoaderError> {
        if let (Some(df), Some(current)) = (&self.df, &self.file_path) {
            if current == file_path {
                return Ok(Arc::clone(df));
            }
        }
        self.reload(file_path)
    }

    /// Always re-read `file_path`. The previous table is kept on failure.
    pub fn reload(&mut self, file_path: &Path) -> Result<Arc<DataFrame>, LoaderError> {
        let df = Arc::new(Self::read_cleaned(file_path, &self.options)?);
        self.df = Some(Arc::clone(&df));
        self.file_path = Some(file_path.to_path_buf());
        Ok(df)
    }

    pub fn get_dataframe(&self) -> Result<Arc<DataFrame>, LoaderError> {
        self.df.clone().ok_or(LoaderError::NoData)
    }

    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }

    /// Read and clean a CSV file.
    ///
    /// Output columns: [Country, dt, year, AverageTemperature, AverageTemperatureUncertainty]
    pub fn read_cleaned(file_path: &Path, options: &LoaderOptions) -> Result<DataFrame, LoaderError> {
        if !file_path.is_file() {
            return Err(LoaderError::NotFound(file_path.to_path_buf()));
        }

        // Every column as text; numeric parsing happens per row below
        let raw = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        let cleaned = Self::clean(&raw, options)?;
        info!(
            path = %file_path.display(),
            rows = cleaned.height(),
            dropped = raw.height() - cleaned.height(),
            "loaded temperature data"
        );
        Ok(cleaned)
    }

    /// Apply date parsing, missing-value filtering and the year cutoff to a raw text frame.
    pub fn clean(raw: &DataFrame, options: &LoaderOptions) -> Result<DataFrame, LoaderError> {
        let region = Self::text_column(raw, &options.region_column)?;
        let dates = Self::text_column(raw, DATE)?;
        let temps = Self::text_column(raw, AVERAGE_TEMPERATURE)?;
        let uncertainty = match Self::text_column(raw, UNCERTAINTY) {
            Ok(ca) => Some(ca),
            Err(LoaderError::MissingColumn(_)) if !options.require_uncertainty => None,
            Err(e) => return Err(e),
        };

        let mut countries: Vec<String> = Vec::new();
        let mut days: Vec<NaiveDate> = Vec::new();
        let mut years: Vec<i32> = Vec::new();
        let mut averages: Vec<f64> = Vec::new();
        let mut uncertainties: Vec<Option<f64>> = Vec::new();

        for i in 0..raw.height() {
            let (Some(name), Some(date), Some(avg)) = (
                region.get(i).map(str::trim).filter(|s| !s.is_empty()),
                dates.get(i).and_then(parse_date),
                temps.get(i).and_then(parse_measurement),
            ) else {
                continue;
            };
            let unc = uncertainty
                .and_then(|ca| ca.get(i))
                .and_then(parse_measurement);
            if options.require_uncertainty && unc.is_none() {
                continue;
            }

            countries.push(name.to_string());
            days.push(date);
            years.push(date.year());
            averages.push(avg);
            uncertainties.push(unc);
        }

        debug!(
            kept = countries.len(),
            total = raw.height(),
            "filtered incomplete rows"
        );

        let df = DataFrame::new(vec![
            Column::new(COUNTRY.into(), countries),
            Column::new(DATE.into(), days),
            Column::new(YEAR.into(), years),
            Column::new(AVERAGE_TEMPERATURE.into(), averages),
            Column::new(UNCERTAINTY.into(), uncertainties),
        ])?;

        match options.cutoff_year {
            Some(cutoff) => Ok(df
                .lazy()
                .filter(col(YEAR).gt_eq(lit(cutoff)))
                .collect()?),
            None => Ok(df),
        }
    }

    fn text_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked, LoaderError> {
        let column = df
            .column(name)
            .map_err(|_| LoaderError::MissingColumn(name.to_string()))?;
        Ok(column.as_materialized_series().str()?)
    }
}

/// Parse an ISO date, tolerating a trailing time component.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_measurement(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_frame(rows: &[(&str, &str, &str, &str)]) -> DataFrame {
        let dates: Vec<&str> = rows.iter().map(|r| r.0).collect();
        let temps: Vec<&str> = rows.iter().map(|r| r.1).collect();
        let unc: Vec<&str> = rows.iter().map(|r| r.2).collect();
        let countries: Vec<&str> = rows.iter().map(|r| r.3).collect();
        DataFrame::new(vec![
            Column::new(DATE.into(), dates),
            Column::new(AVERAGE_TEMPERATURE.into(), temps),
            Column::new(UNCERTAINTY.into(), unc),
            Column::new(COUNTRY.into(), countries),
        ])
        .unwrap()
    }

    #[test]
    fn parses_dates() {
        assert_eq!(parse_date("1743-11-01"), NaiveDate::from_ymd_opt(1743, 11, 1));
        assert_eq!(
            parse_date("1850-02-01 00:00:00"),
            NaiveDate::from_ymd_opt(1850, 2, 1)
        );
        assert_eq!(parse_date("02/01/1850"), None);
        assert_eq!(parse_date("1850-13-01"), None);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn drops_rows_missing_temperature() {
        let raw = raw_frame(&[
            ("1890-01-01", "", "", "Aland"),
            ("1890-02-01", "-3.5", "", "Aland"),
            ("bad-date", "1.0", "0.2", "Aland"),
            ("04/01/1890", "2.0", "0.2", "Aland"),
            ("1890-03-01", "NaN", "0.2", "Aland"),
        ]);
        let df = TemperatureLoader::clean(&raw, &LoaderOptions::default()).unwrap();

        assert_eq!(df.height(), 1);
        let temps = df.column(AVERAGE_TEMPERATURE).unwrap().f64().unwrap();
        assert_eq!(temps.null_count(), 0);
        assert_eq!(temps.get(0), Some(-3.5));
        let unc = df.column(UNCERTAINTY).unwrap().f64().unwrap();
        assert_eq!(unc.get(0), None);
    }

    #[test]
    fn required_uncertainty_and_cutoff() {
        let raw = raw_frame(&[
            ("1899-12-01", "4.0", "0.3", "Aland"),
            ("1900-01-01", "5.0", "", "Aland"),
            ("1900-02-01", "6.0", "0.4", "Aland"),
        ]);
        let options = LoaderOptions {
            cutoff_year: Some(1900),
            require_uncertainty: true,
            ..Default::default()
        };
        let df = TemperatureLoader::clean(&raw, &options).unwrap();

        assert_eq!(df.height(), 1);
        let years = df.column(YEAR).unwrap().i32().unwrap();
        assert!(years.into_iter().all(|y| y.is_some_and(|y| y >= 1900)));
        assert_eq!(df.column(UNCERTAINTY).unwrap().null_count(), 0);
    }

    #[test]
    fn renames_region_column() {
        let raw = DataFrame::new(vec![
            Column::new("Region".into(), ["Oz"]),
            Column::new(DATE.into(), ["1950-06-01"]),
            Column::new(AVERAGE_TEMPERATURE.into(), ["21.5"]),
        ])
        .unwrap();
        let options = LoaderOptions {
            region_column: "Region".to_string(),
            ..Default::default()
        };
        let df = TemperatureLoader::clean(&raw, &options).unwrap();
        let country = df.column(COUNTRY).unwrap().str().unwrap();
        assert_eq!(country.get(0), Some("Oz"));
    }

    #[test]
    fn missing_uncertainty_column_only_fails_when_required() {
        let raw = DataFrame::new(vec![
            Column::new(COUNTRY.into(), ["Oz"]),
            Column::new(DATE.into(), ["1950-06-01"]),
            Column::new(AVERAGE_TEMPERATURE.into(), ["21.5"]),
        ])
        .unwrap();

        assert!(TemperatureLoader::clean(&raw, &LoaderOptions::default()).is_ok());

        let strict = LoaderOptions {
            require_uncertainty: true,
            ..Default::default()
        };
        let err = TemperatureLoader::clean(&raw, &strict).unwrap_err();
        assert!(matches!(err, LoaderError::MissingColumn(c) if c == UNCERTAINTY));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = TemperatureLoader::read_cleaned(
            Path::new("definitely/not/here.csv"),
            &LoaderOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
    }
}
