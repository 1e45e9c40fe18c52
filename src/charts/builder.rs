//! Figure Builder Module
//! Turns the cleaned table and the current widget values into drawable figures.

use super::geography::{Geography, RegionShape};
use super::palette::{ColorScale, Rgb};
use crate::stats::YearlyAggregator;
use polars::prelude::*;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

/// Widget values for one interaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChartParams {
    pub year: i32,
    pub country: String,
    pub show_confidence: bool,
    pub show_moving_average: bool,
}

/// A region coloured by its mean temperature.
#[derive(Debug, Clone)]
pub struct ChoroplethRegion {
    pub shape: Arc<RegionShape>,
    pub value: f64,
    pub color: Rgb,
}

/// Map of mean temperature per country for one year.
#[derive(Debug, Clone)]
pub struct ChoroplethFigure {
    pub title: String,
    pub year: i32,
    pub regions: Vec<ChoroplethRegion>,
    /// Reference shapes with no value this year.
    pub no_data: Vec<Arc<RegionShape>>,
    /// Countries with a value but no matching shape.
    pub unmatched: Vec<(String, f64)>,
    pub scale: Option<ColorScale>,
}

impl ChoroplethFigure {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Name and value of the region under (lon, lat); the value is `None` for no-data shapes.
    ///
    /// When outlines overlap the smallest one wins, matching the draw order of the map.
    pub fn region_at(&self, lon: f64, lat: f64) -> Option<(&str, Option<f64>)> {
        self.regions
            .iter()
            .map(|r| (r.shape.as_ref(), Some(r.value)))
            .chain(self.no_data.iter().map(|s| (s.as_ref(), None)))
            .filter(|(shape, _)| shape.contains(lon, lat))
            .min_by(|a, b| a.0.area().total_cmp(&b.0.area()))
            .map(|(shape, value)| (shape.name.as_str(), value))
    }
}

/// Upper and lower bound of the confidence band for one year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPoint {
    pub year: i32,
    pub lower: f64,
    pub upper: f64,
}

/// Temperature trend for one country.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFigure {
    pub title: String,
    pub country: String,
    pub series: Vec<(i32, f64)>,
    /// Only the years where the trailing window is full.
    pub moving_average: Option<Vec<(i32, f64)>>,
    pub confidence_band: Option<Vec<BandPoint>>,
}

/// Builds map and trend figures.
pub struct FigureBuilder;

impl FigureBuilder {
    pub fn choropleth(
        df: &DataFrame,
        year: i32,
        geography: &Geography,
    ) -> PolarsResult<ChoroplethFigure> {
        let means = YearlyAggregator::means_for_year(df, year)?;
        let scale = ColorScale::from_values(means.iter().map(|(_, v)| *v));

        let matched: Vec<(Option<Arc<RegionShape>>, &str, f64)> = means
            .par_iter()
            .map(|(name, value)| (geography.lookup(name).cloned(), name.as_str(), *value))
            .collect();

        let mut regions = Vec::new();
        let mut unmatched = Vec::new();
        for (shape, name, value) in matched {
            match (shape, scale) {
                (Some(shape), Some(scale)) => regions.push(ChoroplethRegion {
                    shape,
                    value,
                    color: scale.color_for(value),
                }),
                _ => unmatched.push((name.to_string(), value)),
            }
        }

        let no_data = geography
            .regions()
            .iter()
            .filter(|shape| !regions.iter().any(|r| Arc::ptr_eq(&r.shape, shape)))
            .cloned()
            .collect();

        debug!(
            year,
            matched = regions.len(),
            unmatched = unmatched.len(),
            "built choropleth"
        );

        Ok(ChoroplethFigure {
            title: format!("Average Temperature in {year}"),
            year,
            regions,
            no_data,
            unmatched,
            scale,
        })
    }

    /// Trend line for `params.country`. The moving average needs both the toggle and a `window`.
    pub fn line_chart(
        df: &DataFrame,
        params: &ChartParams,
        window: Option<usize>,
    ) -> PolarsResult<LineFigure> {
        let window = window.filter(|_| params.show_moving_average);
        let series = YearlyAggregator::country_series(df, &params.country, window)?;

        let moving_average = window.map(|_| {
            series
                .points
                .iter()
                .filter_map(|p| Some((p.year, p.moving_average?)))
                .collect()
        });

        let confidence_band = params.show_confidence.then(|| {
            series
                .points
                .iter()
                .filter_map(|p| {
                    let uncertainty = p.uncertainty?;
                    Some(BandPoint {
                        year: p.year,
                        lower: p.mean - uncertainty,
                        upper: p.mean + uncertainty,
                    })
                })
                .collect()
        });

        Ok(LineFigure {
            title: format!("Temperature Trend for {}", params.country),
            country: params.country.clone(),
            series: series.points.iter().map(|p| (p.year, p.mean)).collect(),
            moving_average,
            confidence_band,
        })
    }
}
