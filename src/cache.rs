//! Figure cache keyed by the widget values that produced each figure.
//!
//! Entries are only dropped by [`FigureCache::invalidate`], which the app calls after
//! the input file is reloaded. A miss rebuilds the same figure from the same table.

use crate::charts::{ChartParams, ChoroplethFigure, LineFigure};
use moka::sync::Cache;
use std::sync::Arc;
use tracing::debug;

const MAX_LINE_FIGURES: u64 = 512;
const MAX_MAP_FIGURES: u64 = 512;

/// Inputs that change the trend figure. The selected year does not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub country: String,
    pub show_confidence: bool,
    pub show_moving_average: bool,
}

impl From<&ChartParams> for LineKey {
    fn from(params: &ChartParams) -> Self {
        Self {
            country: params.country.clone(),
            show_confidence: params.show_confidence,
            show_moving_average: params.show_moving_average,
        }
    }
}

pub struct FigureCache {
    lines: Cache<LineKey, Arc<LineFigure>>,
    maps: Cache<i32, Arc<ChoroplethFigure>>,
    generation: u64,
}

impl Default for FigureCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FigureCache {
    pub fn new() -> Self {
        Self {
            lines: Cache::new(MAX_LINE_FIGURES),
            maps: Cache::new(MAX_MAP_FIGURES),
            generation: 0,
        }
    }

    pub fn get_or_build_line<E>(
        &self,
        params: &ChartParams,
        build: impl FnOnce() -> Result<LineFigure, E>,
    ) -> Result<Arc<LineFigure>, E> {
        let key = LineKey::from(params);
        if let Some(figure) = self.lines.get(&key) {
            return Ok(figure);
        }
        debug!(country = %key.country, "line figure cache miss");
        let figure = Arc::new(build()?);
        self.lines.insert(key, Arc::clone(&figure));
        Ok(figure)
    }

    pub fn get_or_build_map<E>(
        &self,
        year: i32,
        build: impl FnOnce() -> Result<ChoroplethFigure, E>,
    ) -> Result<Arc<ChoroplethFigure>, E> {
        if let Some(figure) = self.maps.get(&year) {
            return Ok(figure);
        }
        debug!(year, "map figure cache miss");
        let figure = Arc::new(build()?);
        self.maps.insert(year, Arc::clone(&figure));
        Ok(figure)
    }

    /// Drop every cached figure.
    pub fn invalidate(&mut self) {
        self.lines.invalidate_all();
        self.maps.invalidate_all();
        self.generation += 1;
        debug!(generation = self.generation, "figure cache invalidated");
    }

    /// Number of invalidations so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::convert::Infallible;

    fn params(country: &str) -> ChartParams {
        ChartParams {
            year: 2000,
            country: country.to_string(),
            show_confidence: false,
            show_moving_average: false,
        }
    }

    fn figure(country: &str) -> LineFigure {
        LineFigure {
            title: format!("Temperature Trend for {country}"),
            country: country.to_string(),
            series: vec![(2000, 1.0)],
            moving_average: None,
            confidence_band: None,
        }
    }

    #[test]
    fn same_key_builds_once() {
        let cache = FigureCache::new();
        let builds = Cell::new(0);
        let build = || {
            builds.set(builds.get() + 1);
            Ok::<_, Infallible>(figure("Laos"))
        };

        let first = cache.get_or_build_line(&params("Laos"), build).unwrap();
        let mut other_year = params("Laos");
        other_year.year = 1990;
        let second = cache.get_or_build_line(&other_year, build).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.get(), 1);
    }

    #[test]
    fn toggles_are_part_of_the_key() {
        let cache = FigureCache::new();
        let first = cache
            .get_or_build_line(&params("Laos"), || Ok::<_, Infallible>(figure("Laos")))
            .unwrap();
        let mut toggled = params("Laos");
        toggled.show_confidence = true;
        let second = cache
            .get_or_build_line(&toggled, || Ok::<_, Infallible>(figure("Laos")))
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn invalidate_forces_rebuild() {
        let mut cache = FigureCache::new();
        let first = cache
            .get_or_build_line(&params("Laos"), || Ok::<_, Infallible>(figure("Laos")))
            .unwrap();
        cache.invalidate();
        let second = cache
            .get_or_build_line(&params("Laos"), || Ok::<_, Infallible>(figure("Laos")))
            .unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
        assert_eq!(cache.generation(), 1);
    }

    #[test]
    fn failed_build_is_not_cached() {
        let cache = FigureCache::new();
        let err = cache.get_or_build_map(1950, || Err::<ChoroplethFigure, _>("boom"));
        assert_eq!(err.unwrap_err(), "boom");
        assert!(cache.maps.get(&1950).is_none());
    }
}
