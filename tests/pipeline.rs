//! End-to-end tests: CSV file → cleaned table → figures.

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use temperature_atlas::cache::FigureCache;
use temperature_atlas::charts::{ChartParams, FigureBuilder, Geography, PolygonRings, RegionShape};
use temperature_atlas::config::{AtlasConfig, DashboardVariant};
use temperature_atlas::data::{DataProcessor, LoaderError, TemperatureLoader};

const HEADER: &str = "dt,AverageTemperature,AverageTemperatureUncertainty,Country";

fn write_csv(rows: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file
}

/// Monthly rows for Testland 1905..=1925, constant 10.0 ± 0.5, plus some noise rows.
fn testland_csv() -> NamedTempFile {
    let mut rows = Vec::new();
    for year in 1905..=1925 {
        for month in [1, 7] {
            rows.push(format!("{year}-{month:02}-01,10.0,0.5,Testland"));
        }
    }
    rows.push("1850-01-01,3.0,1.2,Testland".to_string());
    rows.push("1910-03-01,,,Testland".to_string());
    rows.push("1910-04-01,9.0,,Testland".to_string());
    rows.push("1910-01-01,25.0,0.3,Atlantis".to_string());
    write_csv(&rows)
}

fn load(file: &Path, variant: DashboardVariant) -> TemperatureLoader {
    let config = AtlasConfig {
        variant,
        ..Default::default()
    };
    let mut loader = TemperatureLoader::new(config.loader_options());
    loader.load(file).unwrap();
    loader
}

fn testland_shape() -> RegionShape {
    RegionShape::new(
        "Testland",
        vec![PolygonRings::new(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]])],
    )
}

#[test]
fn full_variant_moving_average_example() {
    let file = testland_csv();
    let loader = load(file.path(), DashboardVariant::Full);
    let df = loader.get_dataframe().unwrap();

    // 1850 row is before the cutoff, two rows lack measurements
    assert_eq!(df.height(), 21 * 2 + 1);
    assert_eq!(DataProcessor::get_year_range(&df), Some((1905, 1925)));
    assert_eq!(DataProcessor::get_countries(&df), vec!["Atlantis", "Testland"]);

    let params = ChartParams {
        year: 1910,
        country: "Testland".to_string(),
        show_confidence: true,
        show_moving_average: true,
    };
    let figure = FigureBuilder::line_chart(&df, &params, Some(20)).unwrap();

    assert_eq!(figure.series.len(), 21);
    assert_eq!(figure.moving_average, Some(vec![(1924, 10.0), (1925, 10.0)]));
    for point in figure.confidence_band.unwrap() {
        assert!((point.upper - point.lower - 2.0 * 0.5).abs() < 1e-12);
    }
}

#[test]
fn basic_variant_keeps_everything_with_a_temperature() {
    let file = testland_csv();
    let loader = load(file.path(), DashboardVariant::Basic);
    let df = loader.get_dataframe().unwrap();

    // cutoff off and uncertainty optional: 1850 and the row without uncertainty stay
    assert_eq!(df.height(), 21 * 2 + 3);
    assert_eq!(DataProcessor::get_year_range(&df), Some((1850, 1925)));
    let temps = df.column("AverageTemperature").unwrap();
    assert_eq!(temps.null_count(), 0);
}

#[test]
fn cutoff_variant_drops_early_years() {
    let file = testland_csv();
    let loader = load(file.path(), DashboardVariant::Cutoff);
    let df = loader.get_dataframe().unwrap();

    let years = df.column("year").unwrap().i32().unwrap();
    assert!(years.into_iter().flatten().all(|y| y >= 1900));
}

#[test]
fn choropleth_for_missing_year_has_no_colour() {
    let file = testland_csv();
    let loader = load(file.path(), DashboardVariant::Full);
    let df = loader.get_dataframe().unwrap();
    let geography = Geography::from_shapes([testland_shape()]);

    let empty = FigureBuilder::choropleth(&df, 1950, &geography).unwrap();
    assert!(empty.is_empty());

    let map = FigureBuilder::choropleth(&df, 1910, &geography).unwrap();
    assert_eq!(map.regions.len(), 1);
    assert_eq!(map.regions[0].value, 10.0);
    // no shape for Atlantis: kept aside, not an error
    assert_eq!(map.unmatched, vec![("Atlantis".to_string(), 25.0)]);
}

#[test]
fn reload_picks_up_changes_and_cache_is_reset() {
    let mut file = write_csv(&["1950-01-01,1.0,0.1,Chile".to_string()]);
    let mut loader = load(file.path(), DashboardVariant::Full);
    let mut cache = FigureCache::new();
    let params = ChartParams {
        year: 1950,
        country: "Chile".to_string(),
        show_confidence: false,
        show_moving_average: false,
    };

    let df = loader.get_dataframe().unwrap();
    let before = cache
        .get_or_build_line(&params, || FigureBuilder::line_chart(&df, &params, None))
        .unwrap();
    assert_eq!(before.series, vec![(1950, 1.0)]);

    writeln!(file, "1951-01-01,2.0,0.1,Chile").unwrap();
    file.flush().unwrap();

    // same path: load keeps the held table, reload reads the file again
    assert_eq!(loader.load(file.path()).unwrap().height(), 1);
    let df = loader.reload(file.path()).unwrap();
    cache.invalidate();

    let after = cache
        .get_or_build_line(&params, || FigureBuilder::line_chart(&df, &params, None))
        .unwrap();
    assert_eq!(after.series, vec![(1950, 1.0), (1951, 2.0)]);
}

#[test]
fn missing_input_is_fatal() {
    let mut loader = TemperatureLoader::new(AtlasConfig::default().loader_options());
    let err = loader
        .load(Path::new("GlobalLandTemperaturesByCountry.does-not-exist.csv"))
        .unwrap_err();
    assert!(matches!(err, LoaderError::NotFound(_)));
    assert!(loader.get_dataframe().is_err());
}

#[test]
fn default_config_maps_onto_bundled_outlines() {
    let file = write_csv(&[
        "1950-01-01,8.0,0.2,Chile".to_string(),
        "1950-07-01,10.0,0.2,Chile".to_string(),
        "1950-01-01,17.0,0.3,South Africa".to_string(),
        "1950-01-01,11.0,0.4,Lesotho".to_string(),
    ]);
    let config = AtlasConfig::default();
    let loader = load(file.path(), config.variant);
    let df = loader.get_dataframe().unwrap();
    let geography = Geography::load_or_bundled(config.geography_path.as_deref());

    let map = FigureBuilder::choropleth(&df, 1950, &geography).unwrap();
    assert_eq!(map.regions.len(), 3);
    assert!(map.unmatched.is_empty());
    assert_eq!(map.region_at(-70.6, -33.4), Some(("Chile", Some(9.0))));
    assert_eq!(map.region_at(28.2, -29.7), Some(("Lesotho", Some(11.0))));
}
