//! Configuration Module
//! Dashboard variant selection and file locations.

use crate::data::LoaderOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Default location of the optional configuration file.
pub const CONFIG_FILE: &str = "temperature_atlas.json";

/// Year before which measurements are discarded in cutoff-aware variants.
pub const DEFAULT_CUTOFF_YEAR: i32 = 1900;

/// Trailing window of the moving average, in yearly rows.
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 20;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Moving average window must be at least 1")]
    ZeroWindow,
    #[error("Config field `{0}` must not be empty")]
    EmptyField(&'static str),
}

/// The four iterations of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardVariant {
    /// Map and trend line only, every year kept
    Basic,
    /// Same as `Basic`, measurements before the cutoff dropped
    Cutoff,
    /// Adds the confidence band toggle
    Confidence,
    /// Adds the moving average toggle
    Full,
}

impl Default for DashboardVariant {
    fn default() -> Self {
        DashboardVariant::Full
    }
}

impl DashboardVariant {
    pub fn default_cutoff(self) -> Option<i32> {
        match self {
            DashboardVariant::Basic => None,
            _ => Some(DEFAULT_CUTOFF_YEAR),
        }
    }

    pub fn requires_uncertainty(self) -> bool {
        matches!(self, DashboardVariant::Confidence | DashboardVariant::Full)
    }

    pub fn supports_confidence(self) -> bool {
        self.requires_uncertainty()
    }

    pub fn supports_moving_average(self) -> bool {
        self == DashboardVariant::Full
    }

    pub fn label(self) -> &'static str {
        match self {
            DashboardVariant::Basic => "Basic",
            DashboardVariant::Cutoff => "Since 1900",
            DashboardVariant::Confidence => "Confidence band",
            DashboardVariant::Full => "Full",
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub data_path: PathBuf,
    /// External GeoJSON replacing the bundled outlines.
    pub geography_path: Option<PathBuf>,
    pub variant: DashboardVariant,
    pub region_column: String,
    /// Overrides the variant's cutoff when set.
    pub cutoff_year: Option<i32>,
    pub moving_average_window: usize,
    pub export_dir: PathBuf,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("GlobalLandTemperaturesByCountry.csv"),
            geography_path: None,
            variant: DashboardVariant::default(),
            region_column: "Country".to_string(),
            cutoff_year: None,
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
            export_dir: PathBuf::from("exports"),
        }
    }
}

impl AtlasConfig {
    /// Read the config file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AtlasConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;

        info!(path = %path.display(), variant = ?config.variant, "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.moving_average_window == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.data_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyField("data_path"));
        }
        if self.region_column.trim().is_empty() {
            return Err(ConfigError::EmptyField("region_column"));
        }
        if self
            .geography_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(ConfigError::EmptyField("geography_path"));
        }
        if self.export_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyField("export_dir"));
        }
        Ok(())
    }

    pub fn effective_cutoff(&self) -> Option<i32> {
        self.cutoff_year.or_else(|| self.variant.default_cutoff())
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            region_column: self.region_column.clone(),
            cutoff_year: self.effective_cutoff(),
            require_uncertainty: self.variant.requires_uncertainty(),
        }
    }

    /// Window to compute when the moving average toggle is available.
    pub fn moving_average_window(&self) -> Option<usize> {
        self.variant
            .supports_moving_average()
            .then_some(self.moving_average_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AtlasConfig::load_or_default(dir.path().join("nope.json")).unwrap();
        assert_eq!(config, AtlasConfig::default());
        assert_eq!(config.effective_cutoff(), Some(1900));
        assert_eq!(config.moving_average_window(), Some(20));
    }

    #[test]
    fn partial_file_overrides_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"variant": "basic", "region_column": "Region"}}"#).unwrap();

        let config = AtlasConfig::load_or_default(file.path()).unwrap();
        assert_eq!(config.variant, DashboardVariant::Basic);
        assert_eq!(config.region_column, "Region");
        assert_eq!(config.effective_cutoff(), None);
        assert_eq!(config.moving_average_window(), None);

        let options = config.loader_options();
        assert!(!options.require_uncertainty);
        assert_eq!(options.cutoff_year, None);
    }

    #[test]
    fn explicit_cutoff_wins_over_variant() {
        let config = AtlasConfig {
            variant: DashboardVariant::Basic,
            cutoff_year: Some(1950),
            ..Default::default()
        };
        assert_eq!(config.loader_options().cutoff_year, Some(1950));
    }

    #[test]
    fn zero_window_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"moving_average_window": 0}}"#).unwrap();

        let err = AtlasConfig::load_or_default(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroWindow));
    }

    #[test]
    fn empty_paths_are_rejected() {
        let config = AtlasConfig {
            geography_path: Some(PathBuf::new()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyField("geography_path"))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"export_dir": ""}}"#).unwrap();
        let err = AtlasConfig::load_or_default(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyField("export_dir")));
    }

    #[test]
    fn geography_path_is_optional() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"geography_path": "maps/world.geojson"}}"#).unwrap();

        let config = AtlasConfig::load_or_default(file.path()).unwrap();
        assert_eq!(config.geography_path, Some(PathBuf::from("maps/world.geojson")));
        assert_eq!(AtlasConfig::default().geography_path, None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = AtlasConfig::load_or_default(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn variant_capabilities() {
        assert!(!DashboardVariant::Cutoff.supports_confidence());
        assert!(DashboardVariant::Confidence.supports_confidence());
        assert!(!DashboardVariant::Confidence.supports_moving_average());
        assert!(DashboardVariant::Full.supports_moving_average());
    }
}
