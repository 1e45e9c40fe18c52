//! Geography Module
//! Reference set of country shapes the map matches region names against.

use geojson::{GeoJson, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Feature properties checked, in order, for the country name.
const NAME_PROPERTIES: [&str; 4] = ["name", "ADMIN", "admin", "NAME"];

/// Coarse admin-0 outlines named the way the temperature dataset spells countries.
const BUNDLED_GEOJSON: &str = include_str!("../../assets/world_countries.geojson");

#[derive(Error, Debug)]
pub enum GeographyError {
    #[error("Failed to open geography file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error("Expected a FeatureCollection")]
    NotACollection,
}

/// Closed ring of (longitude, latitude) points.
pub type Ring = Vec<[f64; 2]>;

/// One polygon part: an exterior ring minus its holes (enclaves, lakes).
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonRings {
    pub exterior: Ring,
    pub holes: Vec<Ring>,
}

impl PolygonRings {
    pub fn new(exterior: Ring) -> Self {
        Self {
            exterior,
            holes: Vec::new(),
        }
    }

    pub fn with_hole(mut self, hole: Ring) -> Self {
        self.holes.push(hole);
        self
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        ring_contains(&self.exterior, lon, lat)
            && !self.holes.iter().any(|hole| ring_contains(hole, lon, lat))
    }

    /// Planar area in square degrees, holes subtracted.
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|hole| ring_area(hole)).sum();
        (ring_area(&self.exterior) - holes).max(0.0)
    }
}

/// Outline of one named region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionShape {
    pub name: String,
    pub polygons: Vec<PolygonRings>,
}

impl RegionShape {
    pub fn new(name: impl Into<String>, polygons: Vec<PolygonRings>) -> Self {
        Self {
            name: name.into(),
            polygons,
        }
    }

    /// Even-odd test: inside some exterior and outside that part's holes.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.polygons.iter().any(|polygon| polygon.contains(lon, lat))
    }

    pub fn area(&self) -> f64 {
        self.polygons.iter().map(PolygonRings::area).sum()
    }
}

/// Named region outlines with exact and case-insensitive lookup.
#[derive(Debug, Default)]
pub struct Geography {
    regions: Vec<Arc<RegionShape>>,
    by_name: HashMap<String, usize>,
    by_lower_name: HashMap<String, usize>,
}

impl Geography {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, GeographyError> {
        let reader = BufReader::new(File::open(path)?);
        let geography = Self::from_geojson(GeoJson::from_reader(reader).map_err(geojson::Error::from)?)?;
        info!(
            path = %path.display(),
            regions = geography.len(),
            "loaded geography"
        );
        Ok(geography)
    }

    /// The outline set compiled into the binary.
    pub fn bundled() -> Result<Self, GeographyError> {
        Self::from_geojson(BUNDLED_GEOJSON.parse::<GeoJson>()?)
    }

    /// Load `path` when one is configured, falling back to the bundled outlines.
    ///
    /// Never fails: if even the bundled set cannot be parsed the map simply has
    /// no shapes and every region is reported unmatched.
    pub fn load_or_bundled(path: Option<&Path>) -> Self {
        if let Some(path) = path {
            match Self::load(path) {
                Ok(geography) => return geography,
                Err(e) => warn!(
                    path = %path.display(),
                    error = %e,
                    "geography file unusable, using bundled outlines"
                ),
            }
        }
        Self::bundled().unwrap_or_else(|e| {
            warn!(error = %e, "bundled geography is invalid, regions will be unmatched");
            Self::empty()
        })
    }

    pub fn from_geojson(geojson: GeoJson) -> Result<Self, GeographyError> {
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(GeographyError::NotACollection);
        };

        let shapes = collection.features.into_iter().filter_map(|feature| {
            let name = NAME_PROPERTIES
                .iter()
                .find_map(|key| feature.property(key).and_then(|v| v.as_str()))?
                .to_string();
            let polygons = match feature.geometry?.value {
                Value::Polygon(polygon) => to_polygon(&polygon).into_iter().collect(),
                Value::MultiPolygon(polygons) => {
                    polygons.iter().filter_map(|p| to_polygon(p)).collect()
                }
                _ => return None,
            };
            Some(RegionShape { name, polygons })
        });

        Ok(Self::from_shapes(shapes))
    }

    pub fn from_shapes(shapes: impl IntoIterator<Item = RegionShape>) -> Self {
        let mut geography = Self::empty();
        for shape in shapes {
            let idx = geography.regions.len();
            geography.by_name.entry(shape.name.clone()).or_insert(idx);
            geography
                .by_lower_name
                .entry(shape.name.to_lowercase())
                .or_insert(idx);
            geography.regions.push(Arc::new(shape));
        }
        geography
    }

    /// Find the shape for `name`, exact match first.
    pub fn lookup(&self, name: &str) -> Option<&Arc<RegionShape>> {
        self.by_name
            .get(name)
            .or_else(|| self.by_lower_name.get(&name.to_lowercase()))
            .map(|&idx| &self.regions[idx])
    }

    pub fn regions(&self) -> &[Arc<RegionShape>] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn ring_contains(ring: &[[f64; 2]], lon: f64, lat: f64) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for (i, &[xi, yi]) in ring.iter().enumerate() {
        let [xj, yj] = ring[j];
        if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

// Shoelace formula, orientation ignored.
fn ring_area(ring: &[[f64; 2]]) -> f64 {
    let twice: f64 = ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(&[x0, y0], &[x1, y1])| x0 * y1 - x1 * y0)
        .sum();
    twice.abs() / 2.0
}

fn to_ring(positions: &[Vec<f64>]) -> Ring {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| [p[0], p[1]])
        .collect()
}

/// First ring is the exterior, the rest are holes.
fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Option<PolygonRings> {
    let (exterior, holes) = rings.split_first()?;
    Some(PolygonRings {
        exterior: to_ring(exterior),
        holes: holes.iter().map(|hole| to_ring(hole)).collect(),
    })
}
