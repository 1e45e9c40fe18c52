//! Charts module - figure construction and rendering

mod builder;
pub mod geography;
pub mod palette;
mod plotter;
mod renderer;

pub use builder::{BandPoint, ChartParams, ChoroplethFigure, ChoroplethRegion, FigureBuilder, LineFigure};
pub use geography::{Geography, GeographyError, PolygonRings, RegionShape};
pub use plotter::ChartPlotter;
pub use renderer::{RenderError, StaticChartRenderer, LAT_RANGE, LON_RANGE};
