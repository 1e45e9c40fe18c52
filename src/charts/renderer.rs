//! Static Chart Renderer
//! Draws the map and trend figures with plotters, either into an RGB buffer for the
//! map panel or into PNG files for export.
//!
//! Export layout:
//! - Map: caption, equirectangular map, colour bar on the right
//! - Trend: caption, confidence band, mean line, moving average line

use super::builder::{ChoroplethFigure, LineFigure};
use super::geography::{RegionShape, Ring};
use super::palette::{plasma, Rgb, NO_DATA};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub const LON_RANGE: (f64, f64) = (-180.0, 180.0);
pub const LAT_RANGE: (f64, f64) = (-90.0, 90.0);

const OCEAN: RGBColor = RGBColor(255, 255, 255);
const OUTLINE: RGBColor = RGBColor(120, 120, 120);
const LINE_BLUE: RGBColor = RGBColor(99, 110, 250);
const MA_ORANGE: RGBColor = RGBColor(239, 85, 59);
const COLORBAR_STEPS: usize = 64;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Failed to create export directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image size must be non-zero")]
    EmptySize,
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render only the map area, lon/lat spanning the full buffer. Returns RGB bytes.
    pub fn render_choropleth_rgb(
        figure: &ChoroplethFigure,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptySize);
        }
        let mut buffer = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&OCEAN).map_err(draw_err)?;
            Self::draw_map(&root, figure)?;
            root.present().map_err(draw_err)?;
        }
        Ok(buffer)
    }

    /// Export the map with caption and colour bar as a PNG.
    pub fn render_choropleth(
        figure: &ChoroplethFigure,
        path: &Path,
        (width, height): (u32, u32),
    ) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptySize);
        }
        Self::ensure_parent(path)?;

        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let root = root
            .titled(&figure.title, ("sans-serif", 28))
            .map_err(draw_err)?;
        let (map_area, bar_area) = root.split_horizontally(width.saturating_sub(110));

        Self::draw_map(&map_area, figure)?;

        if let Some(scale) = figure.scale {
            let mut bar = ChartBuilder::on(&bar_area)
                .margin(20)
                .x_label_area_size(0)
                .y_label_area_size(50)
                .build_cartesian_2d(0.0..1.0, scale.min..scale.max.max(scale.min + f64::EPSILON))
                .map_err(draw_err)?;
            bar.configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .disable_x_axis()
                .y_desc("°C")
                .draw()
                .map_err(draw_err)?;

            let step = (scale.max - scale.min) / COLORBAR_STEPS as f64;
            bar.draw_series((0..COLORBAR_STEPS).map(|i| {
                let lo = scale.min + step * i as f64;
                let color = plasma(i as f64 / (COLORBAR_STEPS - 1) as f64);
                Rectangle::new([(0.0, lo), (1.0, lo + step)], rgb(color).filled())
            }))
            .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
        info!(path = %path.display(), year = figure.year, "exported map");
        Ok(())
    }

    /// Export the trend chart as a PNG.
    pub fn render_line_chart(
        figure: &LineFigure,
        path: &Path,
        (width, height): (u32, u32),
    ) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptySize);
        }
        Self::ensure_parent(path)?;

        let (x_min, x_max) = Self::get_x_range(figure);
        let (y_min, y_max) = Self::get_y_range(figure);

        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&figure.title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc("year")
            .y_desc("AverageTemperature")
            .draw()
            .map_err(draw_err)?;

        if let Some(band) = &figure.confidence_band {
            let fill = LINE_BLUE.mix(0.2);
            chart
                .draw_series(band.windows(2).map(|pair| {
                    let (a, b) = (pair[0], pair[1]);
                    Polygon::new(
                        vec![
                            (a.year, a.upper),
                            (b.year, b.upper),
                            (b.year, b.lower),
                            (a.year, a.lower),
                        ],
                        fill.filled(),
                    )
                }))
                .map_err(draw_err)?;
            for bound in [
                band.iter().map(|p| (p.year, p.upper)).collect::<Vec<_>>(),
                band.iter().map(|p| (p.year, p.lower)).collect::<Vec<_>>(),
            ] {
                chart
                    .draw_series(LineSeries::new(bound, LINE_BLUE.mix(0.4)))
                    .map_err(draw_err)?;
            }
        }

        chart
            .draw_series(LineSeries::new(figure.series.iter().copied(), &LINE_BLUE))
            .map_err(draw_err)?
            .label(figure.country.as_str())
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], LINE_BLUE));

        if let Some(avg) = &figure.moving_average {
            chart
                .draw_series(LineSeries::new(avg.iter().copied(), MA_ORANGE.stroke_width(2)))
                .map_err(draw_err)?;
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        info!(path = %path.display(), country = %figure.country, "exported trend chart");
        Ok(())
    }

    fn draw_map<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        figure: &ChoroplethFigure,
    ) -> Result<(), RenderError> {
        let mut chart = ChartBuilder::on(area)
            .build_cartesian_2d(LON_RANGE.0..LON_RANGE.1, LAT_RANGE.0..LAT_RANGE.1)
            .map_err(draw_err)?;

        // Largest first, so enclaves drawn later sit on top of their surroundings.
        let mut shapes: Vec<(&RegionShape, Rgb)> = figure
            .no_data
            .iter()
            .map(|shape| (shape.as_ref(), NO_DATA))
            .chain(
                figure
                    .regions
                    .iter()
                    .map(|region| (region.shape.as_ref(), region.color)),
            )
            .collect();
        shapes.sort_by(|a, b| b.0.area().total_cmp(&a.0.area()));

        for (shape, color) in shapes {
            let exteriors = shape.polygons.iter().map(|polygon| &polygon.exterior);
            let holes = shape.polygons.iter().flat_map(|polygon| &polygon.holes);
            chart
                .draw_series(exteriors.map(|ring| Self::ring_polygon(ring, rgb(color).filled())))
                .map_err(draw_err)?;
            chart
                .draw_series(holes.map(|ring| Self::ring_polygon(ring, OCEAN.filled())))
                .map_err(draw_err)?;
            chart
                .draw_series(Self::ring_outlines(shape))
                .map_err(draw_err)?;
        }
        Ok(())
    }

    fn ring_polygon(ring: &Ring, style: ShapeStyle) -> Polygon<(f64, f64)> {
        Polygon::new(ring.iter().map(|p| (p[0], p[1])).collect::<Vec<_>>(), style)
    }

    fn ring_outlines(shape: &RegionShape) -> impl Iterator<Item = PathElement<(f64, f64)>> + '_ {
        shape
            .polygons
            .iter()
            .flat_map(|polygon| std::iter::once(&polygon.exterior).chain(&polygon.holes))
            .map(|ring| {
                PathElement::new(ring.iter().map(|p| (p[0], p[1])).collect::<Vec<_>>(), OUTLINE)
            })
    }

    fn get_x_range(figure: &LineFigure) -> (i32, i32) {
        let min = figure.series.iter().map(|p| p.0).min();
        let max = figure.series.iter().map(|p| p.0).max();
        match (min, max) {
            (Some(min), Some(max)) if min < max => (min, max),
            (Some(year), _) => (year - 1, year + 1),
            _ => (1900, 2000),
        }
    }

    fn get_y_range(figure: &LineFigure) -> (f64, f64) {
        let band = figure
            .confidence_band
            .iter()
            .flatten()
            .flat_map(|p| [p.lower, p.upper]);
        let values = figure.series.iter().map(|p| p.1).chain(band);

        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if min.is_infinite() {
            return (0.0, 30.0);
        }
        let pad = ((max - min) * 0.15).max(0.5);
        ((min - pad).floor(), (max + pad).ceil())
    }

    fn ensure_parent(path: &Path) -> Result<(), RenderError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
