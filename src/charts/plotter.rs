//! Chart Plotter Module
//! Draws the figures interactively using egui_plot.

use super::builder::{ChoroplethFigure, LineFigure};
use super::palette::{plasma, ColorScale, Rgb};
use super::renderer::{LAT_RANGE, LON_RANGE};
use egui::{Color32, RichText, Stroke};
use egui_plot::{Legend, Line, Plot, PlotImage, PlotPoint, PlotPoints, Polygon};

pub const LINE_COLOR: Color32 = Color32::from_rgb(99, 110, 250);
pub const MOVING_AVERAGE_COLOR: Color32 = Color32::from_rgb(239, 85, 59);

const LEGEND_STEPS: usize = 48;

/// Draws trend and map figures into egui panels.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn color32(color: Rgb) -> Color32 {
        Color32::from_rgb(color.0, color.1, color.2)
    }

    /// Draw the trend chart. Band and moving average carry no name, so the legend
    /// only lists the country.
    pub fn draw_line_chart(ui: &mut egui::Ui, figure: &LineFigure, height: f32) {
        ui.label(RichText::new(&figure.title).size(16.0).strong());

        Plot::new(("trend", &figure.country))
            .height(height)
            .legend(Legend::default())
            .x_axis_label("year")
            .y_axis_label("AverageTemperature")
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                if let Some(band) = &figure.confidence_band {
                    let fill = LINE_COLOR.gamma_multiply(0.2);
                    // one quad per year step keeps every polygon convex
                    for pair in band.windows(2) {
                        let (a, b) = (pair[0], pair[1]);
                        let quad = vec![
                            [a.year as f64, a.upper],
                            [b.year as f64, b.upper],
                            [b.year as f64, b.lower],
                            [a.year as f64, a.lower],
                        ];
                        plot_ui.polygon(
                            Polygon::new(PlotPoints::from(quad))
                                .fill_color(fill)
                                .stroke(Stroke::NONE),
                        );
                    }

                    let upper: PlotPoints =
                        band.iter().map(|p| [p.year as f64, p.upper]).collect();
                    let lower: PlotPoints =
                        band.iter().map(|p| [p.year as f64, p.lower]).collect();
                    plot_ui.line(Line::new(upper).color(LINE_COLOR.gamma_multiply(0.4)));
                    plot_ui.line(Line::new(lower).color(LINE_COLOR.gamma_multiply(0.4)));
                }

                let points: PlotPoints = figure
                    .series
                    .iter()
                    .map(|&(year, mean)| [year as f64, mean])
                    .collect();
                plot_ui.line(
                    Line::new(points)
                        .color(LINE_COLOR)
                        .width(1.5)
                        .name(&figure.country),
                );

                if let Some(avg) = &figure.moving_average {
                    let points: PlotPoints =
                        avg.iter().map(|&(year, v)| [year as f64, v]).collect();
                    plot_ui.line(Line::new(points).color(MOVING_AVERAGE_COLOR).width(2.0));
                }
            });
    }

    /// Draw the pre-rendered map texture on lon/lat axes with a hover readout.
    pub fn draw_map(
        ui: &mut egui::Ui,
        figure: &ChoroplethFigure,
        texture: &egui::TextureHandle,
        height: f32,
    ) {
        ui.label(RichText::new(&figure.title).size(16.0).strong());

        let width = LON_RANGE.1 - LON_RANGE.0;
        let span = LAT_RANGE.1 - LAT_RANGE.0;

        let response = Plot::new("choropleth")
            .height(height)
            .data_aspect(1.0)
            .include_x(LON_RANGE.0)
            .include_x(LON_RANGE.1)
            .include_y(LAT_RANGE.0)
            .include_y(LAT_RANGE.1)
            .show_grid(false)
            .show_axes(false)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.image(PlotImage::new(
                    texture.id(),
                    PlotPoint::new(
                        (LON_RANGE.0 + LON_RANGE.1) / 2.0,
                        (LAT_RANGE.0 + LAT_RANGE.1) / 2.0,
                    ),
                    [width as f32, span as f32],
                ));
                plot_ui.pointer_coordinate()
            });

        if let Some(pointer) = response.inner {
            if let Some((name, value)) = figure.region_at(pointer.x, pointer.y) {
                let text = match value {
                    Some(v) => format!("{name}\nAverageTemperature: {v:.2}"),
                    None => format!("{name}\nno data"),
                };
                response.response.on_hover_text(text);
            }
        }

        if let Some(scale) = figure.scale {
            Self::draw_color_legend(ui, &scale);
        }

        if !figure.unmatched.is_empty() {
            ui.label(
                RichText::new(format!(
                    "{} countries have no map shape",
                    figure.unmatched.len()
                ))
                .size(11.0)
                .color(Color32::GRAY),
            );
        }
    }

    /// Horizontal Plasma bar with the value range at both ends.
    pub fn draw_color_legend(ui: &mut egui::Ui, scale: &ColorScale) {
        ui.horizontal(|ui| {
            ui.label(RichText::new(format!("{:.1}", scale.min)).size(11.0));
            let (rect, _) =
                ui.allocate_exact_size(egui::vec2(240.0, 12.0), egui::Sense::hover());
            let step = rect.width() / LEGEND_STEPS as f32;
            for i in 0..LEGEND_STEPS {
                let x = rect.left() + step * i as f32;
                let cell = egui::Rect::from_min_max(
                    egui::pos2(x, rect.top()),
                    egui::pos2(x + step + 0.5, rect.bottom()),
                );
                let color = plasma(i as f64 / (LEGEND_STEPS - 1) as f64);
                ui.painter().rect_filled(cell, 0.0, Self::color32(color));
            }
            ui.label(RichText::new(format!("{:.1} °C", scale.max)).size(11.0));
        });
    }
}
