//! Chart Viewer Widget
//! Central scrollable panel showing the map card above the trend card.

use crate::charts::{ChartPlotter, ChoroplethFigure, LineFigure, StaticChartRenderer};
use egui::{Color32, RichText, ScrollArea};
use std::sync::Arc;
use tracing::warn;

const CARD_SPACING: f32 = 15.0;
const MAP_HEIGHT: f32 = 380.0;
const LINE_HEIGHT: f32 = 320.0;
/// Resolution of the rasterised map texture.
const MAP_TEXTURE_SIZE: (u32, u32) = (1080, 540);

/// Figures currently on screen.
#[derive(Default)]
pub struct ChartViewer {
    pub map: Option<Arc<ChoroplethFigure>>,
    pub line: Option<Arc<LineFigure>>,
    map_texture: Option<egui::TextureHandle>,
    texture_stale: bool,
    render_error: Option<String>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.map = None;
        self.line = None;
        self.map_texture = None;
        self.render_error = None;
    }

    pub fn set_map(&mut self, map: Arc<ChoroplethFigure>) {
        let same = self.map.as_ref().is_some_and(|m| Arc::ptr_eq(m, &map));
        if !same {
            self.map = Some(map);
            self.texture_stale = true;
        }
    }

    pub fn set_line(&mut self, line: Arc<LineFigure>) {
        self.line = Some(line);
    }

    /// Rasterise the map again if the figure changed since the last frame.
    fn refresh_texture(&mut self, ctx: &egui::Context) {
        if !self.texture_stale {
            return;
        }
        self.texture_stale = false;

        let Some(map) = &self.map else {
            self.map_texture = None;
            return;
        };

        let (width, height) = MAP_TEXTURE_SIZE;
        match StaticChartRenderer::render_choropleth_rgb(map, width, height) {
            Ok(rgb) => {
                let image = egui::ColorImage::from_rgb([width as usize, height as usize], &rgb);
                match &mut self.map_texture {
                    Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                    None => {
                        self.map_texture =
                            Some(ctx.load_texture("choropleth", image, egui::TextureOptions::LINEAR))
                    }
                }
                self.render_error = None;
            }
            Err(e) => {
                warn!(error = %e, "map render failed");
                self.render_error = Some(e.to_string());
            }
        }
    }

    pub fn show(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        if self.map.is_none() && self.line.is_none() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        }

        self.refresh_texture(ctx);

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if let Some(map) = &self.map {
                    Self::card(ui, |ui| match (&self.map_texture, &self.render_error) {
                        (_, Some(error)) => {
                            ui.label(
                                RichText::new(format!("Map unavailable: {error}"))
                                    .color(Color32::from_rgb(220, 53, 69)),
                            );
                        }
                        (Some(texture), None) => {
                            ChartPlotter::draw_map(ui, map, texture, MAP_HEIGHT)
                        }
                        (None, None) => {
                            ui.spinner();
                        }
                    });
                    ui.add_space(CARD_SPACING);
                }

                if let Some(line) = &self.line {
                    Self::card(ui, |ui| {
                        if line.series.is_empty() {
                            ui.label(
                                RichText::new(format!("No measurements for {}", line.country))
                                    .color(Color32::GRAY),
                            );
                        } else {
                            ChartPlotter::draw_line_chart(ui, line, LINE_HEIGHT);
                        }
                    });
                }
            });
    }

    fn card(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, Color32::from_gray(90)))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                add_contents(ui);
            });
    }
}
