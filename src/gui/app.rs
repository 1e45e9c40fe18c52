//! Temperature Atlas Main Application
//! Main window with control panel and chart viewer.

use crate::cache::FigureCache;
use crate::charts::{FigureBuilder, Geography, StaticChartRenderer};
use crate::config::AtlasConfig;
use crate::data::{DataProcessor, TemperatureLoader};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use egui::SidePanel;
use polars::prelude::DataFrame;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

const MAP_EXPORT_SIZE: (u32, u32) = (1600, 900);
const LINE_EXPORT_SIZE: (u32, u32) = (1200, 700);

/// Main application window.
pub struct AtlasApp {
    config: AtlasConfig,
    loader: TemperatureLoader,
    df: Arc<DataFrame>,
    geography: Geography,
    cache: FigureCache,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
}

impl AtlasApp {
    /// `loader` must already hold the table; a missing input file is a startup failure.
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: AtlasConfig,
        loader: TemperatureLoader,
        geography: Geography,
    ) -> Result<Self, crate::data::LoaderError> {
        let df = loader.get_dataframe()?;
        let mut control_panel = ControlPanel::new(config.variant);
        control_panel.data_path = loader.get_file_path().cloned();

        let mut app = Self {
            config,
            loader,
            df,
            geography,
            cache: FigureCache::new(),
            control_panel,
            chart_viewer: ChartViewer::new(),
        };
        app.sync_controls();
        app.refresh_figures();
        Ok(app)
    }

    /// Push the table's countries and year bounds into the widgets.
    fn sync_controls(&mut self) {
        let countries = DataProcessor::get_countries(&self.df);
        let summary = DataProcessor::summarize(&self.df);
        self.control_panel.update_data(countries, summary);
    }

    /// Rebuild (or fetch from cache) both figures for the current widget values.
    fn refresh_figures(&mut self) {
        let Some(params) = self.control_panel.chart_params() else {
            self.chart_viewer.clear();
            return;
        };

        let df = &self.df;
        let geography = &self.geography;
        let window = self.config.moving_average_window();

        let map = self.cache.get_or_build_map(params.year, || {
            FigureBuilder::choropleth(df, params.year, geography)
        });
        let line = self
            .cache
            .get_or_build_line(&params, || FigureBuilder::line_chart(df, &params, window));

        match (map, line) {
            (Ok(map), Ok(line)) => {
                self.chart_viewer.set_map(map);
                self.chart_viewer.set_line(line);
            }
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %e, "failed to build figures");
                self.control_panel.set_status(format!("Error: {e}"));
            }
        }
    }

    /// Re-read `path`; on success every cached figure is dropped.
    fn handle_reload(&mut self, path: PathBuf) {
        match self.loader.reload(&path) {
            Ok(df) => {
                self.df = df;
                self.config.data_path = path;
                self.cache.invalidate();
                self.control_panel.data_path = self.loader.get_file_path().cloned();
                self.sync_controls();
                self.refresh_figures();
                self.control_panel
                    .set_status(format!("Loaded {} rows", self.df.height()));
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "reload failed");
                self.control_panel.set_status(format!("Error: {e}"));
            }
        }
    }

    fn handle_browse_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.handle_reload(path);
        }
    }

    /// Write the figures on screen to PNG files under the export directory.
    fn handle_export_png(&mut self) {
        let (Some(map), Some(line)) = (&self.chart_viewer.map, &self.chart_viewer.line) else {
            self.control_panel.set_status("No charts to export");
            return;
        };

        let dir = &self.config.export_dir;
        let map_path = dir.join(format!("choropleth_{}.png", map.year));
        let line_path = dir.join(format!("trend_{}.png", file_stem(&line.country)));

        let result = StaticChartRenderer::render_choropleth(map, &map_path, MAP_EXPORT_SIZE)
            .and_then(|()| StaticChartRenderer::render_line_chart(line, &line_path, LINE_EXPORT_SIZE));

        match result {
            Ok(()) => {
                info!(dir = %dir.display(), "exported figures");
                self.control_panel
                    .set_status(format!("Exported to {}", dir.display()));
            }
            Err(e) => {
                error!(error = %e, "export failed");
                self.control_panel.set_status(format!("Error: {e}"));
            }
        }
    }
}

/// Country name reduced to a safe file name.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

impl eframe::App for AtlasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::ParamsChanged => self.refresh_figures(),
                        ControlPanelAction::ReloadData => {
                            self.handle_reload(self.config.data_path.clone())
                        }
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ctx, ui);
        });
    }
}
