//! Control Panel Widget
//! Left side panel with the year slider, country dropdown and overlay toggles.

use crate::charts::ChartParams;
use crate::config::DashboardVariant;
use crate::data::TableSummary;
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// Current widget values.
#[derive(Default, Clone)]
pub struct UserSettings {
    pub year: i32,
    pub country: String,
    pub show_confidence: bool,
    pub show_moving_average: bool,
}

/// Left side control panel.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub variant: DashboardVariant,
    pub data_path: Option<PathBuf>,
    pub countries: Vec<String>,
    pub year_range: Option<(i32, i32)>,
    pub summary: TableSummary,
    pub status: String,
}

impl ControlPanel {
    pub fn new(variant: DashboardVariant) -> Self {
        Self {
            settings: UserSettings::default(),
            variant,
            data_path: None,
            countries: Vec::new(),
            year_range: None,
            summary: TableSummary::default(),
            status: "Ready".to_string(),
        }
    }

    /// Refresh choices after (re)loading the table, keeping selections that still exist.
    pub fn update_data(&mut self, countries: Vec<String>, summary: TableSummary) {
        self.year_range = summary.years;
        if let Some((min, max)) = summary.years {
            if self.settings.year < min || self.settings.year > max {
                self.settings.year = min;
            }
        }
        if !countries.contains(&self.settings.country) {
            self.settings.country = countries.first().cloned().unwrap_or_default();
        }
        self.countries = countries;
        self.summary = summary;
    }

    /// Parameters for the figure builder, or `None` before any country is available.
    pub fn chart_params(&self) -> Option<ChartParams> {
        if self.settings.country.is_empty() || self.year_range.is_none() {
            return None;
        }
        Some(ChartParams {
            year: self.settings.year,
            country: self.settings.country.clone(),
            show_confidence: self.variant.supports_confidence() && self.settings.show_confidence,
            show_moving_average: self.variant.supports_moving_average()
                && self.settings.show_moving_average,
        })
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🌡 Temperature Atlas")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new(format!("{} view", self.variant.label()))
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                let path_text = self
                    .data_path
                    .as_ref()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "No file loaded".to_string());
                ui.label(RichText::new(path_text).size(12.0));

                ui.horizontal(|ui| {
                    if ui.button("🔄 Reload").clicked() {
                        action = ControlPanelAction::ReloadData;
                    }
                    if ui.button("📂 Browse").clicked() {
                        action = ControlPanelAction::BrowseCsv;
                    }
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        let Some((min_year, max_year)) = self.year_range else {
            ui.label(RichText::new("No measurements loaded").color(Color32::GRAY));
            self.show_status(ui);
            return action;
        };

        // ===== Map Section =====
        ui.label(RichText::new("🗺 Map").size(14.0).strong());
        ui.add_space(5.0);

        let slider =
            egui::Slider::new(&mut self.settings.year, min_year..=max_year).text("Select Year");
        if ui.add(slider).changed() {
            action = ControlPanelAction::ParamsChanged;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Trend Section =====
        ui.label(RichText::new("📈 Trend").size(14.0).strong());
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([110.0, 20.0], egui::Label::new("Select a Country:"));
            ComboBox::from_id_salt("country")
                .width(150.0)
                .selected_text(&self.settings.country)
                .show_ui(ui, |ui| {
                    for country in &self.countries {
                        if ui
                            .selectable_label(self.settings.country == *country, country)
                            .clicked()
                        {
                            self.settings.country = country.clone();
                            action = ControlPanelAction::ParamsChanged;
                        }
                    }
                });
        });

        ui.add_space(5.0);

        if self.variant.supports_confidence()
            && ui
                .checkbox(&mut self.settings.show_confidence, "Show confidence interval")
                .changed()
        {
            action = ControlPanelAction::ParamsChanged;
        }
        if self.variant.supports_moving_average()
            && ui
                .checkbox(&mut self.settings.show_moving_average, "Show moving average")
                .changed()
        {
            action = ControlPanelAction::ParamsChanged;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        ui.vertical_centered(|ui| {
            let button = egui::Button::new(RichText::new("📄 Export PNG").size(14.0))
                .min_size(egui::vec2(150.0, 30.0));
            if ui.add(button).clicked() {
                action = ControlPanelAction::ExportPng;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        self.show_status(ui);
        action
    }

    fn show_status(&self, ui: &mut egui::Ui) {
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        let s = &self.summary;
        let years = s
            .years
            .map(|(lo, hi)| format!("{lo}–{hi}"))
            .unwrap_or_else(|| "-".to_string());
        ui.label(
            RichText::new(format!(
                "{} rows, {} countries, years {}",
                s.rows, s.countries, years
            ))
            .size(11.0),
        );

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Exported") || self.status.contains("Loaded") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    ParamsChanged,
    ReloadData,
    BrowseCsv,
    ExportPng,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(years: Option<(i32, i32)>) -> TableSummary {
        TableSummary {
            rows: 10,
            countries: 2,
            years,
        }
    }

    #[test]
    fn defaults_to_first_year_and_country() {
        let mut panel = ControlPanel::new(DashboardVariant::Full);
        assert!(panel.chart_params().is_none());

        panel.update_data(
            vec!["Angola".to_string(), "Chile".to_string()],
            summary(Some((1900, 2013))),
        );
        let params = panel.chart_params().unwrap();
        assert_eq!(params.year, 1900);
        assert_eq!(params.country, "Angola");
    }

    #[test]
    fn keeps_selection_that_still_exists() {
        let mut panel = ControlPanel::new(DashboardVariant::Full);
        panel.update_data(vec!["Angola".into(), "Chile".into()], summary(Some((1900, 2013))));
        panel.settings.country = "Chile".to_string();
        panel.settings.year = 1990;

        panel.update_data(vec!["Chile".into()], summary(Some((1950, 2000))));
        assert_eq!(panel.settings.country, "Chile");
        assert_eq!(panel.settings.year, 1990);

        panel.update_data(vec!["Peru".into()], summary(Some((1995, 2000))));
        assert_eq!(panel.settings.country, "Peru");
        assert_eq!(panel.settings.year, 1995);
    }

    #[test]
    fn unsupported_toggles_are_ignored() {
        let mut panel = ControlPanel::new(DashboardVariant::Cutoff);
        panel.update_data(vec!["Chile".into()], summary(Some((1900, 1901))));
        panel.settings.show_confidence = true;
        panel.settings.show_moving_average = true;

        let params = panel.chart_params().unwrap();
        assert!(!params.show_confidence);
        assert!(!params.show_moving_average);
    }
}
