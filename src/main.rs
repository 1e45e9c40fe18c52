//! Temperature Atlas - Map & Trend Viewer
//!
//! Desktop dashboard for historical land temperatures by country.

use anyhow::Context;
use eframe::egui;
use temperature_atlas::charts::Geography;
use temperature_atlas::config::{AtlasConfig, CONFIG_FILE};
use temperature_atlas::data::TemperatureLoader;
use temperature_atlas::gui::AtlasApp;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "temperature_atlas=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AtlasConfig::load_or_default(CONFIG_FILE)?;
    info!(variant = ?config.variant, data = %config.data_path.display(), "starting Temperature Atlas");

    // A missing input file ends the program before any window opens
    let mut loader = TemperatureLoader::new(config.loader_options());
    if let Err(e) = loader.load(&config.data_path) {
        error!(error = %e, "cannot load temperature data");
        return Err(e).context("loading temperature data");
    }
    let geography = Geography::load_or_bundled(config.geography_path.as_deref());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("Temperature Atlas"),
        ..Default::default()
    };

    eframe::run_native(
        "Temperature Atlas",
        options,
        Box::new(|cc| Ok(Box::new(AtlasApp::new(cc, config, loader, geography)?))),
    )
    .map_err(|e| anyhow::anyhow!("window closed with error: {e}"))
}
