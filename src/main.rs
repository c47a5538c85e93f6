mod app;
mod chart;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use eframe::egui;

use app::StrokeDashApp;
use config::DashboardConfig;
use state::AppState;

/// Interactive dashboard over the stroke prediction dataset.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// CSV, JSON or Parquet file to open at startup.
    dataset: Option<PathBuf>,

    /// JSON file with window, chart and initial filter settings.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };

    let mut state = AppState::from_config(&config);
    if let Some(path) = cli.dataset.as_ref().or(config.dataset.as_ref()) {
        state.set_dataset(data::loader::load_file(path)?);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Healthcare Data Visualization",
        options,
        Box::new(|cc| {
            // Install image loaders so egui can render the logo.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(StrokeDashApp::new(state)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
