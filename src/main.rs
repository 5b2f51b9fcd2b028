mod app;
mod chart;
mod color;
mod config;
mod controller;
mod data;
mod state;
mod ui;

use app::G2401App;
use config::AppConfig;
use data::source::FileSource;
use eframe::egui;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::from_env()?;
    log::info!("Data source: {}", config.source.path.display());

    // The window opens right away; the dataset arrives on a background thread.
    let rx = state::spawn_load(
        Box::new(FileSource::new(config.source.path.clone())),
        config.loader_settings(),
    );
    let app_state = state::AppState::new(rx, config.chart.clone());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "G2401 Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(G2401App::new(app_state)))),
    )
    .map_err(|e| anyhow::anyhow!("viewer exited with an error: {e}"))
}
