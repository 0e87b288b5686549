mod app;
mod color;
mod ui;

use app::CreditDashApp;
use credit_dash::config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let (config, config_error) = DashboardConfig::load_or_default();
    log::info!(
        "Dataset {} (sheet '{}'), model {}",
        config.dataset,
        config.sheet,
        config.model_path.display()
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Credit Default Risk Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(CreditDashApp::new(&config, config_error)))),
    )
}
