use eframe::egui;

use credit_dash::config::DashboardConfig;
use credit_dash::Error;
use credit_dash::state::DashboardState;

use crate::ui::{form, panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CreditDashApp {
    pub state: DashboardState,
}

impl CreditDashApp {
    pub fn new(config: &DashboardConfig, config_error: Option<Error>) -> Self {
        Self {
            state: DashboardState::from_config(config, config_error),
        }
    }
}

impl eframe::App for CreditDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Right side panel: scoring form ----
        egui::SidePanel::right("scoring_panel")
            .default_width(300.0)
            .resizable(true)
            .show(ctx, |ui| {
                form::scoring_form(ui, &mut self.state);
            });

        // ---- Central panel: metrics, chart, records ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.dataset.is_none() {
                ui.centered_and_justified(|ui| {
                    ui.heading("Open a dataset to begin  (File → Open dataset…)");
                });
                return;
            }
            panels::summary_metrics(ui, &self.state);
            ui.separator();
            plot::default_rate_chart(ui, &self.state);
            ui.separator();
            table::records_table(ui, &self.state);
        });
    }
}
