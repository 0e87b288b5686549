use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Plot};

use credit_dash::state::DashboardState;

use crate::color::risk_color;

// ---------------------------------------------------------------------------
// Default rate by age group (central panel)
// ---------------------------------------------------------------------------

/// Bar per non-empty age group, centred on the group's midpoint age and
/// coloured by its rate.
pub fn default_rate_chart(ui: &mut Ui, state: &DashboardState) {
    ui.strong("Default rate by age group");

    if state.view.by_age.is_empty() {
        ui.label("No data");
        return;
    }

    let bars: Vec<Bar> = state
        .view
        .by_age
        .iter()
        .map(|b| {
            let mid = f64::from(b.bucket.lower + b.bucket.upper) / 2.0;
            Bar::new(mid, b.default_rate * 100.0)
                .width(9.0)
                .name(format!("{}  ({} records)", b.label, b.count))
                .fill(risk_color(b.default_rate))
        })
        .collect();

    Plot::new("default_rate_by_age")
        .height(260.0)
        .x_axis_label("Age")
        .y_axis_label("Default rate (%)")
        .include_y(0.0)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Default rate"));
        });
}
