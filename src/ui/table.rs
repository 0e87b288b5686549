use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use credit_dash::data::model::MONTH_LABELS;
use credit_dash::scoring::MaritalStatus;
use credit_dash::state::DashboardState;

use super::panels::{education_label, sex_label};

const HEADERS: [&str; 9] = [
    "Credit limit",
    "Gender",
    "Education",
    "Marriage",
    "Age",
    "Pay status",
    "Bill amount",
    "Amount paid",
    "Defaulted",
];

/// Filtered records, most recent month (`MONTH_LABELS[0]`) for the history
/// columns. Only visible rows are laid out.
pub fn records_table(ui: &mut Ui, state: &DashboardState) {
    let records = &state.filtered.records;
    ui.strong(format!("Records ({}, {} history)", records.len(), MONTH_LABELS[0]));

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .columns(Column::auto().at_least(70.0), HEADERS.len())
        .min_scrolled_height(0.0)
        .header(20.0, |mut header| {
            for name in HEADERS {
                header.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, records.len(), |mut row| {
                let r = &records[row.index()];
                let cells = [
                    format!("{:.0}", r.credit_limit),
                    sex_label(r.sex),
                    education_label(r.education),
                    MaritalStatus::from_code(r.marriage).label().to_string(),
                    r.age.to_string(),
                    r.pay_status[0].to_string(),
                    format!("{:.0}", r.bill_amount[0]),
                    format!("{:.0}", r.pay_amount[0]),
                    if r.defaulted { "Yes" } else { "No" }.to_string(),
                ];
                for text in cells {
                    row.col(|ui| {
                        ui.label(text);
                    });
                }
            });
        });
}
