use eframe::egui::{self, Grid, RichText, ScrollArea, Ui};

use credit_dash::data::aggregate::format_rate;
use credit_dash::data::model::{MONTH_LABELS, MONTHS};
use credit_dash::scoring::{Education, MaritalStatus, Sex};
use credit_dash::state::DashboardState;

use crate::color::risk_color;

// ---------------------------------------------------------------------------
// Scoring form (right side panel)
// ---------------------------------------------------------------------------

/// "Enter Customer Information": edits a copy of the profile and rescores
/// when anything changed.
pub fn scoring_form(ui: &mut Ui, state: &mut DashboardState) {
    ui.heading("Enter Customer Information");
    ui.separator();

    let mut profile = state.profile;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            prediction_banner(ui, state);
            ui.separator();

            Grid::new("profile_grid")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui: &mut Ui| {
                    ui.label("Credit limit");
                    ui.add(
                        egui::DragValue::new(&mut profile.credit_limit)
                            .speed(1000.0)
                            .range(0.0..=10_000_000.0),
                    );
                    ui.end_row();

                    ui.label("Age");
                    ui.add(egui::DragValue::new(&mut profile.age).range(18..=100));
                    ui.end_row();

                    ui.label("Gender");
                    egui::ComboBox::from_id_salt("form_sex")
                        .selected_text(profile.sex.label())
                        .show_ui(ui, |ui: &mut Ui| {
                            for s in Sex::ALL {
                                ui.selectable_value(&mut profile.sex, s, s.label());
                            }
                        });
                    ui.end_row();

                    ui.label("Marital status");
                    egui::ComboBox::from_id_salt("form_marriage")
                        .selected_text(profile.marital_status.label())
                        .show_ui(ui, |ui: &mut Ui| {
                            for m in MaritalStatus::FORM_CHOICES {
                                ui.selectable_value(&mut profile.marital_status, m, m.label());
                            }
                        });
                    ui.end_row();

                    ui.label("Education");
                    egui::ComboBox::from_id_salt("form_education")
                        .selected_text(profile.education.label())
                        .show_ui(ui, |ui: &mut Ui| {
                            for e in Education::ALL {
                                ui.selectable_value(&mut profile.education, e, e.label());
                            }
                        });
                    ui.end_row();
                });

            ui.add_space(8.0);
            ui.strong("Repayment history");
            Grid::new("history_grid")
                .num_columns(4)
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    ui.label("");
                    ui.label("Status");
                    ui.label("Bill");
                    ui.label("Paid");
                    ui.end_row();

                    for m in 0..MONTHS {
                        ui.label(MONTH_LABELS[m]);
                        ui.add(egui::DragValue::new(&mut profile.pay_status[m]).range(-2..=9));
                        ui.add(egui::DragValue::new(&mut profile.bill_amount[m]).speed(100.0));
                        ui.add(
                            egui::DragValue::new(&mut profile.pay_amount[m])
                                .speed(100.0)
                                .range(0.0..=f64::MAX),
                        );
                        ui.end_row();
                    }
                });
        });

    if profile != state.profile {
        state.set_profile(profile);
    }
}

fn prediction_banner(ui: &mut Ui, state: &DashboardState) {
    match (state.prediction, &state.artifact) {
        (Some(p), _) => {
            ui.label("Predicted default probability");
            ui.label(
                RichText::new(format_rate(Some(p)))
                    .size(28.0)
                    .strong()
                    .color(risk_color(p)),
            );
        }
        (None, Some(_)) => {
            ui.label("No prediction for this input.");
        }
        (None, None) => {
            ui.label("Load a model (File → Open model…) to score customers.");
        }
    }
}
