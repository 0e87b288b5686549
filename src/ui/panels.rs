use eframe::egui::{self, Color32, RichText, ScrollArea, Ui, emath};

use credit_dash::data::aggregate::format_rate;
use credit_dash::data::filter::CategoryFilter;
use credit_dash::data::source::DataSource;
use credit_dash::scoring::{Education, Sex};
use credit_dash::state::DashboardState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut DashboardState) {
    ui.heading("Filters");
    ui.separator();

    let Some(extents) = state.extents.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Credit limit ----
            ui.strong("Credit limit");
            let current = (
                state.predicates.credit_limit.lower(),
                state.predicates.credit_limit.upper(),
            );
            if let Some((lo, hi)) = range_sliders(ui, "credit_limit", extents.credit_limit, current) {
                report(state.set_credit_limit_range(lo, hi), state);
            }
            ui.add_space(6.0);

            // ---- Age ----
            ui.strong("Age");
            let current = (state.predicates.age.lower(), state.predicates.age.upper());
            if let Some((lo, hi)) = range_sliders(ui, "age", extents.age, current) {
                report(state.set_age_range(lo, hi), state);
            }
            ui.separator();

            // ---- Education ----
            ui.strong("Education");
            if let Some(choice) = category_combo(
                ui,
                "education_filter",
                state.predicates.education,
                &extents.education_codes,
                education_label,
            ) {
                state.set_education(choice);
            }
            ui.add_space(6.0);

            // ---- Gender ----
            ui.strong("Gender");
            if let Some(choice) = category_combo(
                ui,
                "sex_filter",
                state.predicates.sex,
                &extents.sex_codes,
                sex_label,
            ) {
                state.set_sex(choice);
            }
            ui.separator();

            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        });
}

fn report(result: credit_dash::Result<()>, state: &mut DashboardState) {
    if let Err(e) = result {
        state.status_message = Some(format!("Error: {e}"));
    }
}

/// Lower/upper sliders over `[min, max]`. Dragging one handle past the other
/// pushes the other along, so the pair never inverts.
fn range_sliders<T: emath::Numeric>(
    ui: &mut Ui,
    id: &str,
    (min, max): (T, T),
    (mut lo, mut hi): (T, T),
) -> Option<(T, T)> {
    let (lo_changed, hi_changed) = ui
        .push_id(id, |ui: &mut Ui| {
            (
                ui.add(egui::Slider::new(&mut lo, min..=max).text("from")).changed(),
                ui.add(egui::Slider::new(&mut hi, min..=max).text("to")).changed(),
            )
        })
        .inner;
    if lo > hi {
        if lo_changed {
            hi = lo;
        } else {
            lo = hi;
        }
    }
    (lo_changed || hi_changed).then_some((lo, hi))
}

/// "All" plus one entry per code present in the dataset.
fn category_combo(
    ui: &mut Ui,
    id: &str,
    current: CategoryFilter,
    codes: &std::collections::BTreeSet<i64>,
    label: fn(i64) -> String,
) -> Option<CategoryFilter> {
    let text = match current {
        CategoryFilter::Any => "All".to_string(),
        CategoryFilter::Only(code) => label(code),
    };
    let mut selected = current;
    egui::ComboBox::from_id_salt(id)
        .selected_text(text)
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(&mut selected, CategoryFilter::Any, "All");
            for &code in codes {
                ui.selectable_value(&mut selected, CategoryFilter::Only(code), label(code));
            }
        });
    (selected != current).then_some(selected)
}

pub fn education_label(code: i64) -> String {
    match Education::from_code(code) {
        Education::None => format!("Other ({code})"),
        known => known.label().to_string(),
    }
}

pub fn sex_label(code: i64) -> String {
    Sex::from_code(code)
        .map(|s| s.label().to_string())
        .unwrap_or_else(|_| format!("Unknown ({code})"))
}

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

pub fn summary_metrics(ui: &mut Ui, state: &DashboardState) {
    let summary = &state.view.summary;
    ui.horizontal(|ui: &mut Ui| {
        metric(ui, "Total records", &summary.count.to_string());
        ui.add_space(32.0);
        metric(ui, "Default rate", &format_rate(summary.default_rate));
    });
}

fn metric(ui: &mut Ui, label: &str, value: &str) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).weak());
        ui.label(RichText::new(value).size(26.0).strong());
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut DashboardState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open dataset…").clicked() {
                open_dataset_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open model…").clicked() {
                open_model_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} records loaded, {} after filters",
                ds.len(),
                state.view.summary.count
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_dataset_dialog(state: &mut DashboardState) {
    let file = rfd::FileDialog::new()
        .set_title("Open credit dataset")
        .add_filter("Supported files", &["xlsx", "xls", "xlsm", "ods", "csv", "parquet", "pq", "json"])
        .add_filter("Spreadsheet", &["xlsx", "xls", "xlsm", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        // Errors are already in the status line.
        let _ = state.open_source(DataSource::Path(path));
    }
}

pub fn open_model_dialog(state: &mut DashboardState) {
    let file = rfd::FileDialog::new()
        .set_title("Open model artifact")
        .add_filter("Model artifact", &["json"])
        .pick_file();

    if let Some(path) = file {
        let _ = state.load_model(&path);
    }
}
