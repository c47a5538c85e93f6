use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::chart::ChartKind;
use crate::data::filter::Selection;
use crate::data::model::{Dataset, FieldKind, FieldSpec, FieldValue};
use crate::state::{AppState, CentralTab};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    // ---- Logo (centered) ----
    let logo = egui::include_image!("../../assets/logo.png");
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add(
            egui::Image::new(logo)
                .max_width(ui.available_width() * 0.5)
                .max_height(80.0)
                .rounding(4.0),
        );
    });
    ui.add_space(4.0);

    ui.heading("Filter Data");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    // Widgets only record edits; they are applied once the dataset borrow ends.
    let mut edits: Vec<(&'static str, Selection)> = Vec::new();
    let mut reset = false;
    let mut toggled: Option<ChartKind> = None;
    let mut color_by: Option<String> = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for field in dataset.schema.fields() {
                let current = state.selection.get(field.name).cloned().unwrap_or_default();
                let edited = if field.kind.is_discrete() {
                    category_filter(ui, dataset, field, &current)
                } else {
                    range_filter(ui, dataset, field, &current)
                };
                if let Some(selection) = edited {
                    edits.push((field.name, selection));
                }
            }

            ui.add_space(4.0);
            if ui.button("Reset filters").clicked() {
                reset = true;
            }
            ui.separator();

            // ---- Colour-by selector ----
            ui.strong("Color by");
            let current_color = state.chart_options.color_by.clone();
            egui::ComboBox::from_id_salt("color_by")
                .selected_text(dataset.schema.label_of(&current_color))
                .show_ui(ui, |ui: &mut Ui| {
                    for field in dataset.schema.fields().iter().filter(|f| f.kind.is_discrete()) {
                        if ui
                            .selectable_label(current_color == field.name, field.label)
                            .clicked()
                        {
                            color_by = Some(field.name.to_string());
                        }
                    }
                });
            if let Some(cm) = &state.color_map {
                ui.horizontal_wrapped(|ui: &mut Ui| {
                    for (label, color) in cm.legend_entries() {
                        ui.label(RichText::new(format!("● {label}")).color(color));
                    }
                });
            }
            ui.separator();

            // ---- Chart toggles ----
            egui::CollapsingHeader::new(RichText::new("Charts").strong())
                .id_salt("chart_toggles")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    for chart in ChartKind::ALL {
                        let mut checked = state.enabled_charts.contains(&chart);
                        if ui.checkbox(&mut checked, chart.title()).changed() {
                            toggled = Some(chart);
                        }
                    }
                });
        });

    for (field, selection) in edits {
        state.set_selection(field, selection);
    }
    if reset {
        state.reset_filters();
    }
    if let Some(chart) = toggled {
        state.toggle_chart(chart);
    }
    if let Some(field) = color_by {
        state.set_color_by(field);
    }
}

fn value_label(kind: FieldKind, value: &FieldValue) -> String {
    match (kind, value) {
        (FieldKind::Flag, FieldValue::Integer(1)) => "Yes".to_string(),
        (FieldKind::Flag, FieldValue::Integer(0)) => "No".to_string(),
        _ => value.to_string(),
    }
}

/// Dropdown with an "All" entry plus every observed value.
fn category_filter(
    ui: &mut Ui,
    dataset: &Dataset,
    field: &FieldSpec,
    current: &Selection,
) -> Option<Selection> {
    let selected_text = match current {
        Selection::Equals(v) => value_label(field.kind, v),
        _ => "All".to_string(),
    };
    let mut edited = None;

    ui.label(field.label);
    egui::ComboBox::from_id_salt(field.name)
        .selected_text(selected_text)
        .width(ui.available_width() * 0.9)
        .show_ui(ui, |ui: &mut Ui| {
            if ui
                .selectable_label(matches!(current, Selection::Unrestricted), "All")
                .clicked()
            {
                edited = Some(Selection::Unrestricted);
            }
            let values = dataset.unique_values.get(field.name).into_iter().flatten();
            for value in values {
                let is_selected = matches!(current, Selection::Equals(v) if v == value);
                if ui
                    .selectable_label(is_selected, value_label(field.kind, value))
                    .clicked()
                {
                    edited = Some(Selection::Equals(value.clone()));
                }
            }
        });
    ui.add_space(2.0);
    edited
}

/// Two sliders bounding an inclusive range; `lo ≤ hi` is kept by pushing the
/// other handle along.
fn range_filter(
    ui: &mut Ui,
    dataset: &Dataset,
    field: &FieldSpec,
    current: &Selection,
) -> Option<Selection> {
    let Some((min, max)) = dataset.bounds_of(field.name) else {
        ui.label(RichText::new(format!("{}: no values", field.label)).weak());
        return None;
    };
    let (mut lo, mut hi) = match current {
        Selection::Range(lo, hi) => (
            lo.as_f64().unwrap_or(min),
            hi.as_f64().unwrap_or(max),
        ),
        Selection::Equals(v) => {
            let v = v.as_f64().unwrap_or(min);
            (v, v)
        }
        Selection::Unrestricted => (min, max),
    };

    let integer = field.kind == FieldKind::Integer;

    ui.label(format!("Select {} Range", field.label));
    let lo_changed = ui.add(bound_slider(&mut lo, min..=max, "min", integer)).changed();
    let hi_changed = ui.add(bound_slider(&mut hi, min..=max, "max", integer)).changed();
    ui.add_space(2.0);

    if lo_changed {
        hi = hi.max(lo);
    }
    if hi_changed {
        lo = lo.min(hi);
    }
    // Sliders back at both ends mean no condition, so missing values return.
    (lo_changed || hi_changed).then(|| {
        if lo <= min && hi >= max {
            Selection::Unrestricted
        } else {
            Selection::range(lo, hi)
        }
    })
}

fn bound_slider<'a>(
    value: &'a mut f64,
    range: RangeInclusive<f64>,
    text: &str,
    integer: bool,
) -> egui::Slider<'a> {
    let slider = egui::Slider::new(value, range).text(text);
    if integer { slider.integer() } else { slider }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if ui
            .selectable_label(state.tab == CentralTab::Charts, "Charts")
            .clicked()
        {
            state.tab = CentralTab::Charts;
        }
        if ui
            .selectable_label(state.tab == CentralTab::Table, "Table")
            .clicked()
        {
            state.tab = CentralTab::Table;
        }

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} rows loaded, {} visible, {} active filters",
                ds.len(),
                state.visible_indices.len(),
                state.selection.active_count()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open stroke dataset")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => state.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
