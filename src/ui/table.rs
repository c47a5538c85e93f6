use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::FieldValue;
use crate::state::AppState;

const ROW_HEIGHT: f32 = 18.0;

/// Raw rows of the current view, one column per dataset column.
pub fn data_table(ui: &mut Ui, state: &AppState) {
    let Some(view) = state.view() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No dataset loaded");
        });
        return;
    };
    if view.is_empty() {
        ui.label(RichText::new("No rows match the current filters.").italics());
        return;
    }

    let dataset = view.dataset();
    let columns = &dataset.column_names;
    let schema = dataset.schema;

    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .column(Column::auto().at_least(48.0))
            .columns(Column::auto().at_least(64.0).clip(true), columns.len())
            .header(22.0, |mut header| {
                header.col(|ui| {
                    ui.strong("#");
                });
                for name in columns {
                    header.col(|ui| {
                        ui.strong(schema.label_of(name));
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, view.len(), |mut row| {
                    let idx = view.indices()[row.index()];
                    let record = &dataset.records[idx];
                    row.col(|ui| {
                        ui.label(RichText::new(idx.to_string()).weak());
                    });
                    for name in columns {
                        row.col(|ui| {
                            match record.get(name) {
                                Some(FieldValue::Null) | None => {
                                    ui.label(RichText::new("N/A").weak());
                                }
                                Some(value) => {
                                    ui.label(value.to_string());
                                }
                            }
                        });
                    }
                });
            });
    });
}
