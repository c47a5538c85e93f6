use eframe::egui;

use crate::state::{AppState, CentralTab};
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct StrokeDashApp {
    pub state: AppState,
}

impl StrokeDashApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for StrokeDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: charts or raw rows ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.tab {
            CentralTab::Charts => plot::charts_panel(ui, &mut self.state),
            CentralTab::Table => table::data_table(ui, &self.state),
        });
    }
}
