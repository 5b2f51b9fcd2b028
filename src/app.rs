use std::time::Duration;

use eframe::egui;

use crate::state::{AppState, LoadState};
use crate::ui::panels;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct G2401App {
    pub state: AppState,
}

impl G2401App {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for G2401App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_load();
        if matches!(self.state.load, LoadState::Loading(_)) {
            // Keep polling the loader without user input.
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        // ---- Top panel: page heading ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.state);
        });

        // ---- Left side panel: date range ----
        egui::SidePanel::left("range_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::central_panel(ui, &self.state);
        });
    }
}
