use chrono::NaiveDate;
use eframe::egui::{Color32, RichText, Ui};
use egui_extras::DatePickerButton;

use crate::state::{AppState, ChartSession, LoadState, Phase};

pub const PAGE_HEADING: &str = "SWAPIT Cruiser G2401 Dashboard";
pub const PAGE_SUBHEADING: &str = "Cruiser G2401 plot display with date picker";

// ---------------------------------------------------------------------------
// Left side panel – date range picker
// ---------------------------------------------------------------------------

/// Render the left panel with the start/end pickers.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Date range");
    ui.separator();

    let Some(session) = state.session_mut() else {
        ui.label("No dataset loaded.");
        return;
    };

    let (min, max) = session.selectable_dates();
    ui.label(format!("Available: {min} → {max}"));
    ui.add_space(6.0);

    ui.strong("Start");
    if let Some(picked) = date_field(ui, "start_date", session.start(), min) {
        session.set_start(picked);
    }

    ui.add_space(4.0);
    ui.strong("End");
    if let Some(picked) = date_field(ui, "end_date", session.end(), max) {
        session.set_end(picked);
    }

    ui.separator();
    match session.phase() {
        Phase::Idle => ui.label("Showing the last rendered chart"),
        Phase::Filtered { start, end } => ui.label(format!("Filtered {start} … {end}")),
    };
}

/// One optional date. Returns `Some(new_value)` when the user changed it.
fn date_field(
    ui: &mut Ui,
    id: &str,
    current: Option<NaiveDate>,
    default: NaiveDate,
) -> Option<Option<NaiveDate>> {
    let mut changed = None;
    ui.horizontal(|ui: &mut Ui| match current {
        Some(mut date) => {
            if ui
                .add(DatePickerButton::new(&mut date).id_salt(id))
                .changed()
            {
                changed = Some(Some(date));
            }
            if ui.small_button("✕").on_hover_text("Clear").clicked() {
                changed = Some(None);
            }
        }
        None => {
            if ui.button("Set…").clicked() {
                changed = Some(Some(default));
            }
        }
    });
    changed
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the page heading and a status line.
pub fn top_bar(ui: &mut Ui, state: &AppState) {
    ui.heading(PAGE_HEADING);
    ui.horizontal(|ui: &mut Ui| {
        ui.label(PAGE_SUBHEADING);
        ui.separator();
        match &state.load {
            LoadState::Loading(_) => {
                ui.spinner();
                ui.label("Loading dataset…");
            }
            LoadState::Ready(session) => {
                ui.label(status_line(session));
            }
            LoadState::Failed(msg) => {
                ui.label(RichText::new(format!("Error: {msg}")).color(Color32::RED));
            }
        }
    });
    ui.add_space(2.0);
}

fn status_line(session: &ChartSession) -> String {
    format!(
        "{} readings loaded, {} shown",
        session.record_count(),
        session.chart().len()
    )
}

/// Chart once the session is ready, a placeholder before that.
pub fn central_panel(ui: &mut Ui, state: &AppState) {
    if let Some(session) = state.session() {
        super::plot::chart_plot(ui, session);
    } else if matches!(state.load, LoadState::Failed(_)) {
        super::plot::placeholder(ui, "No chart: the dataset could not be loaded");
    } else {
        super::plot::placeholder(ui, "Loading…");
    }
}
