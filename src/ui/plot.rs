use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDateTime};
use eframe::egui::{Context, Id, Ui};
use egui_plot::{AxisHints, Corner, GridMark, HPlacement, Legend, Line, Plot, PlotPoints};

use crate::chart::{AxisSide, LegendAnchor};
use crate::color::channel_color;
use crate::state::ChartSession;

// ---------------------------------------------------------------------------
// Secondary axis mapping
// ---------------------------------------------------------------------------

/// Affine map from the secondary series' value range onto the primary's.
///
/// egui_plot has a single y coordinate space, so the secondary series is drawn
/// in primary units and the right-hand axis labels are mapped back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMapping {
    primary: (f64, f64),
    secondary: (f64, f64),
}

impl AxisMapping {
    pub fn new(primary: &[f64], secondary: &[f64]) -> Self {
        Self {
            primary: finite_range(primary),
            secondary: finite_range(secondary),
        }
    }

    fn scale(&self) -> f64 {
        span(self.primary) / span(self.secondary)
    }

    /// Secondary value → primary coordinate.
    pub fn to_primary(&self, v: f64) -> f64 {
        self.primary.0 + (v - self.secondary.0) * self.scale()
    }

    /// Primary coordinate → secondary value.
    pub fn to_secondary(&self, y: f64) -> f64 {
        self.secondary.0 + (y - self.primary.0) / self.scale()
    }
}

/// Min/max of the finite values, `(0, 1)` when there are none.
fn finite_range(values: &[f64]) -> (f64, f64) {
    let (min, max) = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min > max {
        (0.0, 1.0)
    } else {
        (min, max)
    }
}

/// Width of a range; a flat range counts as width 1.
fn span((lo, hi): (f64, f64)) -> f64 {
    let w = hi - lo;
    if w.abs() < f64::EPSILON {
        1.0
    } else {
        w
    }
}

// ---------------------------------------------------------------------------
// Time axis helpers
// ---------------------------------------------------------------------------

fn to_plot_x(t: NaiveDateTime) -> f64 {
    t.and_utc().timestamp() as f64
}

fn format_plot_x(x: f64) -> Option<String> {
    DateTime::from_timestamp(x.round() as i64, 0).map(|dt| dt.format("%m-%d\n%H:%M").to_string())
}

fn legend_corner(anchor: LegendAnchor) -> Corner {
    match anchor {
        LegendAnchor::TopLeft => Corner::LeftTop,
        LegendAnchor::TopRight => Corner::RightTop,
        LegendAnchor::BottomLeft => Corner::LeftBottom,
        LegendAnchor::BottomRight => Corner::RightBottom,
    }
}

// ---------------------------------------------------------------------------
// Dual-axis chart (central panel)
// ---------------------------------------------------------------------------

/// Render the session's current chart in the central panel.
pub fn chart_plot(ui: &mut Ui, session: &ChartSession) {
    let chart = session.chart();
    let layout = &chart.layout;

    let values_on = |axis: AxisSide| {
        chart
            .series_on(axis)
            .map(|s| s.values.as_slice())
            .unwrap_or(&[])
    };
    let mapping = AxisMapping::new(values_on(AxisSide::Primary), values_on(AxisSide::Secondary));

    ui.heading(&layout.title);
    if chart.is_empty() {
        ui.label("No readings in the selected range.");
    }

    let y_axes = vec![
        AxisHints::new_y()
            .label(layout.y_title.clone())
            .placement(HPlacement::Left),
        AxisHints::new_y()
            .label(layout.y2_title.clone())
            .placement(HPlacement::Right)
            .formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
                format!("{:.3}", mapping.to_secondary(mark.value))
            }),
    ];

    let mut plot = Plot::new(&chart.id);
    // New data: drop the remembered zoom/pan.
    if revision_changed(ui.ctx(), Id::new(&chart.id), session.revision()) {
        plot = plot.reset();
    }

    plot
        .legend(Legend::default().position(legend_corner(layout.legend.anchor)))
        .x_axis_label(layout.x_title.clone())
        .x_axis_formatter(|mark, _range| format_plot_x(mark.value).unwrap_or_default())
        .custom_y_axes(y_axes)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for series in &chart.series {
                let points: PlotPoints = chart
                    .points(series)
                    .filter(|(_, v)| v.is_finite())
                    .map(|(t, v)| {
                        let y = match series.axis {
                            AxisSide::Primary => v,
                            AxisSide::Secondary => mapping.to_primary(v),
                        };
                        [to_plot_x(t), y]
                    })
                    .collect();

                let line = Line::new(points)
                    .name(&series.name)
                    .color(channel_color(series.channel))
                    .width(1.5);

                plot_ui.line(line);
            }
        });
}

/// Records `revision` under `id`; `true` when it differs from the last one seen.
fn revision_changed(ctx: &Context, id: Id, revision: u64) -> bool {
    let key = id.with("revision");
    ctx.data_mut(|d| {
        let changed = d.get_temp::<u64>(key) != Some(revision);
        if changed {
            d.insert_temp(key, revision);
        }
        changed
    })
}

/// Shown while the loader is still running or after it failed.
pub fn placeholder(ui: &mut Ui, text: &str) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading(text);
    });
}
