//! Chart description: the renderer-independent output of every filter event.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::data::model::{Channel, TimeSeriesRecord};

/// Plot identity shared by the initial chart and every redraw.
pub const CHART_ID: &str = "cru-g2401-plot";

/// Channels drawn on the chart and the axis each one is bound to.
/// CO2 is carried by the data model but not plotted.
pub const PLOTTED_CHANNELS: [(Channel, AxisSide); 2] = [
    (Channel::Co, AxisSide::Primary),
    (Channel::Ch4, AxisSide::Secondary),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisSide {
    /// Left y-axis.
    Primary,
    /// Right y-axis.
    Secondary,
}

/// Where the legend box is anchored, in fractions of the plot area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegendPlacement {
    pub anchor: LegendAnchor,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegendAnchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Default for LegendPlacement {
    fn default() -> Self {
        Self {
            anchor: LegendAnchor::TopLeft,
            x: 0.01,
            y: 0.99,
        }
    }
}

/// Titles and decorations. Fixed for the lifetime of a controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartLayout {
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub y2_title: String,
    pub legend: LegendPlacement,
    pub template: String,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            title: "Cruiser G2401 Data".to_string(),
            x_title: "Date".to_string(),
            y_title: Channel::Co.label().to_string(),
            y2_title: Channel::Ch4.label().to_string(),
            legend: LegendPlacement::default(),
            template: "simple_white".to_string(),
        }
    }
}

/// One plotted line. Values are aligned with [`ChartDescription::timestamps`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub channel: Channel,
    pub axis: AxisSide,
    pub values: Vec<f64>,
}

/// A complete, freshly built dual-axis chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDescription {
    pub id: String,
    pub layout: ChartLayout,
    pub timestamps: Vec<NaiveDateTime>,
    pub series: Vec<Series>,
}

impl ChartDescription {
    /// `(timestamp, value)` pairs of one series.
    pub fn points<'a>(&'a self, series: &'a Series) -> impl Iterator<Item = (NaiveDateTime, f64)> + 'a {
        self.timestamps.iter().copied().zip(series.values.iter().copied())
    }

    /// The series bound to `axis`.
    pub fn series_on(&self, axis: AxisSide) -> Option<&Series> {
        self.series.iter().find(|s| s.axis == axis)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Build a chart from an ordered record slice: CO on the primary axis, CH4
/// on the secondary axis, both sharing the record timestamps.
pub fn build_chart(records: &[TimeSeriesRecord], layout: &ChartLayout) -> ChartDescription {
    let timestamps = records.iter().map(|r| r.timestamp).collect();
    let series = PLOTTED_CHANNELS
        .iter()
        .map(|&(channel, axis)| Series {
            name: channel.label().to_string(),
            channel,
            axis,
            values: records.iter().map(|r| channel.value(r)).collect(),
        })
        .collect();

    ChartDescription {
        id: CHART_ID.to_string(),
        layout: layout.clone(),
        timestamps,
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::{at, three_minutes};

    #[test]
    fn full_dataset_chart_mirrors_records() {
        let ds = three_minutes();
        let chart = build_chart(ds.records(), &ChartLayout::default());

        assert_eq!(chart.id, CHART_ID);
        assert_eq!(chart.timestamps, vec![at(0, 0), at(0, 1), at(0, 2)]);
        assert_eq!(chart.series.len(), 2);
        for s in &chart.series {
            assert_eq!(s.values.len(), ds.len());
        }
    }

    #[test]
    fn co_is_primary_and_ch4_secondary() {
        let ds = three_minutes();
        let chart = build_chart(ds.records(), &ChartLayout::default());

        let primary = chart.series_on(AxisSide::Primary).unwrap();
        let secondary = chart.series_on(AxisSide::Secondary).unwrap();
        assert_eq!((primary.name.as_str(), primary.channel), ("CO", Channel::Co));
        assert_eq!((secondary.name.as_str(), secondary.channel), ("CH4", Channel::Ch4));
        assert_eq!(primary.values, vec![1.0, 2.0, 3.0]);
        assert_eq!(secondary.values, vec![10.0, 20.0, 30.0]);
        assert!(chart.series.iter().all(|s| s.channel != Channel::Co2));
    }

    #[test]
    fn points_pair_values_with_timestamps() {
        let ds = three_minutes();
        let chart = build_chart(&ds.records()[1..], &ChartLayout::default());
        let ch4 = chart.series_on(AxisSide::Secondary).unwrap();
        let pts: Vec<_> = chart.points(ch4).collect();
        assert_eq!(pts, vec![(at(0, 1), 20.0), (at(0, 2), 30.0)]);
    }

    #[test]
    fn empty_slice_gives_empty_series() {
        let chart = build_chart(&[], &ChartLayout::default());
        assert!(chart.is_empty());
        assert_eq!(chart.series.len(), 2);
        assert!(chart.series.iter().all(|s| s.values.is_empty()));
    }

    #[test]
    fn default_layout_matches_dashboard() {
        let layout = ChartLayout::default();
        assert_eq!(layout.title, "Cruiser G2401 Data");
        assert_eq!(layout.x_title, "Date");
        assert_eq!((layout.y_title.as_str(), layout.y2_title.as_str()), ("CO", "CH4"));
        assert_eq!(layout.legend.anchor, LegendAnchor::TopLeft);
    }

    #[test]
    fn serializes_to_json() {
        let ds = three_minutes();
        let chart = build_chart(&ds.records()[..1], &ChartLayout::default());
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["id"], CHART_ID);
        assert_eq!(json["series"][0]["axis"], "Primary");
        assert_eq!(json["timestamps"][0], "2024-03-01T00:00:00");
    }
}
