//! Unit tests for the chart controller

use std::sync::Arc;
use std::thread;

use super::{ChartController, ChartUpdate};
use crate::chart::{AxisSide, ChartDescription, ChartLayout};
use crate::data::filter::RangeSelection;
use crate::data::model::fixtures::{at, record, three_minutes};
use crate::data::model::Dataset;

fn controller() -> ChartController {
    ChartController::new(three_minutes(), ChartLayout::default())
}

fn updated(update: ChartUpdate) -> ChartDescription {
    match update {
        ChartUpdate::Updated(chart) => chart,
        ChartUpdate::NoUpdate => panic!("expected an updated chart"),
    }
}

fn values(chart: &ChartDescription, axis: AxisSide) -> Vec<f64> {
    chart.series_on(axis).unwrap().values.clone()
}

#[test]
fn test_initial_chart_covers_dataset() {
    let c = controller();
    let chart = c.initial_chart();
    assert_eq!(chart.timestamps, vec![at(0, 0), at(0, 1), at(0, 2)]);
    assert_eq!(values(&chart, AxisSide::Primary), vec![1.0, 2.0, 3.0]);
    assert_eq!(values(&chart, AxisSide::Secondary), vec![10.0, 20.0, 30.0]);
}

#[test]
fn test_selectable_bounds() {
    assert_eq!(controller().selectable_bounds(), (at(0, 0), at(0, 2)));
}

#[test]
fn test_unset_bounds_give_no_update() {
    let c = controller();
    assert_eq!(c.on_range_changed(None, None), ChartUpdate::NoUpdate);
    assert_eq!(c.on_range_changed(Some(at(0, 0)), None), ChartUpdate::NoUpdate);
    assert_eq!(c.on_range_changed(None, Some(at(0, 1))), ChartUpdate::NoUpdate);
}

#[test]
fn test_end_to_end_example() {
    let c = controller();

    let chart = updated(c.on_range_changed(Some(at(0, 0)), Some(at(0, 1))));
    assert_eq!(chart.timestamps, vec![at(0, 0), at(0, 1)]);
    assert_eq!(values(&chart, AxisSide::Primary), vec![1.0, 2.0]);
    assert_eq!(values(&chart, AxisSide::Secondary), vec![10.0, 20.0]);

    let chart = updated(c.on_range_changed(Some(at(0, 3)), Some(at(0, 4))));
    assert!(chart.timestamps.is_empty());
    assert!(values(&chart, AxisSide::Primary).is_empty());
    assert!(values(&chart, AxisSide::Secondary).is_empty());
}

#[test]
fn test_min_min_selects_single_point() {
    let c = controller();
    let (min, _) = c.selectable_bounds();
    let chart = updated(c.on_range_changed(Some(min), Some(min)));
    assert_eq!(chart.timestamps, vec![min]);
    assert_eq!(values(&chart, AxisSide::Primary), vec![1.0]);
    assert_eq!(values(&chart, AxisSide::Secondary), vec![10.0]);
}

#[test]
fn test_window_before_dataset_is_empty_chart() {
    let day = chrono::TimeDelta::days(1);
    let chart = updated(controller().on_range_changed(Some(at(0, 0) - day * 2), Some(at(0, 0) - day)));
    assert!(chart.is_empty());
    assert_eq!(chart.series.len(), 2);
}

#[test]
fn test_inverted_selection_is_empty_chart() {
    let chart = updated(controller().on_range_changed(Some(at(0, 2)), Some(at(0, 0))));
    assert!(chart.is_empty());
}

#[test]
fn test_repeated_event_is_identical() {
    let c = controller();
    let first = c.on_range_changed(Some(at(0, 1)), Some(at(0, 2)));
    let second = c.on_range_changed(Some(at(0, 1)), Some(at(0, 2)));
    assert_eq!(first, second);

    // Compare the serialized form too, so NaN-free output is byte-identical.
    let a = serde_json::to_string(&updated(first)).unwrap();
    let b = serde_json::to_string(&updated(second)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_layout_is_shared_by_all_charts() {
    let c = controller();
    let initial = c.initial_chart();
    let filtered = updated(c.on_range_changed(Some(at(0, 1)), Some(at(0, 1))));
    assert_eq!(initial.id, filtered.id);
    assert_eq!(initial.layout, filtered.layout);
    let names = |chart: &ChartDescription| {
        chart
            .series
            .iter()
            .map(|s| (s.name.clone(), s.axis))
            .collect::<Vec<_>>()
    };
    assert_eq!(names(&initial), names(&filtered));
}

#[test]
fn test_filtered_timestamps_match_inclusive_subset() {
    let records: Vec<_> = (0..30).map(|m| record(m, m as f64, 100.0 + m as f64)).collect();
    let ds = Dataset::new(records.clone()).unwrap();
    let c = ChartController::new(ds, ChartLayout::default());

    for (s, e) in [(0, 29), (5, 5), (7, 19), (28, 40)] {
        let chart = updated(c.build_chart(&RangeSelection::new(Some(at(0, s)), Some(at(0, e)))));
        let expected: Vec<_> = records
            .iter()
            .filter(|r| at(0, s) <= r.timestamp && r.timestamp <= at(0, e))
            .collect();
        assert_eq!(chart.len(), expected.len(), "range {s}..{e}");
        for (i, r) in expected.iter().enumerate() {
            assert_eq!(chart.timestamps[i], r.timestamp);
            assert_eq!(values(&chart, AxisSide::Primary)[i], r.co);
            assert_eq!(values(&chart, AxisSide::Secondary)[i], r.ch4);
        }
    }
}

#[test]
fn test_concurrent_readers_agree() {
    let c = Arc::new(controller());
    let expected = c.on_range_changed(Some(at(0, 0)), Some(at(0, 1)));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let c = Arc::clone(&c);
            thread::spawn(move || c.on_range_changed(Some(at(0, 0)), Some(at(0, 1))))
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap(), expected);
    }
}
