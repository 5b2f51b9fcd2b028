//! Range-filtered chart controller.
//!
//! Owns the loaded [`Dataset`] and hands out chart descriptions built from it.
//! The dataset never leaves the controller; callers only see charts and the
//! selectable bounds.

use chrono::NaiveDateTime;

use crate::chart::{build_chart, ChartDescription, ChartLayout};
use crate::data::filter::{filter_records, RangeSelection};
use crate::data::model::Dataset;

/// Outcome of a range-change event.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum ChartUpdate {
    /// Replace the rendered chart with this one.
    Updated(ChartDescription),
    /// Keep the previously rendered chart exactly as it is.
    NoUpdate,
}

impl ChartUpdate {
    pub fn into_chart(self) -> Option<ChartDescription> {
        match self {
            ChartUpdate::Updated(chart) => Some(chart),
            ChartUpdate::NoUpdate => None,
        }
    }
}

/// Immutable after construction, so one controller can serve any number of
/// concurrent readers behind an `Arc` without locking.
#[derive(Debug)]
pub struct ChartController {
    dataset: Dataset,
    layout: ChartLayout,
}

impl ChartController {
    pub fn new(dataset: Dataset, layout: ChartLayout) -> Self {
        Self { dataset, layout }
    }

    /// Chart of the whole dataset.
    pub fn initial_chart(&self) -> ChartDescription {
        build_chart(self.dataset.records(), &self.layout)
    }

    /// Earliest and latest loaded timestamps, for bounding the range picker.
    pub fn selectable_bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        self.dataset.bounds()
    }

    /// Number of loaded records.
    pub fn record_count(&self) -> usize {
        self.dataset.len()
    }

    /// React to the picker changing. Either bound missing means `NoUpdate`.
    pub fn on_range_changed(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> ChartUpdate {
        self.build_chart(&RangeSelection::new(start, end))
    }

    /// Chart for `selection`, filtered inclusively on both ends.
    ///
    /// An inverted selection yields an empty chart rather than an error, the
    /// same as any other range that matches no records.
    pub fn build_chart(&self, selection: &RangeSelection) -> ChartUpdate {
        if !selection.is_complete() {
            log::debug!("Range selection incomplete, keeping current chart");
            return ChartUpdate::NoUpdate;
        }
        let records = filter_records(&self.dataset, selection).unwrap_or_default();

        if selection.is_inverted() {
            log::debug!("Inverted range selection {selection:?}, rendering empty chart");
        } else {
            log::debug!(
                "Range {:?} .. {:?} selects {} of {} records",
                selection.start,
                selection.end,
                records.len(),
                self.dataset.len()
            );
        }

        ChartUpdate::Updated(build_chart(records, &self.layout))
    }
}

#[cfg(test)]
mod tests;
