use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::model::{Dataset, TimeSeriesRecord};

// ---------------------------------------------------------------------------
// Range selection: the picker's current (start, end)
// ---------------------------------------------------------------------------

/// The interface's current date-range selection. Either end may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeSelection {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl RangeSelection {
    pub fn new(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    /// Build a selection from calendar days picked in the UI.
    ///
    /// Both days map to midnight, so `end` keeps only the readings up to
    /// 00:00 of its day and picking the same day twice selects one instant.
    pub fn from_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let midnight = |d: NaiveDate| d.and_time(NaiveTime::MIN);
        Self {
            start: start.map(midnight),
            end: end.map(midnight),
        }
    }

    /// Both bounds present.
    pub fn bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.start.zip(self.end)
    }

    pub fn is_complete(&self) -> bool {
        self.bounds().is_some()
    }

    /// Complete, with `start` after `end`.
    pub fn is_inverted(&self) -> bool {
        matches!(self.bounds(), Some((s, e)) if s > e)
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Records whose timestamp lies in `[start, end]`, or `None` when the
/// selection is incomplete.
///
/// The result borrows from `dataset`; an inverted selection is an empty slice.
pub fn filter_records<'a>(
    dataset: &'a Dataset,
    selection: &RangeSelection,
) -> Option<&'a [TimeSeriesRecord]> {
    let (start, end) = selection.bounds()?;
    Some(dataset.range(start, end))
}
