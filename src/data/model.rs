use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::source::DataSourceError;

// ---------------------------------------------------------------------------
// RawReading – one row as the data source returns it
// ---------------------------------------------------------------------------

/// A single unprocessed row from the data source.
///
/// Channels are optional because the analyser export contains nulls; the
/// loader decides what to keep.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    /// Acquisition time (UTC), full source resolution.
    pub timestamp: NaiveDateTime,
    pub co: Option<f64>,
    /// CO2 in the source unit, before rescaling.
    pub co2_raw: Option<f64>,
    pub ch4: Option<f64>,
}

// ---------------------------------------------------------------------------
// TimeSeriesRecord – one row of the loaded dataset
// ---------------------------------------------------------------------------

/// One reading at minute granularity.
///
/// `co2` is already divided by the loader's divisor. Missing `co2`/`ch4`
/// values are `NaN`; `co` is always present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    pub timestamp: NaiveDateTime,
    pub co: f64,
    pub co2: f64,
    pub ch4: f64,
}

// ---------------------------------------------------------------------------
// Channel – addressable measurement columns
// ---------------------------------------------------------------------------

/// The measured channels carried by every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    Co,
    Co2,
    Ch4,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Co, Channel::Co2, Channel::Ch4];

    /// Read this channel's value from a record.
    pub fn value(self, record: &TimeSeriesRecord) -> f64 {
        match self {
            Channel::Co => record.co,
            Channel::Co2 => record.co2,
            Channel::Ch4 => record.ch4,
        }
    }

    /// Display label, as used for series names.
    pub fn label(self) -> &'static str {
        match self {
            Channel::Co => "CO",
            Channel::Co2 => "CO2",
            Channel::Ch4 => "CH4",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded time series
// ---------------------------------------------------------------------------

/// An immutable, non-empty, time-ordered series of records.
///
/// Timestamps are unique and strictly ascending, which is what lets
/// [`Dataset::range`] binary-search instead of scanning.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<TimeSeriesRecord>,
}

impl Dataset {
    /// Wrap already-ordered records. Fails on an empty input since an empty
    /// dataset has no bounds.
    pub fn new(records: Vec<TimeSeriesRecord>) -> Result<Self, DataSourceError> {
        if records.is_empty() {
            return Err(DataSourceError::Empty);
        }
        debug_assert!(
            records.windows(2).all(|w| w[0].timestamp < w[1].timestamp),
            "dataset timestamps must be unique and ascending"
        );
        Ok(Dataset { records })
    }

    /// All records in time order.
    pub fn records(&self) -> &[TimeSeriesRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Earliest and latest timestamp.
    pub fn bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        // Non-empty by construction.
        let first = self.records[0].timestamp;
        let last = self.records[self.records.len() - 1].timestamp;
        (first, last)
    }

    /// Records with `start <= timestamp <= end`, as a borrowed sub-slice.
    ///
    /// An inverted interval (`start > end`) yields an empty slice.
    pub fn range(&self, start: NaiveDateTime, end: NaiveDateTime) -> &[TimeSeriesRecord] {
        if start > end {
            return &[];
        }
        let lo = self.records.partition_point(|r| r.timestamp < start);
        let hi = self.records.partition_point(|r| r.timestamp <= end);
        &self.records[lo..hi]
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::{Dataset, TimeSeriesRecord};

    /// 2024-03-01 at the given hour/minute.
    pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .unwrap()
    }

    pub fn record(minute: u32, co: f64, ch4: f64) -> TimeSeriesRecord {
        TimeSeriesRecord {
            timestamp: at(0, minute),
            co,
            co2: 420.0 + minute as f64,
            ch4,
        }
    }

    /// Three readings at 00:00, 00:01, 00:02.
    pub fn three_minutes() -> Dataset {
        Dataset::new(vec![
            record(0, 1.0, 10.0),
            record(1, 2.0, 20.0),
            record(2, 3.0, 30.0),
        ])
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{at, record, three_minutes};
    use super::*;

    #[test]
    fn empty_dataset_is_rejected() {
        let err = Dataset::new(Vec::new()).unwrap_err();
        assert!(matches!(err, DataSourceError::Empty));
    }

    #[test]
    fn bounds_are_first_and_last_timestamps() {
        let ds = three_minutes();
        assert_eq!(ds.bounds(), (at(0, 0), at(0, 2)));

        let single = Dataset::new(vec![record(7, 1.0, 1.0)]).unwrap();
        assert_eq!(single.bounds(), (at(0, 7), at(0, 7)));
    }

    #[test]
    fn range_is_inclusive_on_both_ends() {
        let ds = three_minutes();
        let view = ds.range(at(0, 0), at(0, 1));
        let stamps: Vec<_> = view.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![at(0, 0), at(0, 1)]);

        assert_eq!(ds.range(at(0, 2), at(0, 2)).len(), 1);
    }

    #[test]
    fn range_between_records_and_outside_is_empty() {
        let ds = three_minutes();
        assert!(ds.range(at(0, 3), at(0, 4)).is_empty());
        assert!(ds.range(at(23, 0), at(23, 30)).is_empty());
    }

    #[test]
    fn inverted_range_is_empty() {
        let ds = three_minutes();
        assert!(ds.range(at(0, 2), at(0, 0)).is_empty());
    }

    #[test]
    fn channel_reads_matching_field() {
        let r = record(1, 2.0, 20.0);
        assert_eq!(Channel::Co.value(&r), 2.0);
        assert_eq!(Channel::Co2.value(&r), 421.0);
        assert_eq!(Channel::Ch4.value(&r), 20.0);
        assert_eq!(Channel::Ch4.to_string(), "CH4");
    }
}
