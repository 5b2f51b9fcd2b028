use chrono::{DurationRound, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use super::model::{Dataset, RawReading, TimeSeriesRecord};
use super::source::{DataSource, DataSourceError};

// ---------------------------------------------------------------------------
// Loader settings
// ---------------------------------------------------------------------------

/// Closed-open interval `[start, end)` over raw reading timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl IngestionWindow {
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }
}

/// How raw rows become a [`Dataset`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoaderSettings {
    pub window: IngestionWindow,
    /// Raw CO2 is divided by this (the analyser reports ppb, the chart ppm).
    pub co2_divisor: f64,
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Turns the raw rows of a [`DataSource`] into an immutable [`Dataset`].
///
/// Pipeline:
/// ```text
///  raw rows ─▶ drop null CO ─▶ window [start, end) ─▶ truncate to minute
///           ─▶ stable sort ─▶ first row per minute ─▶ rescale CO2 ─▶ Dataset
/// ```
pub struct Loader {
    settings: LoaderSettings,
}

impl Loader {
    pub fn new(settings: LoaderSettings) -> Self {
        Self { settings }
    }

    /// Fetch from `source` and build the dataset.
    ///
    /// Fails with [`DataSourceError::Empty`] when nothing survives the
    /// pipeline: without bounds there is nothing the range picker could offer.
    pub fn load(&self, source: &dyn DataSource) -> Result<Dataset, DataSourceError> {
        let window = self.settings.window;
        log::info!(
            "Loading {} (window {} .. {})",
            source.describe(),
            window.start,
            window.end
        );

        let raw = source.fetch()?;
        let fetched = raw.len();
        let records = self.process(raw)?;

        log::debug!(
            "{} raw rows fetched, {} records kept after filtering and per-minute dedup",
            fetched,
            records.len()
        );

        let dataset = Dataset::new(records)?;
        let (first, last) = dataset.bounds();
        log::info!("Loaded {} records spanning {first} .. {last}", dataset.len());
        Ok(dataset)
    }

    fn process(&self, raw: Vec<RawReading>) -> Result<Vec<TimeSeriesRecord>, DataSourceError> {
        let window = self.settings.window;
        let minute = TimeDelta::minutes(1);

        // (minute, raw timestamp, reading) so ties sort by the raw time.
        let mut kept: Vec<(NaiveDateTime, RawReading)> = Vec::with_capacity(raw.len());
        for (row, reading) in raw.into_iter().enumerate() {
            if reading.co.is_none() || !window.contains(reading.timestamp) {
                continue;
            }
            let bucket = reading
                .timestamp
                .duration_trunc(minute)
                .map_err(|e| DataSourceError::Malformed {
                    row,
                    reason: format!("cannot truncate {}: {e}", reading.timestamp),
                })?;
            kept.push((bucket, reading));
        }

        kept.sort_by_key(|(bucket, reading)| (*bucket, reading.timestamp));
        kept.dedup_by_key(|(bucket, _)| *bucket);

        let divisor = self.settings.co2_divisor;
        Ok(kept
            .into_iter()
            .filter_map(|(bucket, reading)| {
                Some(TimeSeriesRecord {
                    timestamp: bucket,
                    co: reading.co?,
                    co2: reading.co2_raw.map_or(f64::NAN, |v| v / divisor),
                    ch4: reading.ch4.unwrap_or(f64::NAN),
                })
            })
            .collect())
    }
}
