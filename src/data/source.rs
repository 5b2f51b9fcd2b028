use std::path::PathBuf;

use arrow::array::{Array, ArrayRef, AsArray, TimestampMillisecondArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::RawReading;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures while obtaining the dataset. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("data source {target} is unreachable")]
    Unreachable {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported data source format: .{0}")]
    UnsupportedFormat(String),

    #[error("cannot decode {target}: {message}")]
    Decode { target: String, message: String },

    #[error("row {row}: {reason}")]
    Malformed { row: usize, reason: String },

    #[error("data source returned no readings")]
    Empty,
}

// ---------------------------------------------------------------------------
// DataSource – the seam the loader depends on
// ---------------------------------------------------------------------------

/// Anything that can hand back the raw analyser rows.
///
/// Implementations own their connection: it is acquired inside `fetch` and
/// released before `fetch` returns, on success and on error alike.
pub trait DataSource: Send + Sync {
    /// Human-readable location, used in logs.
    fn describe(&self) -> String;

    /// Return every raw row the source holds, in source order.
    fn fetch(&self) -> Result<Vec<RawReading>, DataSourceError>;
}

const TIMESTAMP_COLUMNS: [&str; 2] = ["datetime", "timestamp"];
const CO_COLUMNS: [&str; 2] = ["co", "co_r"];
const CO2_COLUMNS: [&str; 2] = ["co2", "co2_r"];
const CH4_COLUMNS: [&str; 2] = ["ch4", "ch4_r"];

/// A data source backed by an exported file. Dispatches by extension.
///
/// Supported formats:
/// * `.parquet` / `.pq` – columns `datetime`, `co`, `co2`, `ch4`
/// * `.csv`   – same columns with a header row
/// * `.json`  – `[{ "datetime": "...", "co": 0.1, "co2": 421000.0, "ch4": 2.0 }, ...]`
///
/// The `_r` suffixed names of the analyser table (`co_r`, ...) are accepted too.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn target(&self) -> String {
        self.path.display().to_string()
    }

    fn unreachable(&self, source: std::io::Error) -> DataSourceError {
        DataSourceError::Unreachable {
            target: self.target(),
            source,
        }
    }

    fn decode(&self, message: impl Into<String>) -> DataSourceError {
        DataSourceError::Decode {
            target: self.target(),
            message: message.into(),
        }
    }
}

impl DataSource for FileSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    fn fetch(&self) -> Result<Vec<RawReading>, DataSourceError> {
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "parquet" | "pq" => self.read_parquet(),
            "json" => self.read_json(),
            "csv" => self.read_csv(),
            other => Err(DataSourceError::UnsupportedFormat(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Text helpers shared by the CSV and JSON readers
// ---------------------------------------------------------------------------

/// Parse a textual timestamp as UTC.
///
/// Accepts `YYYY-MM-DD HH:MM:SS[.f]`, the `T`-separated variant, and RFC 3339
/// with an offset (converted to UTC).
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

fn parse_optional_float(text: &str, row: usize, column: &str) -> Result<Option<f64>, DataSourceError> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("null") || text.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| DataSourceError::Malformed {
            row,
            reason: format!("{column}: '{text}' is not a number"),
        })
}

fn find_column<'a>(names: impl Iterator<Item = &'a str> + Clone, aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| names.clone().position(|n| n.eq_ignore_ascii_case(alias)))
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

impl FileSource {
    fn read_csv(&self) -> Result<Vec<RawReading>, DataSourceError> {
        let file = std::fs::File::open(&self.path).map_err(|e| self.unreachable(e))?;
        let mut reader = csv::Reader::from_reader(file);
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| self.decode(format!("reading CSV headers: {e}")))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let names = headers.iter().map(String::as_str);

        let ts_idx = find_column(names.clone(), &TIMESTAMP_COLUMNS)
            .ok_or_else(|| self.decode("missing 'datetime' column"))?;
        let co_idx = find_column(names.clone(), &CO_COLUMNS)
            .ok_or_else(|| self.decode("missing 'co' column"))?;
        let co2_idx = find_column(names.clone(), &CO2_COLUMNS);
        let ch4_idx = find_column(names, &CH4_COLUMNS);

        let mut readings = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(|e| DataSourceError::Malformed {
                row,
                reason: e.to_string(),
            })?;
            let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");

            let raw_ts = cell(Some(ts_idx));
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| DataSourceError::Malformed {
                row,
                reason: format!("'{raw_ts}' is not a timestamp"),
            })?;

            readings.push(RawReading {
                timestamp,
                co: parse_optional_float(cell(Some(co_idx)), row, "co")?,
                co2_raw: parse_optional_float(cell(co2_idx), row, "co2")?,
                ch4: parse_optional_float(cell(ch4_idx), row, "ch4")?,
            });
        }
        Ok(readings)
    }
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

impl FileSource {
    /// Records-oriented JSON, the shape of `df.to_json(orient='records')`.
    fn read_json(&self) -> Result<Vec<RawReading>, DataSourceError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| self.unreachable(e))?;
        let root: JsonValue =
            serde_json::from_str(&text).map_err(|e| self.decode(format!("parsing JSON: {e}")))?;
        let rows = root
            .as_array()
            .ok_or_else(|| self.decode("expected a top-level JSON array"))?;

        rows.iter()
            .enumerate()
            .map(|(row, value)| {
                let obj = value.as_object().ok_or_else(|| DataSourceError::Malformed {
                    row,
                    reason: "not a JSON object".to_string(),
                })?;
                let field = |aliases: &[&str]| aliases.iter().find_map(|a| obj.get(*a));

                let timestamp = field(&TIMESTAMP_COLUMNS)
                    .and_then(JsonValue::as_str)
                    .and_then(parse_timestamp)
                    .ok_or_else(|| DataSourceError::Malformed {
                        row,
                        reason: "missing or invalid 'datetime'".to_string(),
                    })?;

                Ok(RawReading {
                    timestamp,
                    co: json_number(field(&CO_COLUMNS), row, "co")?,
                    co2_raw: json_number(field(&CO2_COLUMNS), row, "co2")?,
                    ch4: json_number(field(&CH4_COLUMNS), row, "ch4")?,
                })
            })
            .collect()
    }
}

fn json_number(value: Option<&JsonValue>, row: usize, column: &str) -> Result<Option<f64>, DataSourceError> {
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => Ok(n.as_f64()),
        Some(JsonValue::String(s)) => parse_optional_float(s, row, column),
        Some(other) => Err(DataSourceError::Malformed {
            row,
            reason: format!("{column}: {other} is not a number"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

impl FileSource {
    /// Works with files written by Pandas (`df.to_parquet()`), Polars, and
    /// the bundled `generate_sample` binary.
    fn read_parquet(&self) -> Result<Vec<RawReading>, DataSourceError> {
        let file = std::fs::File::open(&self.path).map_err(|e| self.unreachable(e))?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| self.decode(format!("reading parquet metadata: {e}")))?;
        let reader = builder
            .build()
            .map_err(|e| self.decode(format!("building parquet reader: {e}")))?;

        let mut readings = Vec::new();
        for batch_result in reader {
            let batch = batch_result.map_err(|e| self.decode(format!("reading record batch: {e}")))?;
            self.append_batch(&batch, &mut readings)?;
        }
        Ok(readings)
    }

    fn append_batch(&self, batch: &RecordBatch, out: &mut Vec<RawReading>) -> Result<(), DataSourceError> {
        let schema = batch.schema();
        let names = schema.fields().iter().map(|f| f.name().as_str());

        let ts_idx = find_column(names.clone(), &TIMESTAMP_COLUMNS)
            .ok_or_else(|| self.decode("missing 'datetime' column"))?;
        let co_idx = find_column(names.clone(), &CO_COLUMNS)
            .ok_or_else(|| self.decode("missing 'co' column"))?;
        let co2_idx = find_column(names.clone(), &CO2_COLUMNS);
        let ch4_idx = find_column(names, &CH4_COLUMNS);

        let ts = cast(
            batch.column(ts_idx),
            &DataType::Timestamp(TimeUnit::Millisecond, None),
        )
        .map_err(|e| self.decode(format!("'datetime' column: {e}")))?;
        let ts = ts
            .as_any()
            .downcast_ref::<TimestampMillisecondArray>()
            .ok_or_else(|| self.decode("'datetime' column is not a timestamp"))?;

        let co = self.float_column(batch, Some(co_idx))?;
        let co2 = self.float_column(batch, co2_idx)?;
        let ch4 = self.float_column(batch, ch4_idx)?;

        let offset = out.len();
        for row in 0..batch.num_rows() {
            let timestamp = (!ts.is_null(row))
                .then(|| ts.value_as_datetime(row))
                .flatten()
                .ok_or_else(|| DataSourceError::Malformed {
                    row: offset + row,
                    reason: "null or out-of-range timestamp".to_string(),
                })?;
            out.push(RawReading {
                timestamp,
                co: float_at(co.as_ref(), row),
                co2_raw: float_at(co2.as_ref(), row),
                ch4: float_at(ch4.as_ref(), row),
            });
        }
        Ok(())
    }

    /// Cast a numeric column to Float64. A missing optional column is `None`.
    fn float_column(&self, batch: &RecordBatch, idx: Option<usize>) -> Result<Option<ArrayRef>, DataSourceError> {
        idx.map(|i| {
            cast(batch.column(i), &DataType::Float64)
                .map_err(|e| self.decode(format!("column {i} is not numeric: {e}")))
        })
        .transpose()
    }
}

fn float_at(col: Option<&ArrayRef>, row: usize) -> Option<f64> {
    let col = col?;
    if col.is_null(row) {
        return None;
    }
    Some(col.as_primitive::<Float64Type>().value(row))
}
