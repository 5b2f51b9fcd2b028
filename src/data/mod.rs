/// Data layer: core types, the data source seam, loading, and filtering.
///
/// Architecture:
/// ```text
///  .parquet / .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  source   │  DataSource::fetch → Vec<RawReading>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  null CO, ingestion window, per-minute dedup, CO2 rescale
///   └──────────┘
///        │
///        ▼
///   ┌─────────┐
///   │ Dataset  │  immutable Vec<TimeSeriesRecord>, bounds()
///   └─────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  RangeSelection → inclusive sub-slice
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod source;
