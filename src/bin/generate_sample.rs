//! Writes a synthetic raw G2401 export for trying out the viewer.
//!
//! Usage: `generate_sample [PATH]` where PATH ends in `.parquet` (default
//! `g2401_sample.parquet`) or `.csv`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Float64Array, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use parquet::arrow::ArrowWriter;

/// Seconds between analyser readings.
const CADENCE_SECS: i64 = 20;
/// Runs ten minutes past the default ingestion window.
const DURATION_MINUTES: i64 = 70;

/// Minimal deterministic PRNG (xorshift64*)
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct Row {
    timestamp: NaiveDateTime,
    co: Option<f64>,
    co2_raw: Option<f64>,
    ch4: Option<f64>,
}

fn generate_rows(rng: &mut SimpleRng) -> Result<Vec<Row>> {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;

    let steps = DURATION_MINUTES * 60 / CADENCE_SECS;
    let mut rows = Vec::with_capacity(steps as usize);
    for i in 0..steps {
        // Small jitter so several readings land in the same minute unevenly.
        let jitter = (rng.next_f64() * 3.0) as i64;
        let timestamp = start + TimeDelta::seconds(i * CADENCE_SECS + jitter);
        let phase = i as f64 / steps as f64 * std::f64::consts::TAU;

        // A plume passes through around the 25 minute mark.
        let plume = (-((i as f64 * CADENCE_SECS as f64 / 60.0 - 25.0).powi(2)) / 8.0).exp();

        let co = 0.12 + 0.35 * plume + rng.gauss(0.0, 0.004);
        let co2_ppb = 421_000.0 + 9_000.0 * plume + 400.0 * phase.sin() + rng.gauss(0.0, 150.0);
        let ch4 = 2.02 + 0.15 * plume + rng.gauss(0.0, 0.002);

        rows.push(Row {
            timestamp,
            // The analyser drops CO now and then.
            co: (rng.next_f64() > 0.03).then_some(co),
            co2_raw: (rng.next_f64() > 0.01).then_some(co2_ppb),
            ch4: Some(ch4),
        });
    }
    Ok(rows)
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("datetime", DataType::Timestamp(TimeUnit::Millisecond, None), false),
        Field::new("co_r", DataType::Float64, true),
        Field::new("co2_r", DataType::Float64, true),
        Field::new("ch4_r", DataType::Float64, true),
    ]));

    let datetime = TimestampMillisecondArray::from(
        rows.iter()
            .map(|r| r.timestamp.and_utc().timestamp_millis())
            .collect::<Vec<_>>(),
    );
    let co = Float64Array::from(rows.iter().map(|r| r.co).collect::<Vec<_>>());
    let co2 = Float64Array::from(rows.iter().map(|r| r.co2_raw).collect::<Vec<_>>());
    let ch4 = Float64Array::from(rows.iter().map(|r| r.ch4).collect::<Vec<_>>());

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(datetime), Arc::new(co), Arc::new(co2), Arc::new(ch4)],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["datetime", "co_r", "co2_r", "ch4_r"])?;

    let cell = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    for r in rows {
        writer.write_record([
            r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            cell(r.co),
            cell(r.co2_raw),
            cell(r.ch4),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "g2401_sample.parquet".to_string());
    let path = Path::new(&output);

    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng)?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "parquet" | "pq" => write_parquet(path, &rows)?,
        "csv" => write_csv(path, &rows)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    println!("Wrote {} raw readings to {output}", rows.len());
    Ok(())
}
