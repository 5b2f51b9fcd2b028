use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::chart::ChartLayout;
use crate::data::loader::{IngestionWindow, LoaderSettings};

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV: &str = "G2401_CONFIG";
/// Environment variable overriding `source.path`.
pub const DATA_PATH_ENV: &str = "G2401_DATA_PATH";

const DEFAULT_CONFIG_PATH: &str = "g2401.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Exported analyser file (`.parquet`, `.csv` or `.json`).
    pub path: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("g2401_sample.parquet"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub ingestion: IngestionWindow,
    pub co2_divisor: f64,
    pub chart: ChartLayout,
}

impl Default for AppConfig {
    fn default() -> Self {
        // First hour of the March 2024 cruise.
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default();
        let start = day.and_hms_opt(0, 0, 0).unwrap_or_default();
        let end = day.and_hms_opt(1, 0, 0).unwrap_or_default();
        Self {
            source: SourceConfig::default(),
            ingestion: IngestionWindow { start, end },
            co2_divisor: 1000.0,
            chart: ChartLayout::default(),
        }
    }
}

impl AppConfig {
    /// Load from `$G2401_CONFIG` (or `g2401.json`) and apply environment
    /// overrides.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut config = Self::load(&path)?;
        if let Some(data_path) = std::env::var_os(DATA_PATH_ENV) {
            config.source.path = PathBuf::from(data_path);
        }
        config.validate()?;
        Ok(config)
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!("Config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.co2_divisor.is_finite() || self.co2_divisor == 0.0 {
            bail!("co2_divisor must be a finite non-zero number, got {}", self.co2_divisor);
        }
        if self.ingestion.start >= self.ingestion.end {
            bail!(
                "ingestion window is empty: {} is not before {}",
                self.ingestion.start,
                self.ingestion.end
            );
        }
        Ok(())
    }

    pub fn loader_settings(&self) -> LoaderSettings {
        LoaderSettings {
            window: self.ingestion,
            co2_divisor: self.co2_divisor,
        }
    }
}
