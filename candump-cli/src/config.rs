//! Configuration loading and parsing

use crate::chart::{default_charts, ChartSpec};
use anyhow::{Context, Result};
use candump_decoder::{RecordFormat, SignalRegistry, SignalSpec, SinkMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default sink file name, shared by `decode` and `plot`
pub const DEFAULT_SINK: &str = "CANData.txt";

/// Main application configuration (loaded from config.toml)
///
/// Every section is optional; command line flags take precedence.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Extra registry rows on top of the built-in signals
    #[serde(default)]
    pub signals: Vec<SignalSpec>,
    #[serde(default)]
    pub plot: PlotConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    pub log: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub mode: SinkMode,
    #[serde(default)]
    pub format: RecordFormat,
    /// Only decode these identifiers
    pub identifiers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlotConfig {
    /// Sink file to read decoded records from
    pub data: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub charts: Vec<ChartSpec>,
}

impl AppConfig {
    /// Output sink path, falling back to the default file name
    pub fn sink_path(&self) -> PathBuf {
        self.output
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SINK))
    }

    /// Charts to draw: configured ones, or the built-in pair
    pub fn charts(&self) -> Vec<ChartSpec> {
        if self.plot.charts.is_empty() {
            default_charts()
        } else {
            self.plot.charts.clone()
        }
    }

    /// Built-in signals plus the configured extra rows
    pub fn registry(&self) -> Result<SignalRegistry> {
        SignalRegistry::builtin()
            .with_specs(self.signals.iter().cloned())
            .context("Invalid [[signals]] entry in configuration")
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
