//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.bikedash.toml` files.

use crate::analysis::{DashboardOptions, DEFAULT_BINS};
use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".bikedash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Input data settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Watch mode settings.
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Input dataset settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the daily CSV.
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("day.csv")
}

/// Dashboard report settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output file path, `-` for stdout.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Bins for the registered vs casual histogram.
    #[serde(default = "default_bins")]
    pub histogram_bins: usize,

    /// Rows in the raw data view.
    #[serde(default = "default_head_rows")]
    pub head_rows: usize,

    /// Include the raw data view.
    #[serde(default = "default_true")]
    pub include_raw: bool,

    /// Include per-column descriptive statistics.
    #[serde(default)]
    pub include_describe: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
            histogram_bins: default_bins(),
            head_rows: default_head_rows(),
            include_raw: true,
            include_describe: false,
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("bike_dashboard.md")
}

fn default_bins() -> usize {
    DEFAULT_BINS
}

fn default_head_rows() -> usize {
    5
}

fn default_true() -> bool {
    true
}

/// Watch mode settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Seconds between modification-time checks.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> u64 {
    2
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.bikedash.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.data.path = data.clone();
        }
        if let Some(ref output) = args.output {
            self.report.output = output.clone();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(bins) = args.bins {
            self.report.histogram_bins = bins;
        }
        if let Some(head) = args.head {
            self.report.head_rows = head;
            self.report.include_raw = true;
        }
        if let Some(interval) = args.interval {
            self.watch.poll_interval_seconds = interval;
        }

        // Flags always override
        if args.no_raw {
            self.report.include_raw = false;
        }
        if args.describe {
            self.report.include_describe = true;
        }
    }

    /// Aggregation options derived from the report settings.
    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            histogram_bins: self.report.histogram_bins.max(1),
            head_rows: self.report.include_raw.then_some(self.report.head_rows),
            include_describe: self.report.include_describe,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
