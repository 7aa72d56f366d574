//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Values left unset fall back to the
//! configuration file and then to built-in defaults.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// bikedash - descriptive statistics dashboard for daily bike-share data
///
/// Loads a day-level bike-sharing CSV, computes the dashboard aggregates
/// and writes them as a Markdown or JSON report.
///
/// Examples:
///   bikedash
///   bikedash --data data/day.csv --output dashboard.md --describe
///   bikedash --format json --output -
///   bikedash --watch --interval 5
///   bikedash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the daily bike-sharing CSV
    ///
    /// Default: from config or ./day.csv
    #[arg(short, long, value_name = "FILE", env = "BIKEDASH_DATA")]
    pub data: Option<PathBuf>,

    /// Output file path for the dashboard, `-` for stdout
    ///
    /// Default: from config or bike_dashboard.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .bikedash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of bins for the registered vs casual histogram
    #[arg(long, value_name = "COUNT")]
    pub bins: Option<usize>,

    /// Number of raw rows to show at the top of the dashboard
    #[arg(long, value_name = "ROWS", conflicts_with = "no_raw")]
    pub head: Option<usize>,

    /// Leave the raw data view out of the dashboard
    #[arg(long)]
    pub no_raw: bool,

    /// Include per-column descriptive statistics
    #[arg(long)]
    pub describe: bool,

    /// Keep running and re-render whenever the data file changes
    #[arg(short, long)]
    pub watch: bool,

    /// Polling interval in seconds for --watch
    #[arg(long, value_name = "SECS", requires = "watch")]
    pub interval: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .bikedash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the dashboard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.bins == Some(0) {
            return Err("Bins must be at least 1".to_string());
        }

        if self.interval == Some(0) {
            return Err("Interval must be at least 1 second".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.watch && self.writes_to_stdout() {
            return Err("--watch needs an output file, not stdout".to_string());
        }

        if let Some(ref data) = self.data {
            if data.is_dir() {
                return Err(format!("Data path is a directory: {}", data.display()));
            }
        }

        Ok(())
    }

    /// Whether the dashboard is written to stdout.
    pub fn writes_to_stdout(&self) -> bool {
        self.output.as_deref().is_some_and(is_stdout)
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// `-` as an output path means stdout.
pub fn is_stdout(path: &Path) -> bool {
    path.as_os_str() == "-"
}
