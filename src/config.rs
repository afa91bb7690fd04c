//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.covid-metrics.toml` files.

use crate::models::{
    MetricParams, DEFAULT_LOOKBACK_DAYS, DEFAULT_TOP_N, DEFAULT_TRAILING_DAYS, DEFAULT_WINDOW,
};
use crate::source::DEFAULT_SOURCE_URL;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".covid-metrics.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Data source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Metric parameters.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Dataset endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Dataset endpoint URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// Maximum rows requested.
    #[serde(default = "default_limit")]
    pub limit: u64,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            limit: default_limit(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_limit() -> u64 {
    300_000
}

fn default_timeout() -> u64 {
    120
}

/// Metric window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Date up to which total tests are counted. Yesterday when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of_date: Option<NaiveDate>,

    /// Rolling average window in days.
    #[serde(default = "default_window")]
    pub window: usize,

    /// Number of most recent rolling average values to report.
    #[serde(default = "default_trailing_days")]
    pub trailing_days: usize,

    /// Days before today covered by the positivity ranking.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: usize,

    /// Number of states in the positivity ranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            as_of_date: None,
            window: default_window(),
            trailing_days: default_trailing_days(),
            lookback_days: default_lookback_days(),
            top_n: default_top_n(),
        }
    }
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}

fn default_trailing_days() -> usize {
    DEFAULT_TRAILING_DAYS
}

fn default_lookback_days() -> usize {
    DEFAULT_LOOKBACK_DAYS
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl MetricsConfig {
    /// Resolve the parameters against `today`.
    pub fn to_params(&self, today: NaiveDate) -> MetricParams {
        let defaults = MetricParams::defaults_for(today);
        MetricParams {
            as_of_date: self.as_of_date.unwrap_or(defaults.as_of_date),
            window: self.window,
            trailing_days: self.trailing_days,
            lookback_days: self.lookback_days,
            top_n: self.top_n,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Check the values a config file may set to zero or to a bad URL.
    pub fn validate(&self) -> Result<()> {
        if !self.source.url.starts_with("http://") && !self.source.url.starts_with("https://") {
            bail!("source.url must start with 'http://' or 'https://'");
        }
        if self.source.limit == 0 {
            bail!("source.limit must be at least 1 row");
        }
        if self.source.timeout_seconds == 0 {
            bail!("source.timeout_seconds must be at least 1 second");
        }

        let counts = [
            ("metrics.window", self.metrics.window),
            ("metrics.trailing_days", self.metrics.trailing_days),
            ("metrics.lookback_days", self.metrics.lookback_days),
            ("metrics.top_n", self.metrics.top_n),
        ];
        for (name, value) in counts {
            if value == 0 {
                bail!("{} must be at least 1", name);
            }
        }

        Ok(())
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(date) = args.as_of_date {
            self.metrics.as_of_date = Some(date);
        }
        if let Some(window) = args.window {
            self.metrics.window = window;
        }
        if let Some(days) = args.trailing_days {
            self.metrics.trailing_days = days;
        }
        if let Some(days) = args.lookback_days {
            self.metrics.lookback_days = days;
        }
        if let Some(n) = args.top_n {
            self.metrics.top_n = n;
        }

        if let Some(ref url) = args.source_url {
            self.source.url = url.clone();
        }
        if let Some(limit) = args.limit {
            self.source.limit = limit;
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
