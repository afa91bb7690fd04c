//! Data models for the testing metrics.
//!
//! This module contains the core data structures used throughout
//! the application for representing test records, metric results,
//! and reports.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Outcome category of a batch of test results.
///
/// Only `Positive` is singled out by the metrics; any label the dataset
/// may add later is kept as `Other` and counted as non-positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Positive,
    Negative,
    Inconclusive,
    Other,
}

impl From<&str> for Outcome {
    fn from(s: &str) -> Self {
        match s {
            "Positive" => Outcome::Positive,
            "Negative" => Outcome::Negative,
            "Inconclusive" => Outcome::Inconclusive,
            _ => Outcome::Other,
        }
    }
}

impl Outcome {
    /// Whether this outcome counts toward positive cases.
    pub fn is_positive(&self) -> bool {
        matches!(self, Outcome::Positive)
    }
}

/// One row of the testing time series.
///
/// The source splits each (date, state) pair into one row per outcome,
/// so several records may share the same date and state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRecord {
    /// Day the results were reported.
    pub report_date: NaiveDate,
    /// U.S. state or territory name.
    pub state_name: String,
    /// Outcome category of the results in this row.
    pub overall_outcome: Outcome,
    /// Cumulative results reported for this row.
    pub total_results_reported: u64,
    /// Results newly reported on `report_date`.
    pub new_results_reported: u64,
}

/// Parameters controlling the three metric windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricParams {
    /// Last day included in the cumulative test total.
    pub as_of_date: NaiveDate,
    /// Rolling average span in days.
    pub window: usize,
    /// Number of most recent rolling average values to report.
    pub trailing_days: usize,
    /// Days before today covered by the positivity ranking.
    pub lookback_days: usize,
    /// Number of states in the positivity ranking.
    pub top_n: usize,
}

pub const DEFAULT_WINDOW: usize = 7;
pub const DEFAULT_TRAILING_DAYS: usize = 30;
pub const DEFAULT_LOOKBACK_DAYS: usize = 30;
pub const DEFAULT_TOP_N: usize = 10;

impl MetricParams {
    /// Default parameters relative to `today`: totals as of yesterday,
    /// a 7-day average over the last 30 values, and the top 10 states over
    /// the last 30 days.
    pub fn defaults_for(today: NaiveDate) -> Self {
        Self {
            as_of_date: today.pred_opt().unwrap_or(today),
            window: DEFAULT_WINDOW,
            trailing_days: DEFAULT_TRAILING_DAYS,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// A single point of the rolling average series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingAveragePoint {
    pub date: NaiveDate,
    /// `None` until a full window of days is available.
    pub average: Option<f64>,
}

/// Positivity rate of one state over the lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatePositivity {
    pub state_name: String,
    /// Positive results / total results, rounded to 3 decimals.
    pub positivity_rate: f64,
}

/// Result of the positivity ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositivityRanking {
    /// Highest rates first, at most `top_n` entries.
    pub ranked: Vec<StatePositivity>,
    /// States with zero tests in the window, which have no defined rate.
    pub unratable: Vec<String>,
}

/// Total tests metric together with its parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalTestsMetric {
    pub as_of_date: NaiveDate,
    pub total_tests: u64,
}

/// Rolling average metric together with its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingAverageMetric {
    pub window: usize,
    pub trailing_days: usize,
    pub points: Vec<RollingAveragePoint>,
}

/// Positivity ranking together with its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositivityMetric {
    pub lookback_days: usize,
    pub lookback_start_date: NaiveDate,
    pub top_n: usize,
    pub states: Vec<StatePositivity>,
    pub unratable_states: Vec<String>,
}

/// Metadata about the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Where the records came from (URL or file path).
    pub source: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of records loaded from the source.
    pub records_loaded: usize,
    /// Earliest report date in the data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_date: Option<NaiveDate>,
    /// Latest report date in the data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_date: Option<NaiveDate>,
    /// Time spent loading the data in seconds.
    pub load_seconds: f64,
}

/// The complete metrics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub metadata: ReportMetadata,
    pub total_tests: TotalTestsMetric,
    pub rolling_average: RollingAverageMetric,
    pub positivity: PositivityMetric,
}
