//! Test record aggregation.
//!
//! This module holds the loaded test records and computes the three
//! summary metrics: cumulative tests as of a date, the rolling average of
//! new positive cases, and the states ranked by test positivity.

use crate::models::{
    MetricParams, PositivityRanking, RollingAveragePoint, StatePositivity, TestRecord,
};
use chrono::{Days, NaiveDate};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;
use tracing::debug;

/// Errors raised while building or querying an [`Aggregator`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregatorError {
    /// A parameter is outside its valid range.
    #[error("invalid {parameter}: {reason}")]
    InvalidConfig {
        parameter: &'static str,
        reason: String,
    },

    /// A sum of counts does not fit in 64 bits.
    #[error("count overflow while summing {what}")]
    CountOverflow { what: &'static str },
}

/// Immutable table of test records plus the parameters of each query.
#[derive(Debug, Clone)]
pub struct Aggregator {
    records: Vec<TestRecord>,
    params: MetricParams,
    lookback_start_date: NaiveDate,
}

impl Aggregator {
    /// Build an aggregator over `records`.
    ///
    /// `today` anchors the positivity lookback window. It is resolved once
    /// here, so repeated queries stay consistent.
    pub fn new(
        records: Vec<TestRecord>,
        params: MetricParams,
        today: NaiveDate,
    ) -> Result<Self, AggregatorError> {
        validate_positive("window", params.window)?;
        validate_positive("trailing_days", params.trailing_days)?;
        validate_positive("lookback_days", params.lookback_days)?;
        validate_positive("top_n", params.top_n)?;

        let lookback_start_date = today
            .checked_sub_days(Days::new(params.lookback_days as u64))
            .ok_or_else(|| AggregatorError::InvalidConfig {
                parameter: "lookback_days",
                reason: format!(
                    "{} days before {} is outside the calendar",
                    params.lookback_days, today
                ),
            })?;

        debug!(
            "Aggregator ready: {} records, lookback starts {}",
            records.len(),
            lookback_start_date
        );

        Ok(Self {
            records,
            params,
            lookback_start_date,
        })
    }

    pub fn params(&self) -> &MetricParams {
        &self.params
    }

    pub fn lookback_start_date(&self) -> NaiveDate {
        self.lookback_start_date
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Earliest and latest report dates, or `None` for an empty table.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(|r| r.report_date).min()?;
        let last = self.records.iter().map(|r| r.report_date).max()?;
        Some((first, last))
    }

    /// Total results reported across all states and outcomes up to and
    /// including `as_of_date`.
    pub fn total_tests_as_of(&self) -> Result<u64, AggregatorError> {
        self.records
            .iter()
            .filter(|r| r.report_date <= self.params.as_of_date)
            .try_fold(0u64, |acc, r| {
                acc.checked_add(r.total_results_reported)
                    .ok_or(AggregatorError::CountOverflow {
                        what: "total results",
                    })
            })
    }

    /// Rolling average of national new positive cases per day.
    ///
    /// Returns the last `trailing_days` points in ascending date order.
    /// A point is `None` until `window` days of data precede it.
    pub fn rolling_average_new_cases(&self) -> Result<Vec<RollingAveragePoint>, AggregatorError> {
        let mut daily: BTreeMap<NaiveDate, u64> = BTreeMap::new();

        for record in self.records.iter().filter(|r| r.overall_outcome.is_positive()) {
            let sum = daily.entry(record.report_date).or_default();
            *sum = sum
                .checked_add(record.new_results_reported)
                .ok_or(AggregatorError::CountOverflow {
                    what: "daily new cases",
                })?;
        }

        let window = self.params.window;
        let mut span: VecDeque<u64> = VecDeque::with_capacity(window);
        let mut span_sum: u128 = 0;
        let mut points = Vec::with_capacity(daily.len());

        for (date, count) in daily {
            span.push_back(count);
            span_sum += u128::from(count);
            if span.len() > window {
                if let Some(dropped) = span.pop_front() {
                    span_sum -= u128::from(dropped);
                }
            }

            let average = (span.len() == window).then(|| span_sum as f64 / window as f64);
            points.push(RollingAveragePoint { date, average });
        }

        let skip = points.len().saturating_sub(self.params.trailing_days);
        Ok(points.split_off(skip))
    }

    /// States ranked by positivity rate over the lookback window.
    ///
    /// Ties are broken alphabetically by state name. States with no tests
    /// in the window are listed in `unratable` instead of being ranked.
    pub fn top_states_by_positivity(&self) -> Result<PositivityRanking, AggregatorError> {
        // state -> (total, positive)
        let mut per_state: BTreeMap<&str, (u64, u64)> = BTreeMap::new();

        for record in self
            .records
            .iter()
            .filter(|r| r.report_date >= self.lookback_start_date)
        {
            let (total, positive) = per_state.entry(record.state_name.as_str()).or_default();
            *total = total
                .checked_add(record.total_results_reported)
                .ok_or(AggregatorError::CountOverflow {
                    what: "state total results",
                })?;
            if record.overall_outcome.is_positive() {
                *positive = positive
                    .checked_add(record.total_results_reported)
                    .ok_or(AggregatorError::CountOverflow {
                        what: "state positive results",
                    })?;
            }
        }

        let mut ranking = PositivityRanking::default();

        for (state, (total, positive)) in per_state {
            if total == 0 {
                debug!("Skipping {}: no tests since {}", state, self.lookback_start_date);
                ranking.unratable.push(state.to_string());
                continue;
            }

            ranking.ranked.push(StatePositivity {
                state_name: state.to_string(),
                positivity_rate: round_to_thousandths(positive as f64 / total as f64),
            });
        }

        ranking.ranked.sort_by(|a, b| {
            b.positivity_rate
                .total_cmp(&a.positivity_rate)
                .then_with(|| a.state_name.cmp(&b.state_name))
        });
        ranking.ranked.truncate(self.params.top_n);

        Ok(ranking)
    }
}

fn validate_positive(parameter: &'static str, value: usize) -> Result<(), AggregatorError> {
    if value == 0 {
        return Err(AggregatorError::InvalidConfig {
            parameter,
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

/// Round half-way values to the even neighbour, so 0.0625 becomes 0.062.
fn round_to_thousandths(value: f64) -> f64 {
    (value * 1000.0).round_ties_even() / 1000.0
}
