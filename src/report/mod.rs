//! Report assembly and rendering.

mod generator;

pub use generator::{generate_json_report, generate_markdown_report, generate_text_report};

use crate::analysis::{Aggregator, AggregatorError};
use crate::models::{
    MetricsReport, PositivityMetric, ReportMetadata, RollingAverageMetric, TotalTestsMetric,
};

/// Run all three queries and bundle their results with the parameters used.
pub fn build_report(
    aggregator: &Aggregator,
    metadata: ReportMetadata,
) -> Result<MetricsReport, AggregatorError> {
    let params = aggregator.params();
    let ranking = aggregator.top_states_by_positivity()?;

    Ok(MetricsReport {
        metadata,
        total_tests: TotalTestsMetric {
            as_of_date: params.as_of_date,
            total_tests: aggregator.total_tests_as_of()?,
        },
        rolling_average: RollingAverageMetric {
            window: params.window,
            trailing_days: params.trailing_days,
            points: aggregator.rolling_average_new_cases()?,
        },
        positivity: PositivityMetric {
            lookback_days: params.lookback_days,
            lookback_start_date: aggregator.lookback_start_date(),
            top_n: params.top_n,
            states: ranking.ranked,
            unratable_states: ranking.unratable,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricParams, Outcome, TestRecord};
    use chrono::{NaiveDate, Utc};

    #[test]
    fn test_build_report_carries_parameters() {
        let day = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2021, 1, 2).unwrap();
        let records = vec![
            TestRecord {
                report_date: day,
                state_name: "CA".to_string(),
                overall_outcome: Outcome::Positive,
                total_results_reported: 100,
                new_results_reported: 100,
            },
            TestRecord {
                report_date: day,
                state_name: "CA".to_string(),
                overall_outcome: Outcome::Negative,
                total_results_reported: 50,
                new_results_reported: 50,
            },
        ];
        let mut params = MetricParams::defaults_for(today);
        params.window = 1;
        let aggregator = Aggregator::new(records, params, today).unwrap();

        let metadata = ReportMetadata {
            source: "test.json".to_string(),
            generated_at: Utc::now(),
            records_loaded: aggregator.record_count(),
            first_date: Some(day),
            last_date: Some(day),
            load_seconds: 0.0,
        };
        let report = build_report(&aggregator, metadata).unwrap();

        assert_eq!(report.total_tests.as_of_date, day);
        assert_eq!(report.total_tests.total_tests, 150);
        assert_eq!(report.rolling_average.window, 1);
        assert_eq!(report.rolling_average.points[0].average, Some(100.0));
        assert_eq!(report.positivity.lookback_start_date, NaiveDate::from_ymd_opt(2020, 12, 3).unwrap());
        assert_eq!(report.positivity.states[0].positivity_rate, 0.667);
    }
}
