//! Report rendering.
//!
//! This module renders a [`MetricsReport`] as plain text for the console,
//! as Markdown tables, or as JSON.

use crate::models::{
    MetricsReport, PositivityMetric, ReportMetadata, RollingAverageMetric, RollingAveragePoint,
    TotalTestsMetric,
};
use anyhow::Result;

/// Generate the console report: one numbered statement per metric.
pub fn generate_text_report(report: &MetricsReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "1. The total number of PCR tests performed as of {} in the United States is {}\n\n",
        report.total_tests.as_of_date, report.total_tests.total_tests
    ));

    let rolling = &report.rolling_average;
    output.push_str(&format!(
        "2. The {}-day rolling average number of new cases per day for the last {} days is\n",
        rolling.window, rolling.trailing_days
    ));
    if rolling.points.is_empty() {
        output.push_str("   (no positive case data)\n");
    }
    for point in &rolling.points {
        output.push_str(&format!("   {}  {:>12}\n", point.date, format_average(point)));
    }
    output.push('\n');

    let positivity = &report.positivity;
    output.push_str(&format!(
        "3. The {} states with the highest test positivity rate (positive tests / tests performed) \
         for tests performed in the last {} days (since {}) are\n",
        positivity.top_n, positivity.lookback_days, positivity.lookback_start_date
    ));
    if positivity.states.is_empty() {
        output.push_str("   (no testing data in window)\n");
    }
    for (i, state) in positivity.states.iter().enumerate() {
        output.push_str(&format!(
            "   {:>2}. {:<28} {:.3}\n",
            i + 1,
            state.state_name,
            state.positivity_rate
        ));
    }
    if !positivity.unratable_states.is_empty() {
        output.push_str(&format!(
            "   Excluded (no tests reported): {}\n",
            positivity.unratable_states.join(", ")
        ));
    }

    output
}

/// Generate a Markdown report.
pub fn generate_markdown_report(report: &MetricsReport) -> String {
    let mut output = String::new();

    output.push_str("# COVID-19 Testing Metrics\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_total_tests_section(&report.total_tests));
    output.push_str(&generate_rolling_average_section(&report.rolling_average));
    output.push_str(&generate_positivity_section(&report.positivity));

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Records Loaded:** {}\n", metadata.records_loaded));
    if let (Some(first), Some(last)) = (metadata.first_date, metadata.last_date) {
        section.push_str(&format!("- **Date Range:** {} to {}\n", first, last));
    }
    section.push_str(&format!("- **Load Duration:** {:.1}s\n", metadata.load_seconds));
    section.push('\n');

    section
}

fn generate_total_tests_section(metric: &TotalTestsMetric) -> String {
    format!(
        "## Total PCR Tests\n\nTests performed in the United States as of **{}**: **{}**\n\n",
        metric.as_of_date, metric.total_tests
    )
}

fn generate_rolling_average_section(metric: &RollingAverageMetric) -> String {
    let mut section = String::new();

    section.push_str("## Rolling Average of New Cases\n\n");
    section.push_str(&format!(
        "*{}-day window, last {} days*\n\n",
        metric.window, metric.trailing_days
    ));

    if metric.points.is_empty() {
        section.push_str("No positive case data was reported.\n\n");
        return section;
    }

    section.push_str("| Date | Average New Cases |\n");
    section.push_str("|:---|---:|\n");
    for point in &metric.points {
        section.push_str(&format!("| {} | {} |\n", point.date, format_average(point)));
    }
    section.push('\n');

    section
}

fn generate_positivity_section(metric: &PositivityMetric) -> String {
    let mut section = String::new();

    section.push_str("## Highest Test Positivity\n\n");
    section.push_str(&format!(
        "*Top {} states, last {} days (since {})*\n\n",
        metric.top_n, metric.lookback_days, metric.lookback_start_date
    ));

    if metric.states.is_empty() {
        section.push_str("No tests were reported in this window.\n\n");
    } else {
        section.push_str("| Rank | State | Positivity Rate |\n");
        section.push_str("|:---:|:---|---:|\n");
        for (i, state) in metric.states.iter().enumerate() {
            section.push_str(&format!(
                "| {} | {} | {:.3} |\n",
                i + 1,
                state.state_name,
                state.positivity_rate
            ));
        }
        section.push('\n');
    }

    if !metric.unratable_states.is_empty() {
        section.push_str(&format!(
            "Excluded for reporting no tests: {}\n\n",
            metric.unratable_states.join(", ")
        ));
    }

    section
}

fn format_average(point: &RollingAveragePoint) -> String {
    match point.average {
        Some(avg) => format!("{:.3}", avg),
        None => "n/a".to_string(),
    }
}

/// Generate a JSON report.
pub fn generate_json_report(report: &MetricsReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
