//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// covid-metrics - COVID-19 testing summary from healthdata.gov
///
/// Reports the total number of PCR tests performed as of a date, the
/// rolling average of new positive cases, and the states with the highest
/// test positivity rate over a recent window.
///
/// Examples:
///   covid-metrics
///   covid-metrics --as-of-date 2021-06-30 --window 14
///   covid-metrics --input tests.json --format json --output report.json
///   covid-metrics --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Date up to which total tests are counted (YYYY-MM-DD)
    ///
    /// Defaults to yesterday.
    #[arg(long, value_name = "DATE")]
    pub as_of_date: Option<NaiveDate>,

    /// Rolling average window in days [default: 7]
    #[arg(long, value_name = "DAYS")]
    pub window: Option<usize>,

    /// Number of most recent rolling average values to report [default: 30]
    #[arg(long, value_name = "DAYS")]
    pub trailing_days: Option<usize>,

    /// Days before today covered by the positivity ranking [default: 30]
    #[arg(long, value_name = "DAYS")]
    pub lookback_days: Option<usize>,

    /// Number of states in the positivity ranking [default: 10]
    #[arg(long, value_name = "COUNT")]
    pub top_n: Option<usize>,

    /// Dataset endpoint URL
    #[arg(long, value_name = "URL", env = "COVID_METRICS_SOURCE_URL")]
    pub source_url: Option<String>,

    /// Maximum number of rows requested from the endpoint
    #[arg(long, value_name = "ROWS")]
    pub limit: Option<u64>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Read records from a local JSON file instead of the endpoint
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .covid-metrics.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (text, markdown, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .covid-metrics.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text (default)
    #[default]
    Text,
    /// Markdown tables
    Markdown,
    /// JSON document
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        let counts = [
            ("Window", self.window),
            ("Trailing days", self.trailing_days),
            ("Lookback days", self.lookback_days),
            ("Top N", self.top_n),
        ];
        for (name, value) in counts {
            if value == Some(0) {
                return Err(format!("{} must be at least 1", name));
            }
        }

        if let Some(ref url) = self.source_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Source URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.limit == Some(0) {
            return Err("Limit must be at least 1 row".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            as_of_date: None,
            window: None,
            trailing_days: None,
            lookback_days: None,
            top_n: None,
            source_url: None,
            limit: None,
            timeout: None,
            input: None,
            config: None,
            format: OutputFormat::Text,
            output: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_metric_flags() {
        let args = Args::try_parse_from([
            "covid-metrics",
            "--as-of-date",
            "2021-06-30",
            "--window",
            "14",
            "--top-n",
            "5",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.as_of_date, NaiveDate::from_ymd_opt(2021, 6, 30));
        assert_eq!(args.window, Some(14));
        assert_eq!(args.top_n, Some(5));
        assert_eq!(args.trailing_days, None);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_rejects_invalid_date() {
        let result = Args::try_parse_from(["covid-metrics", "--as-of-date", "2021-02-30"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_zero_counts() {
        let mut args = make_args();
        args.window = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.top_n = Some(0);
        assert!(args.validate().is_err());

        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.source_url = Some("ftp://healthdata.gov".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_input() {
        let mut args = make_args();
        args.input = Some(PathBuf::from("/nonexistent/tests.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
