//! covid-metrics - COVID-19 testing summary
//!
//! A CLI tool that loads the healthdata.gov PCR testing time series and
//! reports cumulative tests, the rolling average of new cases, and the
//! states with the highest test positivity.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Error (invalid arguments, config, data source, aggregation, output)

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod source;

use analysis::Aggregator;
use anyhow::{Context, Result};
use chrono::{Local, Utc};
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use models::ReportMetadata;
use source::{DataSource, FetchOptions};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging starts so `[general] verbose` applies
    let config = match load_config(&args) {
        Ok(mut config) => {
            config.merge_with_args(&args);
            config
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config)?;

    info!("covid-metrics v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    if let Err(e) = run(args, config).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .covid-metrics.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize the data source and metric windows.");
    Ok(())
}

/// Initialize logging on stderr so stdout carries only the report.
fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Load the data, compute the metrics and emit the report.
async fn run(args: Args, config: Config) -> Result<()> {
    let today = Local::now().date_naive();
    let params = config.metrics.to_params(today);
    debug!("Metric parameters: {:?}", params);

    let source = match args.input {
        Some(ref path) => DataSource::File(path.clone()),
        None => DataSource::Remote(FetchOptions {
            url: config.source.url.clone(),
            limit: config.source.limit,
            timeout_seconds: config.source.timeout_seconds,
            show_progress: !args.quiet,
        }),
    };

    // Step 1: Load the records
    let start_time = Instant::now();
    let records = source
        .load()
        .await
        .with_context(|| format!("Failed to load testing data from {}", source))?;
    let load_seconds = start_time.elapsed().as_secs_f64();

    // Step 2: Build the aggregator
    let aggregator =
        Aggregator::new(records, params, today).context("Invalid metric parameters")?;
    let (first_date, last_date) = aggregator.date_range().unzip();

    let metadata = ReportMetadata {
        source: source.to_string(),
        generated_at: Utc::now(),
        records_loaded: aggregator.record_count(),
        first_date,
        last_date,
        load_seconds,
    };

    // Step 3: Compute and render
    let metrics = report::build_report(&aggregator, metadata).context("Failed to compute metrics")?;
    info!(
        "Computed metrics over {} records in {:.1}s",
        metrics.metadata.records_loaded,
        start_time.elapsed().as_secs_f64()
    );

    let output = match args.format {
        OutputFormat::Text => report::generate_text_report(&metrics),
        OutputFormat::Markdown => report::generate_markdown_report(&metrics),
        OutputFormat::Json => report::generate_json_report(&metrics)?,
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !args.quiet {
                eprintln!("✅ Report saved to: {}", path.display());
            }
        }
        None => print!("{}", output),
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location; a broken default file is not fatal
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Ignoring {}: {:#}", DEFAULT_CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}
