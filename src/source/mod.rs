//! Data source for testing records.
//!
//! Records are loaded once, either from the public dataset endpoint or
//! from a local JSON file with the same row shape.

mod decode;
mod fetcher;

pub use fetcher::FetchOptions;

use crate::models::TestRecord;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Default dataset endpoint: COVID-19 PCR testing time series.
pub const DEFAULT_SOURCE_URL: &str = "https://healthdata.gov/resource/j8mb-icvb.json";

/// Errors raised while loading records.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source could not supply data.
    #[error("data source unavailable ({location}): {reason}")]
    Unavailable { location: String, reason: String },

    /// The payload is not a JSON array of row objects.
    #[error("failed to decode testing data: {0}")]
    Decode(#[from] serde_json::Error),

    /// A row is missing a field or holds an invalid value.
    #[error("malformed record at row {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },
}

/// Where testing records are loaded from.
#[derive(Debug, Clone)]
pub enum DataSource {
    Remote(FetchOptions),
    File(PathBuf),
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Remote(options) => write!(f, "{}", options.url),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl DataSource {
    /// Load and decode all records. Zero rows is a valid result.
    pub async fn load(&self) -> Result<Vec<TestRecord>, SourceError> {
        let payload = match self {
            DataSource::Remote(options) => fetcher::fetch_payload(options).await?,
            DataSource::File(path) => fetcher::read_payload(path).await?,
        };

        let records = decode::parse_records(&payload)?;
        info!("Loaded {} testing records", records.len());
        Ok(records)
    }
}
