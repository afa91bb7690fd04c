//! Retrieval of the raw testing payload.
//!
//! Downloads the dataset over HTTP with a progress indicator, or reads
//! a previously saved copy from disk.

use super::SourceError;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Options for the remote download.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Dataset endpoint.
    pub url: String,
    /// Maximum number of rows requested (`$limit`).
    pub limit: u64,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Whether to show download progress.
    pub show_progress: bool,
}

/// Download the dataset and return the raw response body.
pub async fn fetch_payload(options: &FetchOptions) -> Result<Vec<u8>, SourceError> {
    info!("Fetching testing data from {}", options.url);

    let unavailable = |reason: String| SourceError::Unavailable {
        location: options.url.clone(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(options.timeout_seconds))
        .build()
        .map_err(|e| unavailable(format!("failed to create HTTP client: {}", e)))?;

    let response = client
        .get(&options.url)
        .query(&[("$limit", options.limit)])
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                unavailable(format!("request timed out after {}s", options.timeout_seconds))
            } else if e.is_connect() {
                unavailable("cannot connect".to_string())
            } else {
                unavailable(e.to_string())
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(unavailable(format!("HTTP {}: {}", status, body)));
    }

    let progress_bar = options
        .show_progress
        .then(|| download_progress_bar(response.content_length()));

    let mut payload = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            if e.is_timeout() {
                unavailable(format!("download timed out after {}s", options.timeout_seconds))
            } else {
                unavailable(format!("download interrupted: {}", e))
            }
        })?;
        payload.extend_from_slice(&chunk);

        if let Some(ref pb) = progress_bar {
            pb.set_position(payload.len() as u64);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    debug!("Downloaded {} bytes", payload.len());
    Ok(payload)
}

/// Read a saved copy of the dataset.
pub async fn read_payload(path: &Path) -> Result<Vec<u8>, SourceError> {
    info!("Reading testing data from {}", path.display());

    tokio::fs::read(path)
        .await
        .map_err(|e| SourceError::Unavailable {
            location: path.display().to_string(),
            reason: e.to_string(),
        })
}

fn download_progress_bar(content_length: Option<u64>) -> ProgressBar {
    match content_length {
        Some(len) => {
            let pb = ProgressBar::new(len);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) =
                ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {bytes} downloaded")
            {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_payload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[]").unwrap();

        let payload = tokio_test::block_on(read_payload(file.path())).unwrap();
        assert_eq!(payload, b"[]");
    }

    #[test]
    fn test_read_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");

        let err = tokio_test::block_on(read_payload(&missing)).unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_unreachable_host_is_unavailable() {
        let options = FetchOptions {
            url: "http://127.0.0.1:1/resource.json".to_string(),
            limit: 10,
            timeout_seconds: 5,
            show_progress: false,
        };

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let err = runtime.block_on(fetch_payload(&options)).unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }
}
