//! Downloading documents from a URL (storage bucket, CDN).

use std::time::Duration;

use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::model::SourceDocument;

/// File name used when the URL has no usable last segment.
pub const DEFAULT_FILE_NAME: &str = "document.pdf";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Bounds on a single download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Reject bodies larger than this many bytes.
    pub max_bytes: Option<u64>,
    /// Whole-request limit: connect, headers and body.
    pub timeout: Duration,
}

impl FetchOptions {
    /// Same size and time budget as the extraction that follows.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            max_bytes: config.max_file_bytes,
            timeout: config.timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Download a PDF.
///
/// Buckets often answer with `application/octet-stream`, so the response
/// content type is not trusted. The document is tagged as a PDF and the
/// magic check in the pipeline decides.
///
/// The body is read in chunks and abandoned as soon as it passes
/// `options.max_bytes`; a declared `Content-Length` above the limit is
/// rejected before any of the body is read.
pub async fn fetch_source(url: &str, options: &FetchOptions) -> Result<SourceDocument> {
    log::debug!("Fetching PDF from {}", url);

    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(options.timeout))
        .timeout(options.timeout)
        .build()
        .map_err(|e| Error::Fetch(e.to_string()))?;

    let request_error = |e: reqwest::Error| {
        if e.is_timeout() {
            Error::Timeout(options.timeout)
        } else {
            Error::Fetch(e.to_string())
        }
    };

    let mut response = client.get(url).send().await.map_err(request_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Fetch(format!("Failed to fetch PDF: {}", status)));
    }

    if let (Some(size), Some(limit)) = (response.content_length(), options.max_bytes) {
        if size > limit {
            return Err(Error::FileTooLarge { size, limit });
        }
    }

    let mut data = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(request_error)? {
        data.extend_from_slice(&chunk);
        if let Some(limit) = options.max_bytes {
            if data.len() as u64 > limit {
                return Err(Error::FileTooLarge {
                    size: data.len() as u64,
                    limit,
                });
            }
        }
    }
    log::debug!("Fetched {} bytes", data.len());

    if data.is_empty() {
        return Err(Error::Fetch("PDF file is empty".to_string()));
    }

    Ok(SourceDocument::pdf(data, file_name_from_url(url)))
}

/// Last non-empty path segment of `url`, or [`DEFAULT_FILE_NAME`].
pub fn file_name_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()).map(str::to_string))
        })
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
}
