//! Remote-archive fetch error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while fetching a remote archive.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Caller input failed validation; no network access happened.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The transfer exceeded its overall deadline.
    #[error("Download timed out after {0:?}")]
    Timeout(Duration),

    /// The remote answered with a 404.
    #[error("File not found at the provided URL")]
    NotFound,

    /// The remote rejected the request with another 4xx/5xx status.
    #[error("Download rejected by remote server: HTTP {0}")]
    Rejected(reqwest::StatusCode),

    /// The body exceeded the configured byte cap mid-transfer.
    #[error("Download exceeded the {0} byte limit")]
    TooLarge(u64),

    /// Transport-level failure.
    #[error("Download failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
