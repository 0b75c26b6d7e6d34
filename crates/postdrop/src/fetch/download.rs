//! Bounded streaming download of remote archives.

use std::time::Duration;

use futures_util::StreamExt;
use log::{debug, info};
use reqwest::{Client, StatusCode, Url};

use crate::sanitize;

use super::error::{FetchError, Result};
use super::progress::{DownloadProgress, ProgressObserver};

/// Maximum accepted archive size (500 MB).
pub const DEFAULT_MAX_BYTES: u64 = 500 * 1024 * 1024;

/// Overall transfer deadline (5 minutes).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Bounds applied to one download call.
#[derive(Debug, Clone, Copy)]
pub struct DownloadLimits {
    /// Maximum accepted body size in bytes.
    pub max_bytes: u64,
    /// Overall wall-clock deadline for the transfer.
    pub timeout: Duration,
}

impl Default for DownloadLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Streams arbitrary remote files into memory with size and time bounds.
pub struct ArchiveDownloader {
    client: Client,
}

impl ArchiveDownloader {
    pub fn new() -> Result<Self> {
        // No per-request timeout on the client itself; the overall
        // deadline wraps the whole transfer in `download`.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }

    /// Streams `url` into memory, enforcing the configured byte cap and
    /// overall deadline. Progress is reported per received chunk; an
    /// unknown total size never blocks completion.
    pub async fn download(
        &self,
        url: &str,
        limits: DownloadLimits,
        observer: &dyn ProgressObserver,
    ) -> Result<Vec<u8>> {
        let url = Url::parse(url)
            .map_err(|e| FetchError::InvalidRequest(format!("invalid source URL: {}", e)))?;

        info!("Downloading {}", sanitize::redact_url(url.as_str()));

        match tokio::time::timeout(limits.timeout, self.transfer(url, limits, observer)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(limits.timeout)),
        }
    }

    async fn transfer(
        &self,
        url: Url,
        limits: DownloadLimits,
        observer: &dyn ProgressObserver,
    ) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::Rejected(status));
        }

        let total = response.content_length();
        if let Some(total) = total {
            if total > limits.max_bytes {
                return Err(FetchError::TooLarge(limits.max_bytes));
            }
        }

        // Never trust the declared length for the allocation.
        let mut body =
            Vec::with_capacity(total.unwrap_or_default().min(limits.max_bytes) as usize);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if body.len() as u64 + chunk.len() as u64 > limits.max_bytes {
                return Err(FetchError::TooLarge(limits.max_bytes));
            }
            body.extend_from_slice(&chunk);
            observer.report(DownloadProgress {
                downloaded: body.len() as u64,
                total,
            });
        }

        debug!("Downloaded {} bytes", body.len());
        Ok(body)
    }
}
