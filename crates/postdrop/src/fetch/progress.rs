//! Progress observation for streaming downloads.

use std::sync::atomic::{AtomicU64, Ordering};

use log::info;

/// A snapshot of transfer progress. `total` is unknown for chunked
/// responses without a content length.
#[derive(Debug, Clone, Copy)]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub total: Option<u64>,
}

impl DownloadProgress {
    /// Whole percentage when the total is known.
    pub fn percentage(&self) -> Option<u8> {
        self.total
            .filter(|total| *total > 0)
            .map(|total| ((self.downloaded * 100) / total).min(100) as u8)
    }
}

/// Observer for download progress. Implementations must not block
/// completion.
pub trait ProgressObserver: Send + Sync {
    fn report(&self, progress: DownloadProgress);
}

/// No-op observer for callers that do not track progress.
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn report(&self, _progress: DownloadProgress) {}
}

/// Bucket size for logging when the total size is unknown (8 MiB).
const UNKNOWN_TOTAL_LOG_STEP: u64 = 8 * 1024 * 1024;

/// Logs progress at ten-percent steps, or every few megabytes when the
/// total size is unknown.
#[derive(Default)]
pub struct LogObserver {
    last_reported: AtomicU64,
}

impl LogObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressObserver for LogObserver {
    fn report(&self, progress: DownloadProgress) {
        match progress.percentage() {
            Some(percentage) => {
                let bucket = (percentage / 10) as u64;
                if bucket > self.last_reported.swap(bucket, Ordering::Relaxed) {
                    info!(
                        "Download progress: {}% ({}/{} bytes)",
                        percentage,
                        progress.downloaded,
                        progress.total.unwrap_or_default()
                    );
                }
            }
            None => {
                let bucket = progress.downloaded / UNKNOWN_TOTAL_LOG_STEP;
                if bucket > self.last_reported.swap(bucket, Ordering::Relaxed) {
                    info!(
                        "Download progress: {} bytes (total unknown)",
                        progress.downloaded
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_with_known_total() {
        let progress = DownloadProgress {
            downloaded: 50,
            total: Some(200),
        };
        assert_eq!(progress.percentage(), Some(25));
    }

    #[test]
    fn test_percentage_without_total() {
        let progress = DownloadProgress {
            downloaded: 50,
            total: None,
        };
        assert_eq!(progress.percentage(), None);
    }

    #[test]
    fn test_percentage_caps_at_hundred() {
        let progress = DownloadProgress {
            downloaded: 300,
            total: Some(200),
        };
        assert_eq!(progress.percentage(), Some(100));
    }

    #[test]
    fn test_percentage_zero_total_is_unknown() {
        let progress = DownloadProgress {
            downloaded: 0,
            total: Some(0),
        };
        assert_eq!(progress.percentage(), None);
    }
}
