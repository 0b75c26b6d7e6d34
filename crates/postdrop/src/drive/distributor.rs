//! Batch distribution into the destination container.

use futures_util::{stream, StreamExt};
use serde::Serialize;
use tracing::{error, info};

use super::error::{DistributeError, Result};
use super::sink::{OutboundFile, StorageSink, StoredFile};

/// Default fan-out for concurrent uploads within one batch.
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;

/// One successfully distributed file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionResult {
    pub file_name: String,
    pub file_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    pub mime_type: String,
    pub size: u64,
}

/// One item that failed to distribute.
#[derive(Debug, Clone)]
pub struct DistributionFailure {
    pub file_name: String,
    pub error: String,
}

/// Partial-result accumulator for one batch: uploads that succeeded in
/// attempt order, plus the items that failed.
#[derive(Debug, Default)]
pub struct DistributionOutcome {
    pub uploaded: Vec<DistributionResult>,
    pub failed: Vec<DistributionFailure>,
}

/// Uploads batches of files into a destination folder.
pub struct Distributor<S> {
    sink: S,
    concurrency: usize,
}

impl<S: StorageSink> Distributor<S> {
    pub fn new(sink: S) -> Self {
        Self::with_concurrency(sink, DEFAULT_UPLOAD_CONCURRENCY)
    }

    pub fn with_concurrency(sink: S, concurrency: usize) -> Self {
        Self {
            sink,
            concurrency: concurrency.max(1),
        }
    }

    /// Uploads each file into `folder_id`, continuing past per-item
    /// failures.
    ///
    /// Uploads run concurrently up to the configured fan-out limit;
    /// results keep attempt order. The call itself only fails when the
    /// destination is unconfigured. Failed items are not retried.
    pub async fn distribute(
        &self,
        files: Vec<OutboundFile>,
        folder_id: &str,
    ) -> Result<DistributionOutcome> {
        if folder_id.trim().is_empty() {
            return Err(DistributeError::MissingDestination);
        }

        let sink = &self.sink;
        let attempts: Vec<(OutboundFile, Result<StoredFile>)> = stream::iter(files)
            .map(|file| async move {
                let stored = sink.upload(&file, folder_id).await;
                (file, stored)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut outcome = DistributionOutcome::default();
        for (file, stored) in attempts {
            match stored {
                Ok(StoredFile {
                    id: Some(id),
                    web_view_link,
                }) => {
                    info!("Uploaded '{}' as {}", file.name, id);
                    outcome.uploaded.push(DistributionResult {
                        size: file.data.len() as u64,
                        file_name: file.name,
                        file_id: id,
                        web_view_link,
                        mime_type: file.mime_type,
                    });
                }
                Ok(StoredFile { id: None, .. }) => {
                    let e = DistributeError::MissingRemoteId(file.name.clone());
                    error!("Failed to upload '{}': {}", file.name, e);
                    outcome.failed.push(DistributionFailure {
                        file_name: file.name,
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    error!("Failed to upload '{}': {}", file.name, e);
                    outcome.failed.push(DistributionFailure {
                        file_name: file.name,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }
}
