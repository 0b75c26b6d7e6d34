//! One-run orchestration.
//!
//! The scanner sequences fetch → naming → distribution → audit for the
//! mailbox source; the archive processor chains validation → download →
//! extraction → distribution for the remote-archive source. Both share
//! the same downstream distribution machinery.

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::archive;
use crate::audit::{AuditEntry, AuditLog, AuditRecorder, HttpAuditLog};
use crate::auth::AuthorizedClient;
use crate::config::Config;
use crate::drive::{
    extract_folder_id, DistributionResult, Distributor, HttpStorageSink, OutboundFile,
    StorageSink,
};
use crate::error::{PostdropError, Result};
use crate::fetch::{ArchiveDownloader, DownloadLimits, FetchError, ProgressObserver};
use crate::mail::{HttpMailApi, MailApi, MailboxFetcher, SourceMessage};
use crate::naming::{self, EmailContext};

/// Default bound on messages pulled per scan run.
pub const DEFAULT_SCAN_LIMIT: u32 = 20;

/// Summary of one mailbox scan run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    /// Count of messages processed.
    pub processed: usize,
    /// Audit entries produced, in fetch order.
    pub entries: Vec<AuditEntry>,
}

/// Request accepted by the process-archive entry point.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessArchiveRequest {
    pub file_url: String,
    pub drive_folder_link: String,
}

/// Response contract of the process-archive entry point.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessArchiveResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_files: Option<Vec<DistributionResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drive_folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_files: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,
}

impl ProcessArchiveResponse {
    /// Structured failure response for the entry surface.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            processed_files: None,
            drive_folder: None,
            total_files: None,
            total_size: None,
        }
    }
}

/// True when the error reflects the caller's input rather than an
/// execution fault. The entry surface uses this to shape its failure
/// messages.
pub fn is_validation_error(error: &PostdropError) -> bool {
    matches!(
        error,
        PostdropError::Fetch(FetchError::InvalidRequest(_))
            | PostdropError::Distribute(crate::drive::DistributeError::InvalidFolderLink(_))
    )
}

/// Orchestrates one full mailbox scan cycle.
pub struct Scanner<M, S, L> {
    fetcher: MailboxFetcher<M>,
    distributor: Distributor<S>,
    recorder: AuditRecorder<L>,
    folder_id: Option<String>,
    scan_limit: u32,
}

impl Scanner<HttpMailApi, HttpStorageSink, HttpAuditLog> {
    /// Production constructor — wires the live remote services from an
    /// authorized client and the runtime configuration.
    pub fn from_config(client: AuthorizedClient, config: &Config) -> Self {
        Self::new(
            MailboxFetcher::new(HttpMailApi::new(client.clone())),
            Distributor::with_concurrency(
                HttpStorageSink::new(client.clone()),
                config.upload_concurrency,
            ),
            AuditRecorder::new(HttpAuditLog::new(client), config.sheet_id.clone()),
            config.drive_folder_id.clone(),
        )
    }
}

impl<M: MailApi, S: StorageSink, L: AuditLog> Scanner<M, S, L> {
    pub fn new(
        fetcher: MailboxFetcher<M>,
        distributor: Distributor<S>,
        recorder: AuditRecorder<L>,
        folder_id: Option<String>,
    ) -> Self {
        Self {
            fetcher,
            distributor,
            recorder,
            folder_id,
            scan_limit: DEFAULT_SCAN_LIMIT,
        }
    }

    pub fn with_scan_limit(mut self, limit: u32) -> Self {
        self.scan_limit = limit;
        self
    }

    /// Runs one full cycle: fetch pending messages, distribute each
    /// message's attachments under derived names, then append one audit
    /// row per message in a single recorder call.
    ///
    /// Audit entries keep fetch order. A zero-message run performs no
    /// recorder call.
    ///
    /// Accepted limitation: when distribution succeeds but the audit
    /// append fails, files exist in storage with no audit row, and the
    /// source messages are already marked read. There is no automatic
    /// reconciliation.
    pub async fn run_scan(&self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let _span = info_span!("scan_run", run_id = %run_id).entered();

        let messages = self.fetcher.fetch_pending(self.scan_limit).await?;
        info!("Processing {} messages", messages.len());

        let folder_id = self.folder_id.clone().unwrap_or_default();

        let mut entries = Vec::with_capacity(messages.len());
        for message in &messages {
            let entry = self.process_message(message, &folder_id).await?;
            entries.push(entry);
        }

        if !entries.is_empty() {
            self.recorder.record(&entries).await?;
        }

        Ok(RunSummary {
            processed: entries.len(),
            entries,
        })
    }

    /// Distributes one message's attachments and builds its audit entry.
    ///
    /// The entry's remote ids come only from this message's successful
    /// uploads.
    async fn process_message(
        &self,
        message: &SourceMessage,
        folder_id: &str,
    ) -> Result<AuditEntry> {
        let context = EmailContext {
            sender: message.sender.clone(),
            date: message.date.clone(),
            subject: message.subject.clone(),
        };

        let files: Vec<OutboundFile> = message
            .attachments
            .iter()
            .map(|attachment| OutboundFile {
                name: naming::derive_name(&attachment.name, Some(&context)),
                mime_type: attachment.mime_type.clone(),
                data: attachment.data.clone(),
            })
            .collect();

        let outcome = self.distributor.distribute(files, folder_id).await?;
        if !outcome.failed.is_empty() {
            warn!(
                "{} of {} attachments failed to distribute for message {}",
                outcome.failed.len(),
                message.attachments.len(),
                message.id
            );
        }

        Ok(AuditEntry {
            sender: message.sender.clone(),
            date: message.date.clone(),
            subject: message.subject.clone(),
            invoice_number: naming::invoice_number(&message.subject),
            remote_ids: outcome
                .uploaded
                .iter()
                .map(|upload| upload.file_id.clone())
                .collect(),
            processed_at: chrono::Utc::now(),
        })
    }
}

/// Chains validate → download → extract → distribute for one remote
/// archive.
pub struct ArchiveProcessor<S> {
    downloader: ArchiveDownloader,
    distributor: Distributor<S>,
    limits: DownloadLimits,
}

impl ArchiveProcessor<HttpStorageSink> {
    /// Production constructor — wires the live storage service.
    pub fn from_config(client: AuthorizedClient, config: &Config) -> Result<Self> {
        Ok(Self::new(
            ArchiveDownloader::new()?,
            Distributor::with_concurrency(HttpStorageSink::new(client), config.upload_concurrency),
        ))
    }
}

impl<S: StorageSink> ArchiveProcessor<S> {
    pub fn new(downloader: ArchiveDownloader, distributor: Distributor<S>) -> Self {
        Self {
            downloader,
            distributor,
            limits: DownloadLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: DownloadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Processes one remote archive into the destination folder named by
    /// the request's shared link.
    ///
    /// All caller input is validated before any network access; unreadable
    /// archive entries and per-file upload failures are reported without
    /// aborting the batch.
    pub async fn process(
        &self,
        request: &ProcessArchiveRequest,
        observer: &dyn ProgressObserver,
    ) -> Result<ProcessArchiveResponse> {
        let run_id = Uuid::new_v4();
        let _span = info_span!("process_archive", run_id = %run_id).entered();

        validate_request(request)?;
        let folder_id = extract_folder_id(&request.drive_folder_link)?;

        let bytes = self
            .downloader
            .download(&request.file_url, self.limits, observer)
            .await?;

        info!("Extracting archive contents");
        let extraction = archive::extract(&bytes)?;
        for failure in &extraction.failures {
            warn!(
                "Unreadable archive entry '{}': {}",
                failure.name, failure.reason
            );
        }

        let total_files = extraction.total_files();
        let total_size = extraction.total_size;

        info!("Uploading {} files to storage", total_files);
        let files: Vec<OutboundFile> = extraction
            .files
            .into_iter()
            .map(|file| OutboundFile {
                name: file.name,
                mime_type: file.mime_type,
                data: file.data,
            })
            .collect();

        let outcome = self.distributor.distribute(files, &folder_id).await?;

        Ok(ProcessArchiveResponse {
            success: true,
            message: format!(
                "Successfully processed and uploaded {} files",
                outcome.uploaded.len()
            ),
            processed_files: Some(outcome.uploaded),
            drive_folder: Some(folder_id),
            total_files: Some(total_files),
            total_size: Some(total_size),
        })
    }
}

/// Rejects empty or unparseable caller input before any network access.
fn validate_request(request: &ProcessArchiveRequest) -> Result<()> {
    if request.file_url.trim().is_empty() {
        return Err(FetchError::InvalidRequest("fileUrl is required".to_string()).into());
    }
    if request.drive_folder_link.trim().is_empty() {
        return Err(
            FetchError::InvalidRequest("drive folder link is required".to_string()).into(),
        );
    }
    reqwest::Url::parse(&request.file_url)
        .map_err(|e| FetchError::InvalidRequest(format!("invalid source URL: {}", e)))?;
    Ok(())
}
