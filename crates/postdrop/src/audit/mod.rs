//! Durable audit logging of processed source messages.
//!
//! One row per logical source unit, appended to a tabular destination in
//! a single batched call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::auth::AuthorizedClient;
use crate::sanitize;

/// Errors that can occur while recording audit rows.
#[derive(Error, Debug)]
pub enum AuditError {
    /// No tabular log destination is configured.
    #[error("Audit log destination is not configured")]
    MissingLogDestination,

    /// Transport-level failure talking to the log service.
    #[error("Audit transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The log service rejected the append.
    #[error("Audit API rejected append ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Result type for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;

/// One durable log row summarizing a processed source message.
///
/// Append-only; never mutated or deleted by this system.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub sender: String,
    pub date: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    /// Remote ids of the files distributed from this message's
    /// attachments — never from another message.
    pub remote_ids: Vec<String>,
    pub processed_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Fixed column order: sender, date, subject, invoice number or
    /// empty, comma-joined remote ids, processed-at.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.sender.clone(),
            self.date.clone(),
            self.subject.clone(),
            self.invoice_number.clone().unwrap_or_default(),
            self.remote_ids.join(", "),
            self.processed_at.to_rfc3339(),
        ]
    }
}

/// Append-only tabular log destination.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Appends all rows in one call; the batch is all-or-nothing.
    async fn append_rows(&self, log_id: &str, rows: Vec<Vec<String>>) -> Result<()>;
}

/// Default base URL of the spreadsheet append surface.
pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Tab and column range receiving audit rows.
const APPEND_RANGE: &str = "Sheet1!A:F";

/// HTTP audit log speaking the Sheets-style values-append protocol.
pub struct HttpAuditLog {
    client: AuthorizedClient,
    endpoint: String,
}

impl HttpAuditLog {
    pub fn new(client: AuthorizedClient) -> Self {
        Self::with_endpoint(client, DEFAULT_SHEETS_ENDPOINT)
    }

    pub fn with_endpoint(client: AuthorizedClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl AuditLog for HttpAuditLog {
    async fn append_rows(&self, log_id: &str, rows: Vec<Vec<String>>) -> Result<()> {
        let url = format!(
            "{}/{}/values/{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.endpoint, log_id, APPEND_RANGE
        );

        let response = self
            .client
            .post(&url)
            .json(&json!({ "values": rows }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuditError::Api {
                status,
                body: sanitize::truncate_error_body(&body),
            });
        }

        Ok(())
    }
}

/// Records audit entries for one run.
pub struct AuditRecorder<L> {
    log: L,
    log_id: Option<String>,
}

impl<L: AuditLog> AuditRecorder<L> {
    pub fn new(log: L, log_id: Option<String>) -> Self {
        Self { log, log_id }
    }

    /// Appends one row per entry in a single batched call.
    pub async fn record(&self, entries: &[AuditEntry]) -> Result<()> {
        let log_id = self
            .log_id
            .as_deref()
            .ok_or(AuditError::MissingLogDestination)?;

        let rows: Vec<Vec<String>> = entries.iter().map(AuditEntry::to_row).collect();
        self.log.append_rows(log_id, rows).await?;

        info!("Appended {} audit rows to log {}", entries.len(), log_id);
        Ok(())
    }
}
