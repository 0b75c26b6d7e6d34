//! Mailbox fetcher pulling attachments from unread matching messages.

use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use tracing::{debug, error, info};

use super::api::{Header, MailApi};
use super::error::{MailError, Result};

/// Keywords that qualify a subject for ingestion (matched
/// case-insensitively as substrings).
const SUBJECT_KEYWORDS: &[&str] = &["invoice", "receipt"];

/// Remote pre-filter mirroring the local subject predicate.
const UNREAD_QUERY: &str = "is:unread (subject:invoice OR subject:receipt)";

/// One mailbox item matched by the ingestion predicate.
#[derive(Debug, Clone)]
pub struct SourceMessage {
    pub id: String,
    pub thread_id: String,
    pub sender: String,
    pub date: String,
    pub subject: String,
    pub attachments: Vec<SourceAttachment>,
}

/// A raw attachment pulled from a source message. Transient; only its
/// distribution outcome outlives the run.
#[derive(Debug, Clone)]
pub struct SourceAttachment {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl SourceAttachment {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Pulls pending messages and their attachments from the mail service.
pub struct MailboxFetcher<M> {
    api: M,
}

impl<M: MailApi> MailboxFetcher<M> {
    pub fn new(api: M) -> Self {
        Self { api }
    }

    /// Fetches unread invoice-like messages with their attachments,
    /// bounded to the `limit` most recent.
    ///
    /// Each message is marked read immediately after its attachments are
    /// retrieved, before anything downstream runs. A later pipeline
    /// failure therefore leaves the message marked processed: at-most-once
    /// ingestion, trading guaranteed delivery for no duplicate
    /// distribution.
    ///
    /// Failures on individual messages are logged and skipped; they never
    /// abort the batch.
    pub async fn fetch_pending(&self, limit: u32) -> Result<Vec<SourceMessage>> {
        let refs = self.api.list_unread(UNREAD_QUERY, limit).await?;
        info!("Found {} matching messages", refs.len());

        let mut messages = Vec::new();
        for message_ref in refs {
            match self.fetch_one(&message_ref.id).await {
                Ok(Some(message)) => messages.push(message),
                Ok(None) => {}
                Err(e) => {
                    error!("Failed to fetch message {}: {}", message_ref.id, e);
                }
            }
        }

        Ok(messages)
    }

    async fn fetch_one(&self, id: &str) -> Result<Option<SourceMessage>> {
        let detail = self.api.get_message(id).await?;
        let Some(payload) = detail.payload else {
            debug!("Message {} has no payload", id);
            return Ok(None);
        };

        let sender = header_value(&payload.headers, "From");
        let date = header_value(&payload.headers, "Date");
        let subject = header_value(&payload.headers, "Subject");

        if !subject_matches(&subject) {
            debug!("Message {} subject does not match ingestion predicate", id);
            return Ok(None);
        }

        let mut attachments = Vec::new();
        for part in &payload.parts {
            if part.filename.is_empty() {
                continue;
            }
            let Some(attachment_id) = part.body.as_ref().and_then(|b| b.attachment_id.as_deref())
            else {
                continue;
            };

            let body = self.api.get_attachment(id, attachment_id).await?;
            let encoded = body
                .data
                .ok_or_else(|| MailError::MissingAttachmentData(part.filename.clone()))?;
            let data = decode_transport(&encoded)?;

            debug!(
                "Retrieved attachment '{}' ({} bytes) from message {}",
                part.filename,
                data.len(),
                id
            );

            attachments.push(SourceAttachment {
                name: part.filename.clone(),
                mime_type: part
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                data,
            });
        }

        // Remove the unread state now so the next run never reprocesses
        // this message, even if distribution or audit fails later.
        self.api.mark_read(id).await?;

        Ok(Some(SourceMessage {
            id: detail.id,
            thread_id: detail.thread_id,
            sender,
            date,
            subject,
            attachments,
        }))
    }
}

/// Case-insensitive header lookup with empty-string default.
fn header_value(headers: &[Header], name: &str) -> String {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.clone())
        .unwrap_or_default()
}

/// Case-insensitive substring match on the fixed keyword set.
fn subject_matches(subject: &str) -> bool {
    let lowered = subject.to_lowercase();
    SUBJECT_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// Attachment bodies arrive base64url-encoded; some services emit the
/// standard alphabet or drop the padding.
fn decode_transport(data: &str) -> Result<Vec<u8>> {
    URL_SAFE
        .decode(data)
        .or_else(|_| URL_SAFE_NO_PAD.decode(data))
        .or_else(|_| STANDARD.decode(data))
        .map_err(MailError::from)
}
