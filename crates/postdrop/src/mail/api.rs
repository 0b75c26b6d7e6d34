//! Remote mail-service operations and wire types.
//!
//! The HTTP implementation targets a Gmail-style REST surface; tests
//! substitute the trait with in-memory doubles.

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthorizedClient;
use crate::sanitize;

use super::error::{MailError, Result};

/// Default base URL of the mail REST surface.
pub const DEFAULT_MAIL_ENDPOINT: &str = "https://gmail.googleapis.com/gmail/v1";

/// Response of a message-list call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageList {
    #[serde(default)]
    pub messages: Vec<MessageRef>,
}

/// Reference to one message in a list response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
}

/// One message with headers and body structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetail {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub payload: Option<MessagePayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// One body part. Attachment parts carry a filename and an attachment
/// reference in their body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub body: Option<PartBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    #[serde(default)]
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// A fetched attachment body, still transport-encoded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentBody {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Operations against the remote mail service.
#[async_trait]
pub trait MailApi: Send + Sync {
    /// Lists unread messages matching `query`, newest first, at most
    /// `limit`.
    async fn list_unread(&self, query: &str, limit: u32) -> Result<Vec<MessageRef>>;

    /// Fetches one message with full headers and body structure.
    async fn get_message(&self, id: &str) -> Result<MessageDetail>;

    /// Fetches one attachment body by reference.
    async fn get_attachment(&self, message_id: &str, attachment_id: &str)
        -> Result<AttachmentBody>;

    /// Removes the unread state from a message.
    async fn mark_read(&self, id: &str) -> Result<()>;
}

/// HTTP mail API speaking the Gmail-style REST protocol.
pub struct HttpMailApi {
    client: AuthorizedClient,
    endpoint: String,
}

impl HttpMailApi {
    pub fn new(client: AuthorizedClient) -> Self {
        Self::with_endpoint(client, DEFAULT_MAIL_ENDPOINT)
    }

    pub fn with_endpoint(client: AuthorizedClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    async fn check(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(MailError::Api {
            context: context.to_string(),
            status,
            body: sanitize::truncate_error_body(&body),
        })
    }
}

#[async_trait]
impl MailApi for HttpMailApi {
    async fn list_unread(&self, query: &str, limit: u32) -> Result<Vec<MessageRef>> {
        let url = format!("{}/users/me/messages", self.endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("maxResults", &limit.to_string())])
            .send()
            .await?;
        let response = Self::check(response, "message list").await?;

        let list: MessageList = response.json().await?;
        debug!("Message list returned {} references", list.messages.len());
        Ok(list.messages)
    }

    async fn get_message(&self, id: &str) -> Result<MessageDetail> {
        let url = format!("{}/users/me/messages/{}", self.endpoint, id);
        let response = self
            .client
            .get(&url)
            .query(&[("format", "full")])
            .send()
            .await?;
        let response = Self::check(response, "message fetch").await?;

        Ok(response.json().await?)
    }

    async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<AttachmentBody> {
        let url = format!(
            "{}/users/me/messages/{}/attachments/{}",
            self.endpoint, message_id, attachment_id
        );
        let response = self.client.get(&url).send().await?;
        let response = Self::check(response, "attachment fetch").await?;

        Ok(response.json().await?)
    }

    async fn mark_read(&self, id: &str) -> Result<()> {
        let url = format!("{}/users/me/messages/{}/modify", self.endpoint, id);
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "addLabelIds": ["INBOX"],
                "removeLabelIds": ["UNREAD"],
            }))
            .send()
            .await?;
        Self::check(response, "mark read").await?;

        debug!("Removed unread state from message {}", id);
        Ok(())
    }
}
