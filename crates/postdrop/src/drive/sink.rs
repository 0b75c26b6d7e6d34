//! Remote storage sink.
//!
//! The HTTP implementation speaks a Drive-style multipart upload
//! protocol: a JSON metadata part naming the file and its parent folder,
//! followed by the raw media part.

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthorizedClient;
use crate::sanitize;

use super::error::{DistributeError, Result};

/// Default base URL for the storage upload surface.
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "https://www.googleapis.com/upload/drive/v3/files";

/// Fixed boundary for the two-part metadata+media body.
const MULTIPART_BOUNDARY: &str = "postdrop_upload";

/// A file staged for upload.
#[derive(Debug, Clone)]
pub struct OutboundFile {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Remote identifiers of one stored file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub web_view_link: Option<String>,
}

/// Destination container operations.
#[async_trait]
pub trait StorageSink: Send + Sync {
    /// Uploads one named, typed payload into `folder_id`.
    async fn upload(&self, file: &OutboundFile, folder_id: &str) -> Result<StoredFile>;
}

/// HTTP storage sink.
pub struct HttpStorageSink {
    client: AuthorizedClient,
    endpoint: String,
}

impl HttpStorageSink {
    pub fn new(client: AuthorizedClient) -> Self {
        Self::with_endpoint(client, DEFAULT_UPLOAD_ENDPOINT)
    }

    pub fn with_endpoint(client: AuthorizedClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl StorageSink for HttpStorageSink {
    async fn upload(&self, file: &OutboundFile, folder_id: &str) -> Result<StoredFile> {
        let metadata = json!({
            "name": file.name,
            "mimeType": file.mime_type,
            "parents": [folder_id],
        });

        let url = format!(
            "{}?uploadType=multipart&fields=id,webViewLink",
            self.endpoint
        );
        let body = multipart_related(&metadata.to_string(), &file.mime_type, &file.data);

        debug!("Uploading '{}' ({} bytes)", file.name, file.data.len());

        let response = self
            .client
            .post(&url)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", MULTIPART_BOUNDARY),
            )
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DistributeError::Api {
                name: file.name.clone(),
                status,
                body: sanitize::truncate_error_body(&text),
            });
        }

        Ok(response.json().await?)
    }
}

/// Builds a `multipart/related` body: JSON metadata part, then the media
/// part.
fn multipart_related(metadata: &str, mime_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + data.len() + 256);
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!("--{MULTIPART_BOUNDARY}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}
