//! Shared doubles and builders for integration tests.
//!
//! The doubles are cheap-clone handles over shared state so tests can
//! keep inspecting them after moving a clone into the component under
//! test.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use zip::write::SimpleFileOptions;

use postdrop::audit::{AuditLog, Result as AuditResult};
use postdrop::drive::{DistributeError, OutboundFile, StorageSink, StoredFile};
use postdrop::mail::api::{
    AttachmentBody, Header, MailApi, MessageDetail, MessagePart, MessagePayload, MessageRef,
    PartBody,
};
use postdrop::mail::error::{MailError, Result as MailResult};

/// Builder for mail-service message doubles.
pub struct MessageBuilder {
    id: String,
    headers: Vec<Header>,
    parts: Vec<MessagePart>,
    attachments: Vec<(String, Vec<u8>)>,
}

impl MessageBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            headers: Vec::new(),
            parts: Vec::new(),
            attachments: Vec::new(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push(Header {
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn attachment(mut self, filename: &str, mime_type: &str, data: &[u8]) -> Self {
        let attachment_id = format!("att-{}", self.attachments.len() + 1);
        self.parts.push(MessagePart {
            filename: filename.to_string(),
            mime_type: Some(mime_type.to_string()),
            body: Some(PartBody {
                attachment_id: Some(attachment_id.clone()),
                data: None,
                size: Some(data.len() as u64),
            }),
        });
        self.attachments.push((attachment_id, data.to_vec()));
        self
    }

    /// Adds a body part without a filename (not an attachment).
    pub fn body_part(mut self, mime_type: &str) -> Self {
        self.parts.push(MessagePart {
            filename: String::new(),
            mime_type: Some(mime_type.to_string()),
            body: None,
        });
        self
    }

    pub fn build(self) -> BuiltMessage {
        let detail = MessageDetail {
            id: self.id.clone(),
            thread_id: format!("thread-{}", self.id),
            payload: Some(MessagePayload {
                headers: self.headers,
                parts: self.parts,
            }),
        };
        let attachments = self
            .attachments
            .into_iter()
            .map(|(attachment_id, data)| ((self.id.clone(), attachment_id), data))
            .collect();
        BuiltMessage {
            detail,
            attachments,
        }
    }
}

pub struct BuiltMessage {
    pub detail: MessageDetail,
    pub attachments: Vec<((String, String), Vec<u8>)>,
}

#[derive(Default)]
struct MailState {
    messages: Vec<MessageDetail>,
    attachments: HashMap<(String, String), Vec<u8>>,
    marked_read: Mutex<Vec<String>>,
}

/// Mail-service double serving prebuilt messages.
#[derive(Clone, Default)]
pub struct FakeMailApi {
    state: Arc<MailState>,
}

impl FakeMailApi {
    pub fn new(built: Vec<BuiltMessage>) -> Self {
        let mut messages = Vec::new();
        let mut attachments = HashMap::new();
        for message in built {
            messages.push(message.detail);
            attachments.extend(message.attachments);
        }
        Self {
            state: Arc::new(MailState {
                messages,
                attachments,
                marked_read: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Message ids marked read so far, in call order.
    pub fn marked_read(&self) -> Vec<String> {
        self.state.marked_read.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailApi for FakeMailApi {
    async fn list_unread(&self, _query: &str, limit: u32) -> MailResult<Vec<MessageRef>> {
        Ok(self
            .state
            .messages
            .iter()
            .take(limit as usize)
            .map(|m| MessageRef {
                id: m.id.clone(),
                thread_id: m.thread_id.clone(),
            })
            .collect())
    }

    async fn get_message(&self, id: &str) -> MailResult<MessageDetail> {
        self.state
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| MailError::Api {
                context: "message fetch".to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
                body: "unknown message".to_string(),
            })
    }

    async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> MailResult<AttachmentBody> {
        let key = (message_id.to_string(), attachment_id.to_string());
        let data = self
            .state
            .attachments
            .get(&key)
            .ok_or_else(|| MailError::MissingAttachmentData(attachment_id.to_string()))?;
        Ok(AttachmentBody {
            data: Some(URL_SAFE.encode(data)),
            size: Some(data.len() as u64),
        })
    }

    async fn mark_read(&self, id: &str) -> MailResult<()> {
        self.state.marked_read.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

/// One recorded upload: folder id, file name, mime type, size.
pub type RecordedUpload = (String, String, String, u64);

#[derive(Default)]
struct SinkState {
    fail_names: HashSet<String>,
    counter: AtomicUsize,
    uploads: Mutex<Vec<RecordedUpload>>,
}

/// Storage-sink double recording uploads; fails configured file names.
#[derive(Clone, Default)]
pub struct FakeStorageSink {
    state: Arc<SinkState>,
}

impl FakeStorageSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(names: &[&str]) -> Self {
        Self {
            state: Arc::new(SinkState {
                fail_names: names.iter().map(|n| n.to_string()).collect(),
                ..SinkState::default()
            }),
        }
    }

    /// Successful uploads recorded so far.
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.state.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageSink for FakeStorageSink {
    async fn upload(
        &self,
        file: &OutboundFile,
        folder_id: &str,
    ) -> Result<StoredFile, DistributeError> {
        if self.state.fail_names.contains(&file.name) {
            return Err(DistributeError::Api {
                name: file.name.clone(),
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "storage unavailable".to_string(),
            });
        }
        let n = self.state.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.uploads.lock().unwrap().push((
            folder_id.to_string(),
            file.name.clone(),
            file.mime_type.clone(),
            file.data.len() as u64,
        ));
        Ok(StoredFile {
            id: Some(format!("file-{}", n)),
            web_view_link: Some(format!("https://storage.example.com/file-{}", n)),
        })
    }
}

#[derive(Default)]
struct LogState {
    batches: Mutex<Vec<(String, Vec<Vec<String>>)>>,
}

/// Audit-log double recording appended batches.
#[derive(Clone, Default)]
pub struct FakeAuditLog {
    state: Arc<LogState>,
}

impl FakeAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appended batches so far: (log id, rows).
    pub fn batches(&self) -> Vec<(String, Vec<Vec<String>>)> {
        self.state.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditLog for FakeAuditLog {
    async fn append_rows(&self, log_id: &str, rows: Vec<Vec<String>>) -> AuditResult<()> {
        self.state
            .batches
            .lock()
            .unwrap()
            .push((log_id.to_string(), rows));
        Ok(())
    }
}

/// Builds an in-memory ZIP archive from (name, data) entries and
/// explicit directory markers.
pub fn build_zip(entries: &[(&str, &[u8])], directories: &[&str]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for directory in directories {
        writer.add_directory(*directory, options).unwrap();
    }
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

/// Serves one HTTP response on a random local port and returns the URL.
pub async fn serve_once(status: u16, body: Vec<u8>) -> String {
    serve_once_with_delay(status, body, std::time::Duration::ZERO).await
}

/// Serves one HTTP response after an artificial delay (for timeout
/// tests).
pub async fn serve_once_with_delay(
    status: u16,
    body: Vec<u8>,
    delay: std::time::Duration,
) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            // Drain the request head before responding.
            let mut buf = vec![0u8; 8192];
            let mut seen = Vec::new();
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        seen.extend_from_slice(&buf[..n]);
                        if seen.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let reason = match status {
                200 => "OK",
                404 => "Not Found",
                _ => "Error",
            };
            let head = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                reason,
                body.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&body).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}/archive.zip", addr)
}
