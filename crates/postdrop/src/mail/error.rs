//! Mailbox source error types.

use thiserror::Error;

/// Errors that can occur while pulling messages from the mail service.
#[derive(Error, Debug)]
pub enum MailError {
    /// Transport-level failure talking to the mail service.
    #[error("Mail request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The mail service rejected a request.
    #[error("Mail API rejected {context} ({status}): {body}")]
    Api {
        context: String,
        status: reqwest::StatusCode,
        body: String,
    },

    /// An attachment reference carried no transport payload.
    #[error("Attachment '{0}' has no transport payload")]
    MissingAttachmentData(String),

    /// The attachment payload was not valid transport encoding.
    #[error("Failed to decode attachment transport encoding: {0}")]
    DecodeFailed(#[from] base64::DecodeError),
}

/// Result type for mail operations.
pub type Result<T> = std::result::Result<T, MailError>;
