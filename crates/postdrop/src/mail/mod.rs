//! Mailbox ingestion source.
//!
//! Pulls attachments from unread matching messages via a Gmail-style
//! REST surface and marks each message read once its attachments have
//! been retrieved.

pub mod api;
pub mod error;
pub mod fetcher;

pub use api::{HttpMailApi, MailApi, DEFAULT_MAIL_ENDPOINT};
pub use error::MailError;
pub use fetcher::{MailboxFetcher, SourceAttachment, SourceMessage};
