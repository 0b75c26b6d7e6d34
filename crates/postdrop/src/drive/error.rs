//! Distribution error types.

use thiserror::Error;

/// Errors that can occur while distributing files to storage.
#[derive(Error, Debug)]
pub enum DistributeError {
    /// No destination folder is configured.
    #[error("Destination folder is not configured")]
    MissingDestination,

    /// A shared folder link could not be reduced to an identifier.
    #[error("Invalid storage folder link: '{0}'")]
    InvalidFolderLink(String),

    /// Transport-level failure talking to the storage service.
    #[error("Upload transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The storage service rejected an upload.
    #[error("Storage API rejected upload of '{name}' ({status}): {body}")]
    Api {
        name: String,
        status: reqwest::StatusCode,
        body: String,
    },

    /// The remote accepted the upload but returned no file id.
    #[error("Storage API returned no id for '{0}'")]
    MissingRemoteId(String),
}

/// Result type for distribution operations.
pub type Result<T> = std::result::Result<T, DistributeError>;
