//! Credential lifecycle error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during credential operations.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The authorization code was rejected by the identity service.
    #[error("Authorization code exchange failed: {0}")]
    ExchangeFailed(String),

    /// No credential record exists yet; the consent flow must run first.
    #[error("Not authorized: no credential record at '{0}'. Complete the authorization flow first.")]
    NotAuthorized(String),

    /// Token refresh was rejected. Stale tokens are never reused.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// The stored record has no refresh token to renew with.
    #[error("Credential record has no refresh token; re-authorization is required")]
    MissingRefreshToken,

    #[error("Failed to read credential record '{path}': {source}")]
    ReadRecord {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write credential record '{path}': {source}")]
    WriteRecord {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted record is not a valid token set.
    #[error("Credential record is malformed: {0}")]
    MalformedRecord(#[from] serde_json::Error),

    /// HTTP client construction or endpoint configuration failed.
    #[error("HTTP client error: {0}")]
    Http(String),
}

/// Result type for credential operations.
pub type Result<T> = std::result::Result<T, AuthError>;
