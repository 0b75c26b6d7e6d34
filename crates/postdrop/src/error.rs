use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostdropError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Credential error: {0}")]
    Auth(#[from] crate::auth::AuthError),

    #[error("Mail source error: {0}")]
    Mail(#[from] crate::mail::MailError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crate::fetch::FetchError),

    #[error("Archive error: {0}")]
    Archive(#[from] crate::archive::ArchiveError),

    #[error("Distribution error: {0}")]
    Distribute(#[from] crate::drive::DistributeError),

    #[error("Audit log error: {0}")]
    Audit(#[from] crate::audit::AuditError),
}

pub type Result<T> = std::result::Result<T, PostdropError>;
