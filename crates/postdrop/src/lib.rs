pub mod archive;
pub mod audit;
pub mod auth;
pub mod config;
pub mod drive;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod mail;
pub mod naming;
pub mod sanitize;
pub mod scan;

pub use auth::{AuthorizedClient, CredentialStore, HttpIdentityProvider, DEFAULT_SCOPES};
pub use config::{Config, ConfigError};
pub use error::{PostdropError, Result};
pub use scan::{
    ArchiveProcessor, ProcessArchiveRequest, ProcessArchiveResponse, RunSummary, Scanner,
};
