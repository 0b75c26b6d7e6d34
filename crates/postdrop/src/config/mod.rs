//! Environment-backed runtime configuration.
//!
//! All values the core consumes come from the process environment; the
//! entry-point surface loads them once and hands the resulting `Config`
//! to the components that need it.

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

use crate::auth::provider::{DEFAULT_AUTH_ENDPOINT, DEFAULT_TOKEN_ENDPOINT};
use crate::drive::DEFAULT_UPLOAD_CONCURRENCY;

/// Errors raised while loading configuration from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is not set")]
    MissingVar(&'static str),

    #[error("Environment variable '{name}' is invalid: {reason}")]
    InvalidVar { name: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

const ENV_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "GOOGLE_CLIENT_SECRET";
const ENV_REDIRECT_URI: &str = "GOOGLE_REDIRECT_URI";
const ENV_AUTH_ENDPOINT: &str = "OAUTH_AUTH_ENDPOINT";
const ENV_TOKEN_ENDPOINT: &str = "OAUTH_TOKEN_ENDPOINT";
const ENV_DRIVE_FOLDER_ID: &str = "GOOGLE_DRIVE_FOLDER_ID";
const ENV_SHEET_ID: &str = "GOOGLE_SHEET_ID";
const ENV_TOKEN_PATH: &str = "TOKEN_DB_PATH";
const ENV_API_KEY: &str = "API_KEY";
const ENV_UPLOAD_CONCURRENCY: &str = "UPLOAD_CONCURRENCY";

/// Fallback location of the persisted credential record.
const DEFAULT_TOKEN_PATH: &str = "./tokens.json";

/// Identity-provider (OAuth2) client settings.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
    /// Consent-page endpoint for building authorization URLs.
    pub auth_endpoint: String,
    /// Token endpoint for code exchange and refresh grants.
    pub token_endpoint: String,
}

/// Full runtime configuration for the single configured account.
#[derive(Debug, Clone)]
pub struct Config {
    pub identity: IdentityConfig,
    /// Destination storage folder for distributed files.
    pub drive_folder_id: Option<String>,
    /// Destination tabular log receiving audit rows.
    pub sheet_id: Option<String>,
    /// Location of the persisted credential record.
    pub token_path: PathBuf,
    /// Caller-presented credential checked by the process-archive gate.
    pub api_key: Option<SecretString>,
    /// Fan-out limit for concurrent uploads within one batch.
    pub upload_concurrency: usize,
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// Identity client id, secret and redirect URI are required; the
    /// destination identifiers are optional here and validated by the
    /// components that need them.
    pub fn from_env() -> Result<Self> {
        let identity = IdentityConfig {
            client_id: require(ENV_CLIENT_ID)?,
            client_secret: SecretString::from(require(ENV_CLIENT_SECRET)?),
            redirect_uri: require(ENV_REDIRECT_URI)?,
            auth_endpoint: optional(ENV_AUTH_ENDPOINT)
                .unwrap_or_else(|| DEFAULT_AUTH_ENDPOINT.to_string()),
            token_endpoint: optional(ENV_TOKEN_ENDPOINT)
                .unwrap_or_else(|| DEFAULT_TOKEN_ENDPOINT.to_string()),
        };

        let upload_concurrency = match optional(ENV_UPLOAD_CONCURRENCY) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(value) if value >= 1 => value,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        name: ENV_UPLOAD_CONCURRENCY,
                        reason: format!("'{}' is not a positive integer", raw),
                    })
                }
            },
            None => DEFAULT_UPLOAD_CONCURRENCY,
        };

        Ok(Self {
            identity,
            drive_folder_id: optional(ENV_DRIVE_FOLDER_ID),
            sheet_id: optional(ENV_SHEET_ID),
            token_path: PathBuf::from(
                optional(ENV_TOKEN_PATH).unwrap_or_else(|| DEFAULT_TOKEN_PATH.to_string()),
            ),
            api_key: optional(ENV_API_KEY).map(SecretString::from),
            upload_concurrency,
        })
    }
}

/// Reads a required environment variable, trimming whitespace.
fn require(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        Ok(_) => Err(ConfigError::MissingVar(name)),
        Err(std::env::VarError::NotPresent) => Err(ConfigError::MissingVar(name)),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidVar {
            name,
            reason: "value is not valid UTF-8".to_string(),
        }),
    }
}

/// Reads an optional environment variable; empty values count as unset.
fn optional(name: &'static str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    fn set_required_vars() {
        std::env::set_var(ENV_CLIENT_ID, "client-id");
        std::env::set_var(ENV_CLIENT_SECRET, "client-secret");
        std::env::set_var(ENV_REDIRECT_URI, "https://app.example.com/auth/callback");
    }

    fn clear_all_vars() {
        for name in [
            ENV_CLIENT_ID,
            ENV_CLIENT_SECRET,
            ENV_REDIRECT_URI,
            ENV_AUTH_ENDPOINT,
            ENV_TOKEN_ENDPOINT,
            ENV_DRIVE_FOLDER_ID,
            ENV_SHEET_ID,
            ENV_TOKEN_PATH,
            ENV_API_KEY,
            ENV_UPLOAD_CONCURRENCY,
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_minimal() {
        clear_all_vars();
        set_required_vars();

        let config = Config::from_env().unwrap();
        assert_eq!(config.identity.client_id, "client-id");
        assert_eq!(config.identity.auth_endpoint, DEFAULT_AUTH_ENDPOINT);
        assert_eq!(config.identity.token_endpoint, DEFAULT_TOKEN_ENDPOINT);
        assert!(config.drive_folder_id.is_none());
        assert!(config.sheet_id.is_none());
        assert_eq!(config.token_path, PathBuf::from(DEFAULT_TOKEN_PATH));
        assert_eq!(config.upload_concurrency, DEFAULT_UPLOAD_CONCURRENCY);
    }

    #[test]
    #[serial]
    fn test_from_env_missing_client_id() {
        clear_all_vars();
        std::env::set_var(ENV_CLIENT_SECRET, "client-secret");
        std::env::set_var(ENV_REDIRECT_URI, "https://app.example.com/auth/callback");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ENV_CLIENT_ID)));
    }

    #[test]
    #[serial]
    fn test_from_env_full() {
        clear_all_vars();
        set_required_vars();
        std::env::set_var(ENV_DRIVE_FOLDER_ID, "folder-123");
        std::env::set_var(ENV_SHEET_ID, "sheet-456");
        std::env::set_var(ENV_TOKEN_PATH, "/var/lib/postdrop/tokens.json");
        std::env::set_var(ENV_UPLOAD_CONCURRENCY, "8");

        let config = Config::from_env().unwrap();
        assert_eq!(config.drive_folder_id.as_deref(), Some("folder-123"));
        assert_eq!(config.sheet_id.as_deref(), Some("sheet-456"));
        assert_eq!(
            config.token_path,
            PathBuf::from("/var/lib/postdrop/tokens.json")
        );
        assert_eq!(config.upload_concurrency, 8);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_zero_concurrency() {
        clear_all_vars();
        set_required_vars();
        std::env::set_var(ENV_UPLOAD_CONCURRENCY, "0");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidVar {
                name: ENV_UPLOAD_CONCURRENCY,
                ..
            }
        ));
    }

    #[test]
    #[serial]
    fn test_empty_value_counts_as_unset() {
        clear_all_vars();
        set_required_vars();
        std::env::set_var(ENV_DRIVE_FOLDER_ID, "   ");

        let config = Config::from_env().unwrap();
        assert!(config.drive_folder_id.is_none());
    }
}
