//! Remote identity-provider operations (authorization-code grant).
//!
//! Implements the consent-URL construction, code exchange and refresh
//! grants against a Google-style OAuth2 token endpoint.

use std::time::Duration;

use async_trait::async_trait;
use log::info;
use reqwest::{Client, Url};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::IdentityConfig;
use crate::sanitize;

use super::error::{AuthError, Result};

/// Default consent-page endpoint.
pub const DEFAULT_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Default token endpoint for exchange and refresh grants.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Scopes requested for the single account: read and modify mail, write
/// files into storage, append spreadsheet rows.
pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/spreadsheets",
];

/// Default connect timeout for HTTP requests (10 seconds).
pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout for HTTP requests (30 seconds).
pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates an HTTP client with appropriate timeouts.
pub(crate) fn create_http_client() -> Result<Client> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AuthError::Http(format!("Failed to create HTTP client: {}", e)))
}

/// Response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,

    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,

    /// Lifetime in seconds of the access token.
    #[serde(default)]
    pub expires_in: Option<u64>,

    /// The refresh token (omitted on most refresh responses).
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Space-separated list of granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

/// Operations against the remote identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Builds the consent URL for the given scope set. No side effects.
    fn authorize_url(&self, scopes: &[&str]) -> Result<String>;

    /// Exchanges a one-time authorization code for a token set.
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse>;

    /// Obtains a fresh access token from a refresh token.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse>;
}

/// HTTP identity provider posting form-encoded grants.
pub struct HttpIdentityProvider {
    client: Client,
    config: IdentityConfig,
}

impl HttpIdentityProvider {
    pub fn new(config: IdentityConfig) -> Result<Self> {
        Ok(Self {
            client: create_http_client()?,
            config,
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    fn authorize_url(&self, scopes: &[&str]) -> Result<String> {
        let mut url = Url::parse(&self.config.auth_endpoint).map_err(|e| {
            AuthError::Http(format!(
                "Invalid authorization endpoint '{}': {}",
                self.config.auth_endpoint, e
            ))
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &scopes.join(" "))
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");

        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        info!("Exchanging authorization code for tokens");

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::ExchangeFailed(format!(
                "token endpoint returned {}: {}",
                status,
                sanitize::truncate_error_body(&body)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::ExchangeFailed(format!("unparseable token response: {}", e)))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        info!("Refreshing access token");

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.config.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::RefreshFailed(format!(
                "token endpoint returned {}: {}",
                status,
                sanitize::truncate_error_body(&body)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::RefreshFailed(format!("unparseable refresh response: {}", e)))
    }
}
