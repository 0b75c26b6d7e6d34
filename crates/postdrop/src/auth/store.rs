//! Single-account credential store with transparent refresh.

use std::path::PathBuf;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::client::AuthorizedClient;
use super::error::{AuthError, Result};
use super::provider::{create_http_client, IdentityProvider};
use super::token::TokenSet;

/// Owns the single persisted credential set and hands out authorized
/// clients, refreshing and persisting as needed.
pub struct CredentialStore<P> {
    provider: P,
    token_path: PathBuf,
    http: reqwest::Client,
    /// Serializes refresh-then-persist so two concurrent callers never
    /// race two refreshes against the same refresh token.
    refresh_lock: Mutex<()>,
}

impl<P: IdentityProvider> CredentialStore<P> {
    pub fn new(provider: P, token_path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            provider,
            token_path: token_path.into(),
            http: create_http_client()?,
            refresh_lock: Mutex::new(()),
        })
    }

    /// Builds the consent URL for the given scope set. No side effects.
    pub fn authorize_url(&self, scopes: &[&str]) -> Result<String> {
        self.provider.authorize_url(scopes)
    }

    /// Exchanges a one-time authorization code and persists the result.
    pub async fn exchange_and_save(&self, code: &str) -> Result<()> {
        let response = self.provider.exchange_code(code).await?;
        let tokens = TokenSet::from_response(response, None, Utc::now());
        self.persist(&tokens).await?;
        info!("Credential record saved to {}", self.token_path.display());
        Ok(())
    }

    /// Returns a client authorized with a fresh access token.
    ///
    /// Loads the persisted record, refreshes it when the stored expiry is
    /// at or before the current time, and persists the new record before
    /// returning. Refresh failures propagate; stale tokens are never
    /// returned as a fallback.
    pub async fn authorized_client(&self) -> Result<AuthorizedClient> {
        let _guard = self.refresh_lock.lock().await;

        let mut tokens = self.load().await?;

        if tokens.is_expired(Utc::now()) {
            info!("Access token expired, refreshing");
            let refresh_token = tokens
                .refresh_token
                .clone()
                .ok_or(AuthError::MissingRefreshToken)?;

            let response = self.provider.refresh(&refresh_token).await?;
            tokens = TokenSet::from_response(response, Some(refresh_token), Utc::now());
            self.persist(&tokens).await?;
            debug!("Refreshed credential persisted");
        }

        Ok(AuthorizedClient::new(self.http.clone(), tokens.access_token))
    }

    async fn load(&self) -> Result<TokenSet> {
        let bytes = match tokio::fs::read(&self.token_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::NotAuthorized(
                    self.token_path.display().to_string(),
                ))
            }
            Err(e) => {
                return Err(AuthError::ReadRecord {
                    path: self.token_path.clone(),
                    source: e,
                })
            }
        };

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Overwrites the credential record atomically (temp file + rename).
    async fn persist(&self, tokens: &TokenSet) -> Result<()> {
        let json = serde_json::to_vec_pretty(tokens)?;

        let tmp_path = self.token_path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &json)
            .await
            .map_err(|e| AuthError::WriteRecord {
                path: tmp_path.clone(),
                source: e,
            })?;
        tokio::fs::rename(&tmp_path, &self.token_path)
            .await
            .map_err(|e| AuthError::WriteRecord {
                path: self.token_path.clone(),
                source: e,
            })?;

        Ok(())
    }
}
