//! Persisted OAuth token record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::provider::TokenResponse;

/// Fallback access-token lifetime when the provider omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// One set of OAuth tokens for the single configured account.
///
/// Owned exclusively by the credential store; mutated only on refresh and
/// persisted as a single JSON record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Absolute expiry of `access_token`.
    pub expiry: DateTime<Utc>,
}

impl TokenSet {
    /// Builds a token set from a token-endpoint response.
    ///
    /// Refresh responses routinely omit `refresh_token`; the previously
    /// stored one is retained in that case.
    pub fn from_response(
        response: TokenResponse,
        previous_refresh: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let lifetime = response
            .expires_in
            .map(|secs| secs as i64)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expiry: now + Duration::seconds(lifetime),
        }
    }

    /// True when the access token has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry <= now
    }
}
