//! Ready-to-use HTTP client carrying a bearer token.

use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};

/// An HTTP client authorized for the remote account-scoped services.
///
/// Handed out by the credential store; the wrapped access token is
/// guaranteed fresh at the time of issue.
#[derive(Clone, Debug)]
pub struct AuthorizedClient {
    http: Client,
    access_token: SecretString,
}

impl AuthorizedClient {
    pub(crate) fn new(http: Client, access_token: String) -> Self {
        Self {
            http,
            access_token: SecretString::from(access_token),
        }
    }

    /// Starts a GET request with the bearer token attached.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(self.access_token.expose_secret())
    }

    /// Starts a POST request with the bearer token attached.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http
            .post(url)
            .bearer_auth(self.access_token.expose_secret())
    }
}
