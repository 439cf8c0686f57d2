//! Long-lived Clerk Backend API client.
//!
//! One `reqwest::Client` (and its connection pool) is built from the config
//! and shared by every outbound call: membership listing, metadata patches,
//! session tokens. Cloning a `ClerkClient` is cheap.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use gate_config::ClerkConfig;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::error::AuthError;

#[derive(Clone)]
pub struct ClerkClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    secret_key: Arc<str>,
    default_template: Option<Arc<str>>,
    timeout: Duration,
}

impl fmt::Debug for ClerkClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClerkClient")
            .field("base_url", &self.base_url)
            .field("secret_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ClerkClient {
    /// Build the client from config.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` if no secret key is configured or the
    /// request timeout is zero, and `AuthError::Transport` if the HTTP client
    /// cannot be constructed.
    pub fn new(config: &ClerkConfig) -> Result<Self, AuthError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AuthError::Transport {
                operation: "build http client",
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: Arc::from(config.api_base()),
            secret_key: Arc::from(config.secret_key.as_str()),
            default_template: config.token_template().map(Arc::from),
            timeout: config.request_timeout(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn default_template(&self) -> Option<&str> {
        self.default_template.as_deref()
    }

    /// Absolute URL for an API path (`path` starts with `/`).
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Start a bearer-authenticated request against the Backend API.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header("Authorization", format!("Bearer {}", self.secret_key))
    }

    /// Send a request and decode a JSON body, mapping non-2xx responses to
    /// `AuthError::ClerkApi` with the provider's body as the message.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, AuthError> {
        let resp = request
            .send()
            .await
            .map_err(|e| self.transport_error(operation, &e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::ClerkApi {
                operation,
                status: status.as_u16(),
                message: body,
            });
        }

        resp.json().await.map_err(|e| AuthError::Transport {
            operation,
            message: format!("parse response: {e}"),
        })
    }

    fn transport_error(&self, operation: &'static str, error: &reqwest::Error) -> AuthError {
        if error.is_timeout() {
            AuthError::Timeout {
                operation,
                timeout: self.timeout,
            }
        } else {
            AuthError::Transport {
                operation,
                message: error.to_string(),
            }
        }
    }
}

/// Percent-encode a single path segment (ids come from callers and claims).
pub(crate) fn segment(value: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(value)
}
