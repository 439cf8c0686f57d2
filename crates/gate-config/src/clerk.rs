//! Clerk connection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default Clerk Backend API base URL.
fn default_api_base_url() -> String {
    "https://api.clerk.com/v1".to_string()
}

/// Default service tag attached to auth errors.
fn default_service_name() -> String {
    "gatehouse".to_string()
}

/// Default timeout for each outbound call, in seconds.
const fn default_request_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClerkConfig {
    /// Clerk secret key (`sk_<environment>_<secret>`).
    #[serde(default)]
    pub secret_key: String,

    /// Clerk publishable key. Not needed for backend calls; kept for callers
    /// that hand it to a frontend.
    #[serde(default)]
    pub publishable_key: String,

    /// Backend API base URL, without a trailing slash.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Name of the calling service, attached to auth error messages.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Accepted `azp` values. Empty accepts any authorized party.
    #[serde(default)]
    pub authorized_parties: Vec<String>,

    /// Upper bound on each outbound call (token validation, membership
    /// lookup, metadata and token endpoints).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Default JWT template used when refreshing session tokens.
    #[serde(default)]
    pub token_template: String,
}

impl Default for ClerkConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            publishable_key: String::new(),
            api_base_url: default_api_base_url(),
            service_name: default_service_name(),
            authorized_parties: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
            token_template: String::new(),
        }
    }
}

impl ClerkConfig {
    /// Check if a usable secret key is present.
    pub fn is_configured(&self) -> bool {
        self.secret_key.starts_with("sk_")
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check the section is usable for backend calls: a secret key is set and
    /// the request timeout is non-zero.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` without a secret key, and
    /// `ConfigError::InvalidValue` for a zero request timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "clerk".into(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "clerk.request_timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed.
    pub fn api_base(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// The configured token template, if one is set.
    pub fn token_template(&self) -> Option<&str> {
        Some(self.token_template.as_str()).filter(|t| !t.is_empty())
    }
}
