use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The request carries no valid session. Terminal for the request.
    #[error("user is not signed in - service - {service}")]
    NotSignedIn { service: String },

    /// Anything else that went wrong while resolving the user record.
    #[error("failed to get user data: {message} - service - {service}")]
    ResolutionFailed { service: String, message: String },

    #[error("clerk API error ({operation}): HTTP {status}: {message}")]
    ClerkApi {
        operation: &'static str,
        status: u16,
        message: String,
    },

    #[error("clerk request failed ({operation}): {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("malformed session claims: {0}")]
    MalformedClaims(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Core(#[from] gate_core::CoreError),

    #[error(transparent)]
    Config(#[from] gate_config::ConfigError),
}

impl AuthError {
    #[must_use]
    pub const fn is_not_signed_in(&self) -> bool {
        matches!(self, Self::NotSignedIn { .. })
    }

    /// HTTP status a caller would typically answer with.
    ///
    /// `NotSignedIn` and `ResolutionFailed` both map to 401 but stay distinct
    /// variants, so callers can still tell a clean sign-out from a failure.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotSignedIn { .. }
            | Self::ResolutionFailed { .. }
            | Self::MalformedClaims(_)
            | Self::Core(_) => 401,
            Self::ClerkApi { status, .. } => *status,
            Self::Transport { .. } => 502,
            Self::Timeout { .. } => 504,
            Self::InvalidRequest(_) => 400,
            Self::Config(_) => 500,
        }
    }
}
