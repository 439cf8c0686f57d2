//! Session token minting and refresh via the Clerk Backend API.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::claims::decode_payload;
use crate::client::{ClerkClient, segment};
use crate::error::AuthError;

/// A session token returned by `POST /sessions/{id}/tokens[/{template}]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionToken {
    pub jwt: String,
    #[serde(default)]
    pub object: Option<String>,
}

impl SessionToken {
    /// Expiry read from the token's `exp` claim, without verification.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedClaims` if the JWT cannot be decoded or
    /// has no usable `exp`.
    pub fn expires_at(&self) -> Result<DateTime<Utc>, AuthError> {
        decode_expiry(&self.jwt)
    }
}

/// Decode JWT `exp` claim without full JWKS validation (for quick expiry checks).
///
/// This is a best-effort check and does NOT verify the signature.
///
/// # Errors
///
/// Returns `AuthError::MalformedClaims` if the JWT format is invalid or the
/// `exp` claim is missing or cannot be parsed.
pub fn decode_expiry(jwt: &str) -> Result<DateTime<Utc>, AuthError> {
    let payload = decode_payload(jwt)?;
    let exp = payload
        .get("exp")
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| AuthError::MalformedClaims("missing exp claim".into()))?;
    DateTime::from_timestamp(exp, 0)
        .ok_or_else(|| AuthError::MalformedClaims("invalid exp timestamp".into()))
}

#[derive(Deserialize)]
struct CreatedSession {
    id: String,
}

impl ClerkClient {
    /// Mint a fresh token for an existing session.
    ///
    /// `template` selects a JWT template; `None` falls back to the configured
    /// default template, and without one Clerk's plain session token is minted.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ClerkApi` if Clerk rejects the session or template,
    /// `AuthError::Timeout`/`AuthError::Transport` on network failure.
    pub async fn refresh_session_token(
        &self,
        session_id: &str,
        template: Option<&str>,
        expires_in_seconds: Option<u32>,
    ) -> Result<SessionToken, AuthError> {
        if session_id.is_empty() {
            return Err(AuthError::InvalidRequest("session id is empty".into()));
        }

        let path = session_token_path(session_id, template.or_else(|| self.default_template()));
        let mut request = self.request(Method::POST, &path);
        if let Some(secs) = expires_in_seconds {
            request = request.json(&json!({ "expires_in_seconds": secs }));
        }

        let token: SessionToken = self.send_json("refresh session token", request).await?;
        tracing::debug!(session_id, "session token refreshed");
        Ok(token)
    }

    /// Create a session for `user_id` (Clerk allows this for development
    /// instances and backend-only flows). Returns the session id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ClerkApi` if session creation is refused.
    pub async fn create_session(&self, user_id: &str) -> Result<String, AuthError> {
        let request = self
            .request(Method::POST, "/sessions")
            .json(&json!({ "user_id": user_id }));
        let session: CreatedSession = self.send_json("create session", request).await?;
        Ok(session.id)
    }
}

fn session_token_path(session_id: &str, template: Option<&str>) -> String {
    match template.filter(|t| !t.is_empty()) {
        Some(template) => format!(
            "/sessions/{}/tokens/{}",
            segment(session_id),
            segment(template)
        ),
        None => format!("/sessions/{}/tokens", segment(session_id)),
    }
}
