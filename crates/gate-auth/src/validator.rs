//! Inbound session verification.
//!
//! [`TokenValidator`] is the seam between the resolver and Clerk's JWT
//! verification. [`ClerkTokenValidator`] is the production implementation,
//! backed by `clerk-rs` JWKS validation.

use std::sync::Arc;

use async_trait::async_trait;
use clerk_rs::ClerkConfiguration;
use clerk_rs::clerk::Clerk;
use clerk_rs::validators::authorizer::validate_jwt;
use clerk_rs::validators::jwks::MemoryCacheJwksProvider;
use gate_config::ClerkConfig;
use gate_core::UserId;
use reqwest::header::{AUTHORIZATION, COOKIE, HeaderMap};
use thiserror::Error;

use crate::claims::{SessionClaims, decode_payload};
use crate::error::AuthError;

/// Cookie Clerk's frontend SDKs use for same-origin session tokens.
pub const SESSION_COOKIE: &str = "__session";

/// Outcome of authenticating one inbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestState {
    SignedIn(Box<SessionClaims>),
    SignedOut(SignedOutReason),
}

impl RequestState {
    #[must_use]
    pub fn signed_in(claims: SessionClaims) -> Self {
        Self::SignedIn(Box::new(claims))
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignedOutReason {
    #[error("no session token in Authorization header or __session cookie")]
    MissingToken,
    #[error("session token rejected: {0}")]
    InvalidToken(String),
    #[error("authorized party {0:?} is not allowed")]
    UnauthorizedParty(Option<String>),
}

/// Verifies the session credential carried by an inbound request.
///
/// Implementations return `Ok(SignedOut(..))` for requests without a valid
/// session and reserve `Err` for failures unrelated to the caller's
/// credential.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<RequestState, AuthError>;
}

/// Extract the session token: `Authorization: Bearer` first (scheme matched
/// case-insensitively), then the
/// `__session` cookie.
#[must_use]
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim_start().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|v| !v.is_empty())
}

/// JWKS-backed validator.
///
/// Owns its JWKS provider, built once from the secret key. The
/// `MemoryCacheJwksProvider` caches Clerk's public keys internally, so one
/// validator should be shared across requests.
pub struct ClerkTokenValidator {
    provider: Arc<MemoryCacheJwksProvider>,
    authorized_parties: Vec<String>,
}

impl ClerkTokenValidator {
    #[must_use]
    pub fn new(config: &ClerkConfig) -> Self {
        let clerk_config =
            ClerkConfiguration::new(None, None, Some(config.secret_key.clone()), None);
        let clerk = Clerk::new(clerk_config);
        Self {
            provider: Arc::new(MemoryCacheJwksProvider::new(clerk)),
            authorized_parties: config.authorized_parties.clone(),
        }
    }

    /// Validate a Clerk JWT via JWKS and map its payload onto claims.
    ///
    /// # Errors
    ///
    /// Returns `SignedOutReason::InvalidToken` if the token is invalid,
    /// expired, or the JWKS endpoint is unreachable.
    pub async fn verify(&self, jwt: &str) -> Result<SessionClaims, SignedOutReason> {
        let clerk_jwt = validate_jwt(jwt, Arc::clone(&self.provider))
            .await
            .map_err(|e| SignedOutReason::InvalidToken(e.to_string()))?;

        // Signature is verified; read the custom template claims clerk-rs
        // does not model.
        let payload =
            decode_payload(jwt).map_err(|e| SignedOutReason::InvalidToken(e.to_string()))?;
        let mut claims = SessionClaims::from_payload(jwt, &payload);
        if claims.subject.is_none() {
            claims.subject = Some(UserId::Str(clerk_jwt.sub.clone()));
        }
        if claims.expires_at.is_none() {
            claims.expires_at = chrono::DateTime::from_timestamp(i64::from(clerk_jwt.exp), 0);
        }
        Ok(claims)
    }

    fn party_allowed(&self, azp: Option<&str>) -> bool {
        self.authorized_parties.is_empty()
            || azp.is_some_and(|azp| self.authorized_parties.iter().any(|p| p == azp))
    }
}

#[async_trait]
impl TokenValidator for ClerkTokenValidator {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<RequestState, AuthError> {
        let Some(jwt) = session_token_from_headers(headers) else {
            return Ok(RequestState::SignedOut(SignedOutReason::MissingToken));
        };

        let claims = match self.verify(jwt).await {
            Ok(claims) => claims,
            Err(reason) => {
                tracing::debug!(%reason, "session token failed verification");
                return Ok(RequestState::SignedOut(reason));
            }
        };

        if !self.party_allowed(claims.authorized_party.as_deref()) {
            tracing::warn!(
                azp = ?claims.authorized_party,
                "session token issued for an unrecognized authorized party",
            );
            return Ok(RequestState::SignedOut(SignedOutReason::UnauthorizedParty(
                claims.authorized_party,
            )));
        }

        Ok(RequestState::signed_in(claims))
    }
}
