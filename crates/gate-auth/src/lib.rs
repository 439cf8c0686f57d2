//! # gate-auth
//!
//! Clerk integration for Gatehouse.
//!
//! Resolves an inbound request's session (`clerk-rs` JWKS validation) into a
//! [`UserRecord`], and wraps the Clerk Backend API calls a backend needs
//! around it: organization membership listing, user/organization metadata
//! merges, and session token refresh. All Backend API calls share one
//! long-lived [`ClerkClient`].

pub mod claims;
pub mod client;
pub mod error;
pub mod membership;
pub mod metadata;
pub mod resolver;
pub mod session;
pub mod validator;

pub use claims::SessionClaims;
pub use client::ClerkClient;
pub use error::AuthError;
pub use membership::{ListMembersParams, MembershipListing, MembershipLookup};
pub use metadata::{MetadataGateway, MetadataPatch};
pub use resolver::UserRecordResolver;
pub use session::SessionToken;
pub use validator::{ClerkTokenValidator, RequestState, TokenValidator};

use gate_config::ClerkConfig;
use gate_core::UserRecord;
use reqwest::header::HeaderMap;

/// Everything wired together from one [`ClerkConfig`]: built once at startup
/// and shared (e.g. behind an `Arc` in server state) for every request.
pub struct Gatehouse {
    client: ClerkClient,
    resolver: UserRecordResolver<ClerkTokenValidator, ClerkClient>,
}

impl Gatehouse {
    /// # Errors
    ///
    /// Returns `AuthError::Config` if no secret key is configured or the
    /// request timeout is zero.
    pub fn from_config(config: &ClerkConfig) -> Result<Self, AuthError> {
        let client = ClerkClient::new(config)?;
        let resolver = UserRecordResolver::new(
            ClerkTokenValidator::new(config),
            client.clone(),
            config.service_name.clone(),
            config.request_timeout(),
        );
        Ok(Self { client, resolver })
    }

    /// Resolve the signed-in user for an inbound request.
    ///
    /// # Errors
    ///
    /// See [`UserRecordResolver::resolve`].
    pub async fn resolve_user(&self, headers: &HeaderMap) -> Result<UserRecord, AuthError> {
        self.resolver.resolve(headers).await
    }

    #[must_use]
    pub const fn client(&self) -> &ClerkClient {
        &self.client
    }

    #[must_use]
    pub const fn resolver(&self) -> &UserRecordResolver<ClerkTokenValidator, ClerkClient> {
        &self.resolver
    }
}
