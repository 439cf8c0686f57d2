//! Session → [`UserRecord`] resolution.
//!
//! The only flow with real control flow in the crate:
//! validate the request, pick the metadata namespace for the request's
//! organization context, fill in the role from membership when the token has
//! none, and assemble a fresh record.

use std::time::Duration;

use gate_core::{CoreError, Metadata, OrgId, UserId, UserRecord};
use reqwest::header::HeaderMap;

use crate::claims::SessionClaims;
use crate::error::AuthError;
use crate::membership::MembershipLookup;
use crate::validator::{RequestState, TokenValidator};

pub struct UserRecordResolver<V, M> {
    validator: V,
    membership: M,
    service: String,
    timeout: Duration,
}

impl<V, M> UserRecordResolver<V, M>
where
    V: TokenValidator,
    M: MembershipLookup,
{
    /// `service` tags every error; `timeout` bounds the validator call and
    /// the membership lookup separately.
    pub fn new(validator: V, membership: M, service: impl Into<String>, timeout: Duration) -> Self {
        Self {
            validator,
            membership,
            service: service.into(),
            timeout,
        }
    }

    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Resolve the caller's user record from an inbound request's headers.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` when the request has no valid session;
    /// any other failure is wrapped in `AuthError::ResolutionFailed`. A failed
    /// role lookup is not an error: the role is left unset.
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<UserRecord, AuthError> {
        match self.fetch_user_record(headers).await {
            Ok(record) => Ok(record),
            Err(error) if error.is_not_signed_in() => Err(error),
            Err(error) => {
                tracing::warn!(service = %self.service, %error, "user record resolution failed");
                Err(AuthError::ResolutionFailed {
                    service: self.service.clone(),
                    message: error.to_string(),
                })
            }
        }
    }

    async fn fetch_user_record(&self, headers: &HeaderMap) -> Result<UserRecord, AuthError> {
        let state = tokio::time::timeout(self.timeout, self.validator.authenticate(headers))
            .await
            .map_err(|_| AuthError::Timeout {
                operation: "session validation",
                timeout: self.timeout,
            })??;

        let claims = match state {
            RequestState::SignedIn(claims) => *claims,
            RequestState::SignedOut(reason) => {
                tracing::debug!(service = %self.service, %reason, "request is not signed in");
                return Err(AuthError::NotSignedIn {
                    service: self.service.clone(),
                });
            }
        };

        let user_id = claims
            .subject
            .clone()
            .ok_or(CoreError::MissingField("sub"))?;

        let role_slug = match (&claims.role_slug, &claims.org_id) {
            (Some(role), _) => Some(role.clone()),
            (None, Some(org_id)) => self.lookup_role(org_id, &user_id).await,
            (None, None) => None,
        };

        Ok(build_record(user_id, role_slug, claims))
    }

    async fn lookup_role(&self, org_id: &OrgId, user_id: &UserId) -> Option<String> {
        let org_id = org_id.to_string();
        let user_id = user_id.to_string();
        let lookup = self.membership.find_membership(&org_id, &user_id);

        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(Some(member))) => Some(member.role),
            Ok(Ok(None)) => {
                tracing::debug!(%org_id, %user_id, "user has no membership in the organization");
                None
            }
            Ok(Err(error)) => {
                tracing::warn!(%org_id, %user_id, %error, "role lookup failed; leaving role unset");
                None
            }
            Err(_) => {
                tracing::warn!(
                    %org_id,
                    %user_id,
                    timeout = ?self.timeout,
                    "role lookup timed out; leaving role unset",
                );
                None
            }
        }
    }
}

/// Choose exactly one metadata namespace.
///
/// In an organization context the organization's blob wins whenever the
/// token carries one (an empty object included). Otherwise the user's blob,
/// otherwise an empty map.
pub(crate) fn select_public_metadata(
    org_id: Option<&OrgId>,
    org_metadata: Option<Metadata>,
    user_metadata: Option<Metadata>,
) -> Metadata {
    match (org_id, org_metadata) {
        (Some(_), Some(org_metadata)) => org_metadata,
        _ => user_metadata.unwrap_or_default(),
    }
}

fn build_record(user_id: UserId, role_slug: Option<String>, claims: SessionClaims) -> UserRecord {
    let public_metadata = select_public_metadata(
        claims.org_id.as_ref(),
        claims.org_public_metadata,
        claims.user_public_metadata,
    );

    UserRecord {
        user_id,
        org_id: claims.org_id,
        first_name: claims.first_name,
        last_name: claims.last_name,
        email: claims.email,
        username: claims.username,
        phone_number: claims.phone_number,
        role_slug,
        profile_pic_url: claims.profile_pic_url,
        active: claims.active,
        role_ids: claims.role_ids,
        meta: claims.meta,
        created_at: claims.created_at,
        updated_at: claims.updated_at,
        workspace: claims.workspace,
        public_metadata: Some(public_metadata),
    }
}
