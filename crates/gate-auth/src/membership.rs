//! Clerk organization membership listing.
//!
//! Calls `GET /organizations/{id}/memberships` directly via `reqwest`
//! (clerk-rs doesn't expose membership queries with filters).

use async_trait::async_trait;
use gate_core::{MembershipPage, Metadata, OrgMember};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::client::{ClerkClient, segment};
use crate::error::AuthError;

/// Largest page Clerk serves for membership listing.
pub const MAX_LIST_LIMIT: i64 = 500;
/// Clerk's default page size.
pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Finds a single user's membership in an organization.
///
/// `Ok(None)` means the user is not a member.
#[async_trait]
pub trait MembershipLookup: Send + Sync {
    async fn find_membership(
        &self,
        org_id: &str,
        user_id: &str,
    ) -> Result<Option<OrgMember>, AuthError>;
}

/// Query for [`ClerkClient::list_members`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMembersParams {
    /// Free-text filter on email, phone, username, name or user id.
    pub query: Option<String>,
    pub limit: i64,
    pub offset: i64,
    pub user_ids: Vec<String>,
}

impl Default for ListMembersParams {
    fn default() -> Self {
        Self {
            query: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
            user_ids: Vec::new(),
        }
    }
}

impl ListMembersParams {
    /// Filter for exactly one user.
    #[must_use]
    pub fn for_user(user_id: &str) -> Self {
        Self {
            limit: 1,
            user_ids: vec![user_id.to_string()],
            ..Self::default()
        }
    }

    /// Limit actually sent: clamped to `1..=500`.
    #[must_use]
    pub const fn effective_limit(&self) -> i64 {
        if self.limit > MAX_LIST_LIMIT {
            MAX_LIST_LIMIT
        } else if self.limit < 1 {
            1
        } else {
            self.limit
        }
    }

    /// Offset actually sent: never negative.
    #[must_use]
    pub const fn effective_offset(&self) -> i64 {
        if self.offset < 0 { 0 } else { self.offset }
    }

    /// Encoded query string, `user_id` repeated once per id.
    #[must_use]
    pub fn query_string(&self) -> String {
        let mut pairs = vec![
            format!("limit={}", self.effective_limit()),
            format!("offset={}", self.effective_offset()),
        ];
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            pairs.push(format!("query={}", urlencoding::encode(query)));
        }
        for user_id in &self.user_ids {
            pairs.push(format!("user_id={}", urlencoding::encode(user_id)));
        }
        pairs.join("&")
    }
}

/// Error half of a membership listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingError {
    pub error: String,
    pub status: u16,
}

impl From<&AuthError> for ListingError {
    fn from(error: &AuthError) -> Self {
        Self {
            error: error.to_string(),
            status: error.status_code(),
        }
    }
}

/// Result of [`ClerkClient::list_members`]: a page, or an error envelope.
///
/// Listing never fails past its own boundary; callers branch on the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum MembershipListing {
    Page(MembershipPage),
    Error(ListingError),
}

impl MembershipListing {
    /// Members on the page; empty for an error envelope.
    #[must_use]
    pub fn members(&self) -> &[OrgMember] {
        match self {
            Self::Page(page) => &page.members,
            Self::Error(_) => &[],
        }
    }

    #[must_use]
    pub const fn total_count(&self) -> u64 {
        match self {
            Self::Page(page) => page.total_count,
            Self::Error(_) => 0,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&ListingError> {
        match self {
            Self::Page(_) => None,
            Self::Error(e) => Some(e),
        }
    }

    /// JSON envelope: `{members, totalCount}` on success,
    /// `{error, status, members: [], totalCount: 0}` on failure.
    #[must_use]
    pub fn to_envelope(&self) -> serde_json::Value {
        match self {
            Self::Page(page) => json!({
                "members": page.members,
                "totalCount": page.total_count,
            }),
            Self::Error(e) => json!({
                "error": e.error,
                "status": e.status,
                "members": [],
                "totalCount": 0,
            }),
        }
    }
}

#[derive(Deserialize)]
struct ListResponse {
    data: Vec<MembershipRecord>,
    #[serde(default)]
    total_count: u64,
}

#[derive(Deserialize)]
struct MembershipRecord {
    id: String,
    role: String,
    role_name: Option<String>,
    public_metadata: Option<Metadata>,
    public_user_data: Option<PublicUserData>,
    created_at: Option<i64>,
    updated_at: Option<i64>,
}

#[derive(Deserialize)]
struct PublicUserData {
    user_id: String,
    identifier: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    image_url: Option<String>,
}

impl MembershipRecord {
    fn into_member(self) -> Option<OrgMember> {
        let pud = self.public_user_data?;
        Some(OrgMember {
            id: self.id,
            user_id: pud.user_id,
            role: self.role,
            role_name: self.role_name,
            identifier: pud.identifier,
            first_name: pud.first_name,
            last_name: pud.last_name,
            image_url: pud.image_url,
            public_metadata: self.public_metadata.unwrap_or_default(),
            created_at: self.created_at.and_then(chrono::DateTime::from_timestamp_millis),
            updated_at: self.updated_at.and_then(chrono::DateTime::from_timestamp_millis),
        })
    }
}

/// Path (with query) of the memberships endpoint for `org_id`.
pub(crate) fn memberships_path(org_id: &str, params: &ListMembersParams) -> String {
    format!(
        "/organizations/{}/memberships?{}",
        segment(org_id),
        params.query_string()
    )
}

impl ClerkClient {
    /// List members of a Clerk organization.
    ///
    /// All failures (network, non-200, unparseable body) come back as
    /// [`MembershipListing::Error`].
    pub async fn list_members(&self, org_id: &str, params: &ListMembersParams) -> MembershipListing {
        match self.try_list_members(org_id, params).await {
            Ok(page) => MembershipListing::Page(page),
            Err(error) => {
                tracing::warn!(org_id, %error, "listing organization members failed");
                MembershipListing::Error(ListingError::from(&error))
            }
        }
    }

    /// Same as [`Self::list_members`] with failures as `Err`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ClerkApi` for a non-success response,
    /// `AuthError::Timeout`/`AuthError::Transport` for network failures.
    pub async fn try_list_members(
        &self,
        org_id: &str,
        params: &ListMembersParams,
    ) -> Result<MembershipPage, AuthError> {
        if org_id.is_empty() {
            return Err(AuthError::InvalidRequest("organization id is empty".into()));
        }
        let request = self.request(Method::GET, &memberships_path(org_id, params));
        let list: ListResponse = self.send_json("list members", request).await?;

        Ok(MembershipPage {
            members: list
                .data
                .into_iter()
                .filter_map(MembershipRecord::into_member)
                .collect(),
            total_count: list.total_count,
        })
    }
}

#[async_trait]
impl MembershipLookup for ClerkClient {
    async fn find_membership(
        &self,
        org_id: &str,
        user_id: &str,
    ) -> Result<Option<OrgMember>, AuthError> {
        let page = self
            .try_list_members(org_id, &ListMembersParams::for_user(user_id))
            .await?;
        Ok(page.find_user(user_id).cloned())
    }
}
