//! Organization membership types.
//!
//! Populated by `gate-auth` from the Clerk `/organizations/{id}/memberships`
//! endpoint. Data only: no HTTP here.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Metadata;

/// A user's membership in one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OrgMember {
    /// Membership id (`orgmem_...`).
    pub id: String,
    pub user_id: String,
    /// Role key, e.g. `"org:admin"`.
    pub role: String,
    pub role_name: Option<String>,
    /// Primary identifier from `public_user_data` (usually the email).
    pub identifier: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub public_metadata: Metadata,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of memberships plus the total count reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MembershipPage {
    pub members: Vec<OrgMember>,
    pub total_count: u64,
}

impl MembershipPage {
    /// Find the membership entry for `user_id` on this page.
    #[must_use]
    pub fn find_user(&self, user_id: &str) -> Option<&OrgMember> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
