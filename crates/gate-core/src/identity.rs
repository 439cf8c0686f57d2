use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Metadata;

/// Identifier that Clerk (or an upstream user store) may hand out as either a
/// string (`user_2abc...`) or a numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum UserId {
    Int(i64),
    Str(String),
}

/// Organization ids share the same string-or-integer shape.
pub type OrgId = UserId;

impl UserId {
    /// Borrow the id as a string when it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Caller-facing user record resolved from a verified session.
///
/// Built fresh for every request by `gate-auth`'s resolver and handed to the
/// caller by value. There are no mutating methods: once returned, the record
/// is what the session said at the time of the request.
///
/// `public_metadata` holds exactly one metadata namespace: the organization's
/// when the request carries an organization context, the user's otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(alias = "_id")]
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<OrgId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<Vec<Metadata>>,
    #[serde(default)]
    pub public_metadata: Option<Metadata>,
}

impl UserRecord {
    /// Whether the record was resolved inside an organization context.
    #[must_use]
    pub const fn in_org_context(&self) -> bool {
        self.org_id.is_some()
    }

    /// Look up a single key in the selected public metadata namespace.
    #[must_use]
    pub fn public_metadata_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.public_metadata.as_ref()?.get(key)
    }
}
