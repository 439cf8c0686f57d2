use base64::Engine as _;
use chrono::{DateTime, Utc};
use gate_core::{Metadata, OrgId, UserId};
use serde_json::Value;

use crate::error::AuthError;

/// Verified Clerk session claims, shaped for the resolver.
///
/// Produced by a [`TokenValidator`](crate::validator::TokenValidator) from a
/// session JWT whose signature has already been checked. Read-only for the
/// lifetime of one request.
///
/// Custom claims come from the session token template (`orgId`, `roleSlug`,
/// `uPublicMetaData`, ...). When a custom org claim is absent the standard
/// Clerk claims (`org_id`/`org_role`, or the v2 compact `o` object) are used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionClaims {
    /// Raw JWT string.
    pub raw_jwt: String,
    /// `sub`. Required by the resolver; kept optional here so a malformed
    /// token surfaces as a resolution failure rather than a parse panic.
    pub subject: Option<UserId>,
    pub org_id: Option<OrgId>,
    /// `sid`.
    pub session_id: Option<String>,
    /// `azp`.
    pub authorized_party: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role_slug: Option<String>,
    /// `uPublicMetaData`.
    pub user_public_metadata: Option<Metadata>,
    /// `oPublicMetaData`.
    pub org_public_metadata: Option<Metadata>,
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub profile_pic_url: Option<String>,
    pub active: Option<bool>,
    pub role_ids: Option<Vec<i64>>,
    pub meta: Option<Metadata>,
    pub workspace: Option<Vec<Metadata>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// `exp`.
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionClaims {
    /// Map a decoded JWT payload onto claims. Fields with an unexpected type
    /// are treated as absent.
    #[must_use]
    pub fn from_payload(raw_jwt: impl Into<String>, payload: &Metadata) -> Self {
        let compact_org = payload.get("o").and_then(Value::as_object);

        Self {
            raw_jwt: raw_jwt.into(),
            subject: id_claim(payload, "sub"),
            org_id: id_claim(payload, "orgId")
                .or_else(|| id_claim(payload, "org_id"))
                .or_else(|| compact_org.and_then(|o| id_claim(o, "id"))),
            session_id: str_claim(payload, "sid"),
            authorized_party: str_claim(payload, "azp"),
            first_name: str_claim(payload, "firstName"),
            last_name: str_claim(payload, "lastName"),
            email: str_claim(payload, "email"),
            role_slug: str_claim(payload, "roleSlug")
                .or_else(|| str_claim(payload, "org_role"))
                .or_else(|| compact_org.and_then(|o| str_claim(o, "rol")).map(org_role_key)),
            user_public_metadata: object_claim(payload, "uPublicMetaData"),
            org_public_metadata: object_claim(payload, "oPublicMetaData"),
            username: str_claim(payload, "username"),
            phone_number: str_claim(payload, "phoneNumber"),
            profile_pic_url: str_claim(payload, "profilePicUrl")
                .or_else(|| str_claim(payload, "imageUrl")),
            active: payload.get("active").and_then(Value::as_bool),
            role_ids: payload
                .get("roleIds")
                .and_then(Value::as_array)
                .map(|ids| ids.iter().filter_map(Value::as_i64).collect()),
            meta: object_claim(payload, "meta"),
            workspace: payload.get("workspace").and_then(Value::as_array).map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .cloned()
                    .collect()
            }),
            created_at: timestamp_claim(payload, "createdAt"),
            updated_at: timestamp_claim(payload, "updatedAt"),
            expires_at: payload
                .get("exp")
                .and_then(Value::as_i64)
                .and_then(|exp| DateTime::from_timestamp(exp, 0)),
        }
    }

    /// Check if the token is expired or expires within `buffer_secs`.
    /// Claims without an `exp` are never considered near expiry.
    #[must_use]
    pub fn is_near_expiry(&self, buffer_secs: i64) -> bool {
        let threshold = Utc::now() + chrono::TimeDelta::seconds(buffer_secs);
        self.expires_at.is_some_and(|exp| exp <= threshold)
    }
}

/// Decode the payload segment of a JWT without verifying its signature.
///
/// Only call this on tokens that were verified, or where a best-effort read
/// is acceptable (expiry checks).
///
/// # Errors
///
/// Returns `AuthError::MalformedClaims` if the JWT does not have three
/// segments, the payload is not base64url, or it is not a JSON object.
pub fn decode_payload(jwt: &str) -> Result<Metadata, AuthError> {
    let parts: Vec<&str> = jwt.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::MalformedClaims("invalid JWT format".into()));
    }
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| AuthError::MalformedClaims(format!("base64 decode failed: {e}")))?;
    match serde_json::from_slice(&payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AuthError::MalformedClaims("payload is not a JSON object".into())),
        Err(e) => Err(AuthError::MalformedClaims(format!("JSON parse failed: {e}"))),
    }
}

fn str_claim(payload: &Metadata, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn id_claim(payload: &Metadata, key: &str) -> Option<UserId> {
    match payload.get(key)? {
        Value::String(s) if !s.is_empty() => Some(UserId::Str(s.clone())),
        Value::Number(n) => n.as_i64().map(UserId::Int),
        _ => None,
    }
}

/// Compact `o.rol` drops the `org:` prefix that `org_role` and membership
/// records carry; restore it so every source yields the same key.
fn org_role_key(role: String) -> String {
    if role.starts_with("org:") {
        role
    } else {
        format!("org:{role}")
    }
}

fn object_claim(payload: &Metadata, key: &str) -> Option<Metadata> {
    payload.get(key).and_then(Value::as_object).cloned()
}

/// RFC 3339 strings, or integer epoch milliseconds (Clerk's timestamp unit).
fn timestamp_claim(payload: &Metadata, key: &str) -> Option<DateTime<Utc>> {
    match payload.get(key)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
