//! Public/private metadata updates for users and organizations.
//!
//! Clerk deep-merges the patch into the stored metadata; a key set to `null`
//! is removed. The merge itself happens provider-side.

use async_trait::async_trait;
use gate_core::Metadata;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::client::{ClerkClient, segment};
use crate::error::AuthError;

/// Body of a metadata `PATCH`. At least one side must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_metadata: Option<Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_metadata: Option<Metadata>,
}

impl MetadataPatch {
    #[must_use]
    pub fn public(metadata: Metadata) -> Self {
        Self {
            public_metadata: Some(metadata),
            private_metadata: None,
        }
    }

    #[must_use]
    pub fn private(metadata: Metadata) -> Self {
        Self {
            public_metadata: None,
            private_metadata: Some(metadata),
        }
    }

    #[must_use]
    pub fn with_public(mut self, metadata: Metadata) -> Self {
        self.public_metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn with_private(mut self, metadata: Metadata) -> Self {
        self.private_metadata = Some(metadata);
        self
    }

    /// Mark a public key for removal (sent as `null`).
    #[must_use]
    pub fn remove_public_key(mut self, key: impl Into<String>) -> Self {
        self.public_metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), Value::Null);
        self
    }

    /// Mark a private key for removal (sent as `null`).
    #[must_use]
    pub fn remove_private_key(mut self, key: impl Into<String>) -> Self {
        self.private_metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), Value::Null);
        self
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.public_metadata.is_none() && self.private_metadata.is_none()
    }
}

/// Merges metadata into Clerk users and organizations.
///
/// Both calls return the updated resource as JSON. Provider failures are
/// returned as errors carrying the HTTP status and body.
#[async_trait]
pub trait MetadataGateway: Send + Sync {
    async fn update_organization_metadata(
        &self,
        org_id: &str,
        patch: &MetadataPatch,
    ) -> Result<Value, AuthError>;

    async fn update_user_metadata(
        &self,
        user_id: &str,
        patch: &MetadataPatch,
    ) -> Result<Value, AuthError>;
}

impl ClerkClient {
    async fn patch_metadata(
        &self,
        operation: &'static str,
        resource: &str,
        id: &str,
        patch: &MetadataPatch,
    ) -> Result<Value, AuthError> {
        if id.is_empty() {
            return Err(AuthError::InvalidRequest(format!("{operation}: id is empty")));
        }
        if patch.is_empty() {
            return Err(AuthError::InvalidRequest(
                "at least one of public_metadata or private_metadata must be provided".into(),
            ));
        }

        let path = format!("/{resource}/{}/metadata", segment(id));
        let request = self.request(Method::PATCH, &path).json(patch);
        let updated = self.send_json(operation, request).await;
        match &updated {
            Ok(_) => tracing::debug!(resource, id, "metadata updated"),
            Err(error) => tracing::warn!(resource, id, %error, "metadata update failed"),
        }
        updated
    }
}

#[async_trait]
impl MetadataGateway for ClerkClient {
    async fn update_organization_metadata(
        &self,
        org_id: &str,
        patch: &MetadataPatch,
    ) -> Result<Value, AuthError> {
        self.patch_metadata("patch organization metadata", "organizations", org_id, patch)
            .await
    }

    async fn update_user_metadata(
        &self,
        user_id: &str,
        patch: &MetadataPatch,
    ) -> Result<Value, AuthError> {
        self.patch_metadata("patch user metadata", "users", user_id, patch)
            .await
    }
}
