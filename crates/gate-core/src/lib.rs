//! # gate-core
//!
//! Data-only types shared across the Gatehouse crates:
//! - the normalized [`UserRecord`] produced from a verified session
//! - organization membership entries and pages
//! - cross-cutting error types
//!
//! Nothing in this crate performs I/O.

pub mod errors;
pub mod identity;
pub mod membership;

pub use errors::CoreError;
pub use identity::{OrgId, UserId, UserRecord};
pub use membership::{MembershipPage, OrgMember};

/// Opaque string-keyed JSON mapping used for Clerk public/private metadata.
pub type Metadata = serde_json::Map<String, serde_json::Value>;
