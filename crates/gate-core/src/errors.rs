//! Cross-cutting error types for Gatehouse.
//!
//! Transport and provider errors live in `gate-auth` (`AuthError`); config
//! errors in `gate-config`. This enum covers failures that only involve the
//! shared data types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A required claim or field was absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}
