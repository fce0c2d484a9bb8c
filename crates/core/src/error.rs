//! Errors raised while building domain values from external input.

use thiserror::Error;

/// Parse/validation failure for a domain primitive.
///
/// Forecasting and storage failures have their own error types in the crates
/// that produce them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier string was not a valid UUID.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A string did not name any known variant (e.g. a product status).
    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn unknown_variant(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.into(),
        }
    }
}
