//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Failures produced by the listing rules themselves, such as a rejected edit
/// form or a missing listing. Network failures belong to the backend layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. a discount above the regular price).
    #[error("{0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The requested listing does not exist.
    #[error("Listing not found")]
    NotFound,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Whether the failure is caused by the input rather than the environment.
    ///
    /// Retrying such an error can never change its outcome.
    pub fn is_validation(&self) -> bool {
        matches!(self, DomainError::Validation(_) | DomainError::InvalidId(_))
    }
}
