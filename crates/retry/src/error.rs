//! Attempt failures and configuration errors.

use housebazaar_core::DomainError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinError;

/// Message used when a failure carries no text of its own.
pub const FALLBACK_MESSAGE: &str = "An error occurred";

/// Coarse classification of an attempt failure.
///
/// The executor retries every kind alike; the kind is carried so callers and
/// logs can tell input problems from environment problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network, backend, or other environment failure.
    Transient,
    /// The operation rejected its own input.
    Validation,
}

/// Why a single attempt did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    /// The attempt did not settle within the attempt timeout.
    #[error("Request timeout")]
    Timeout,

    /// The operation failed.
    #[error("{}", .message.as_deref().unwrap_or(FALLBACK_MESSAGE))]
    Failed {
        kind: ErrorKind,
        message: Option<String>,
    },

    /// The operation panicked while running.
    #[error("Operation panicked")]
    Panicked,
}

impl AttemptError {
    /// Transient failure with a message.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::failed(ErrorKind::Transient, message)
    }

    /// Validation failure with a message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::failed(ErrorKind::Validation, message)
    }

    /// Failure without any message; reported with [`FALLBACK_MESSAGE`].
    pub fn unexplained() -> Self {
        Self::Failed {
            kind: ErrorKind::Transient,
            message: None,
        }
    }

    fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Failed {
            kind,
            // An empty message counts as no message.
            message: (!message.is_empty()).then_some(message),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AttemptError::Failed { kind, .. } => *kind,
            AttemptError::Timeout | AttemptError::Panicked => ErrorKind::Transient,
        }
    }

    /// Human-readable message, falling back to [`FALLBACK_MESSAGE`].
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub(crate) fn from_join(err: JoinError) -> Self {
        if err.is_panic() {
            AttemptError::Panicked
        } else {
            AttemptError::transient("Operation cancelled")
        }
    }
}

impl From<String> for AttemptError {
    fn from(message: String) -> Self {
        AttemptError::transient(message)
    }
}

impl From<&str> for AttemptError {
    fn from(message: &str) -> Self {
        AttemptError::transient(message)
    }
}

impl From<DomainError> for AttemptError {
    fn from(err: DomainError) -> Self {
        let kind = if err.is_validation() {
            ErrorKind::Validation
        } else {
            ErrorKind::Transient
        };
        AttemptError::failed(kind, err.to_string())
    }
}

impl From<anyhow::Error> for AttemptError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(attempt) = err.downcast_ref::<AttemptError>() {
            return attempt.clone();
        }
        if let Some(domain) = err.downcast_ref::<DomainError>() {
            return domain.clone().into();
        }
        AttemptError::transient(err.to_string())
    }
}

/// Invalid retry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("attempt_timeout must be greater than zero")]
    ZeroTimeout,

    #[error("{field} must be a whole number of milliseconds, got {duration:?}")]
    SubMillisecond {
        field: &'static str,
        duration: std::time::Duration,
    },

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_uses_request_timeout_message() {
        assert_eq!(AttemptError::Timeout.message(), "Request timeout");
        assert_eq!(AttemptError::Timeout.kind(), ErrorKind::Transient);
    }

    #[test]
    fn missing_or_empty_message_falls_back() {
        assert_eq!(AttemptError::unexplained().message(), FALLBACK_MESSAGE);
        assert_eq!(AttemptError::from("").message(), FALLBACK_MESSAGE);
        assert_eq!(AttemptError::from("network down").message(), "network down");
    }

    #[test]
    fn domain_validation_maps_to_validation_kind() {
        let err: AttemptError = DomainError::validation("Max 6 images").into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.message(), "Max 6 images");

        let err: AttemptError = DomainError::not_found().into();
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert_eq!(err.message(), "Listing not found");
    }

    #[test]
    fn anyhow_preserves_wrapped_kinds() {
        let err: AttemptError = anyhow::Error::new(DomainError::validation("bad input")).into();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err: AttemptError = anyhow::anyhow!("server error").into();
        assert_eq!(err, AttemptError::transient("server error"));

        let err: AttemptError = anyhow::Error::new(AttemptError::Timeout).into();
        assert_eq!(err, AttemptError::Timeout);
    }
}
