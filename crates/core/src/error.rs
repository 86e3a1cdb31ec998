//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every component raises the most specific kind it can determine. The HTTP
/// boundary is the only place that turns a kind into a status code; messages
/// carried here are short, human-readable reasons and nothing more.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input payload failed shape/format rules.
    #[error("\"{field}\" {reason}")]
    Validation { field: String, reason: String },

    /// Missing/invalid token, or the caller lacks the role or relationship
    /// required for the action (disallowed sale transitions included).
    #[error("{0}")]
    Unauthorized(String),

    /// A uniqueness rule was violated, or a concurrent writer got there first.
    #[error("{0}")]
    Conflict(String),

    /// A referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// The generic denial used for role, relationship and transition checks.
    ///
    /// Deliberately says nothing about which check failed.
    pub fn forbidden() -> Self {
        Self::Unauthorized("Unauthorized".to_string())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation { .. } => "validation_error",
            DomainError::Unauthorized(_) => "unauthorized",
            DomainError::Conflict(_) => "conflict",
            DomainError::NotFound(_) => "not_found",
            DomainError::InvalidId(_) => "invalid_id",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_the_field() {
        let err = DomainError::validation("email", "must be a valid email");
        assert_eq!(err.to_string(), "\"email\" must be a valid email");
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn forbidden_is_generic() {
        assert_eq!(
            DomainError::forbidden(),
            DomainError::Unauthorized("Unauthorized".to_string())
        );
    }
}
