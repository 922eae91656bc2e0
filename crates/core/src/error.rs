//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic input failures (malformed feature
/// vectors, unknown crops). Model, storage and network concerns belong to the
/// crates that own them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A value failed validation (missing, non-finite or out of range).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A raw feature slice had the wrong number of elements.
    #[error("dimension mismatch: expected {expected} features, got {actual}")]
    Dimension { expected: usize, actual: usize },

    /// A crop name did not match any supported crop.
    #[error("unknown crop type: {0}")]
    UnknownCrop(String),

    /// A growth stage name did not match any known stage.
    #[error("unknown growth stage: {0}")]
    UnknownStage(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn dimension(expected: usize, actual: usize) -> Self {
        Self::Dimension { expected, actual }
    }

    pub fn unknown_crop(name: impl Into<String>) -> Self {
        Self::UnknownCrop(name.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
