use cropcast_core::{CropType, DomainError};
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while generating data, training or predicting.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("insufficient training data for {crop}: {available} samples, at least {required} required")]
    InsufficientData {
        crop: CropType,
        available: usize,
        required: usize,
    },

    #[error("no trained model available for {0}")]
    ModelNotFound(CropType),

    #[error("training failed: {0}")]
    Training(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ModelError {
    pub fn training(msg: impl Into<String>) -> Self {
        Self::Training(msg.into())
    }
}
