use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use cropcast_core::CropType;
use cropcast_model::TrainedModel;
use thiserror::Error;

/// Model storage operation error.
///
/// These are infrastructure failures (disk, encoding, artifact integrity), as
/// opposed to training or validation errors raised by `cropcast-model`.
#[derive(Debug, Error)]
pub enum ModelStoreError {
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("corrupt model artifact at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("unsupported artifact format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("artifact holds a {found} model where {expected} was requested")]
    CropMismatch { expected: CropType, found: CropType },

    #[error("storage error: {0}")]
    Storage(String),
}

impl ModelStoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Durable home for trained models, one per crop.
///
/// `load` returns `Ok(None)` when nothing has been saved for the crop yet.
/// `save` replaces whatever was stored for the model's crop.
pub trait ModelStore: Send + Sync {
    fn load(&self, crop: CropType) -> Result<Option<TrainedModel>, ModelStoreError>;

    fn save(&self, model: &TrainedModel) -> Result<(), ModelStoreError>;
}

impl<S> ModelStore for Arc<S>
where
    S: ModelStore + ?Sized,
{
    fn load(&self, crop: CropType) -> Result<Option<TrainedModel>, ModelStoreError> {
        (**self).load(crop)
    }

    fn save(&self, model: &TrainedModel) -> Result<(), ModelStoreError> {
        (**self).save(model)
    }
}

/// In-memory model store.
///
/// Intended for tests/dev; nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryModelStore {
    models: RwLock<HashMap<CropType, TrainedModel>>,
}

impl InMemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.models.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ModelStore for InMemoryModelStore {
    fn load(&self, crop: CropType) -> Result<Option<TrainedModel>, ModelStoreError> {
        let models = self
            .models
            .read()
            .map_err(|_| ModelStoreError::Storage("lock poisoned".to_string()))?;
        Ok(models.get(&crop).cloned())
    }

    fn save(&self, model: &TrainedModel) -> Result<(), ModelStoreError> {
        let mut models = self
            .models
            .write()
            .map_err(|_| ModelStoreError::Storage("lock poisoned".to_string()))?;
        models.insert(model.crop(), model.clone());
        Ok(())
    }
}
