//! Trained-model persistence and the in-process read-through cache.
//!
//! A [`ModelStore`] is the durable layer (files on disk, or memory in tests).
//! [`ModelCache`] sits in front of it and hands out shared, immutable
//! `Arc<TrainedModel>` values; a retrain replaces the cached entry wholesale.

pub mod file;
pub mod store;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use cropcast_core::CropType;
use cropcast_model::TrainedModel;
use tracing::debug;

pub use file::{ARTIFACT_FORMAT_VERSION, FileModelStore};
pub use store::{InMemoryModelStore, ModelStore, ModelStoreError};

/// Read-through cache over a [`ModelStore`].
///
/// Reads take a shared lock and only fall through to the store on a miss.
/// Saves write the store first and then publish to memory, so the cache
/// never serves a model the store does not hold. Last write wins.
#[derive(Debug)]
pub struct ModelCache<S> {
    store: S,
    models: RwLock<HashMap<CropType, Arc<TrainedModel>>>,
}

impl<S> ModelCache<S>
where
    S: ModelStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            models: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Cached model for `crop`, loading it from the store on first access.
    pub fn load(&self, crop: CropType) -> Result<Option<Arc<TrainedModel>>, ModelStoreError> {
        {
            let models = self.models.read().map_err(|_| poisoned())?;
            if let Some(model) = models.get(&crop) {
                return Ok(Some(Arc::clone(model)));
            }
        }

        let Some(model) = self.store.load(crop)? else {
            return Ok(None);
        };
        debug!(crop = %crop, model_id = %model.id(), "model cache miss filled from store");

        let mut models = self.models.write().map_err(|_| poisoned())?;
        // A concurrent save may have won the race; keep the newer entry.
        let entry = models.entry(crop).or_insert_with(|| Arc::new(model));
        Ok(Some(Arc::clone(entry)))
    }

    /// Persist `model` and make it the cached model for its crop.
    pub fn save(&self, model: TrainedModel) -> Result<Arc<TrainedModel>, ModelStoreError> {
        self.store.save(&model)?;
        let model = Arc::new(model);
        let mut models = self.models.write().map_err(|_| poisoned())?;
        models.insert(model.crop(), Arc::clone(&model));
        Ok(model)
    }

    /// Drop the in-memory entry for `crop`; the next load re-reads the store.
    pub fn invalidate(&self, crop: CropType) -> bool {
        self.models
            .write()
            .map(|mut models| models.remove(&crop).is_some())
            .unwrap_or(false)
    }

    /// Crops with a model currently held in memory.
    pub fn cached_crops(&self) -> Vec<CropType> {
        let mut crops: Vec<CropType> = self
            .models
            .read()
            .map(|models| models.keys().copied().collect())
            .unwrap_or_default();
        crops.sort();
        crops
    }
}

fn poisoned() -> ModelStoreError {
    ModelStoreError::Storage("model cache lock poisoned".to_string())
}
