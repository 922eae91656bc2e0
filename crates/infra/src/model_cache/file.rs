use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use cropcast_core::CropType;
use cropcast_model::TrainedModel;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::store::{ModelStore, ModelStoreError};

/// Bumped whenever the serialized layout of [`TrainedModel`] changes.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct ArtifactRef<'a> {
    format_version: u32,
    crop: CropType,
    model: &'a TrainedModel,
}

#[derive(Deserialize)]
struct Artifact {
    format_version: u32,
    crop: CropType,
    model: TrainedModel,
}

/// JSON artifact per crop under a directory: `<dir>/<slug>.model.json`.
///
/// The directory is created on first save. Writes go to a temporary file in
/// the same directory which is then renamed over the artifact, so readers
/// never observe a half-written model.
#[derive(Debug, Clone)]
pub struct FileModelStore {
    dir: PathBuf,
}

impl FileModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self, crop: CropType) -> PathBuf {
        self.dir.join(format!("{}.model.json", crop.slug()))
    }

    fn temp_path(&self, crop: CropType) -> PathBuf {
        self.dir.join(format!(".{}.model.json.tmp", crop.slug()))
    }
}

impl ModelStore for FileModelStore {
    fn load(&self, crop: CropType) -> Result<Option<TrainedModel>, ModelStoreError> {
        let path = self.artifact_path(crop);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ModelStoreError::io(path, e)),
        };

        let artifact: Artifact = serde_json::from_slice(&bytes).map_err(|e| ModelStoreError::Corrupt {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelStoreError::UnsupportedVersion {
                found: artifact.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }
        for found in [artifact.crop, artifact.model.crop()] {
            if found != crop {
                return Err(ModelStoreError::CropMismatch { expected: crop, found });
            }
        }

        artifact
            .model
            .validate()
            .map_err(|reason| ModelStoreError::Corrupt { path: path.clone(), reason })?;

        debug!(crop = %crop, path = %path.display(), "loaded model artifact");
        Ok(Some(artifact.model))
    }

    fn save(&self, model: &TrainedModel) -> Result<(), ModelStoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| ModelStoreError::io(&self.dir, e))?;

        let crop = model.crop();
        let bytes = serde_json::to_vec(&ArtifactRef {
            format_version: ARTIFACT_FORMAT_VERSION,
            crop,
            model,
        })
        .map_err(|e| ModelStoreError::Serialization(e.to_string()))?;

        let tmp = self.temp_path(crop);
        let mut file = fs::File::create(&tmp).map_err(|e| ModelStoreError::io(&tmp, e))?;
        file.write_all(&bytes)
            .and_then(|()| file.sync_all())
            .map_err(|e| ModelStoreError::io(&tmp, e))?;
        drop(file);

        let path = self.artifact_path(crop);
        fs::rename(&tmp, &path).map_err(|e| ModelStoreError::io(&path, e))?;

        info!(crop = %crop, model_id = %model.id(), path = %path.display(), bytes = bytes.len(), "saved model artifact");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropcast_core::FeatureVector;
    use cropcast_model::{ForestParams, SyntheticDataGenerator, Trainer, TrainingConfig};

    fn small_model(crop: CropType) -> TrainedModel {
        let samples = SyntheticDataGenerator::default().generate(120, crop).unwrap();
        Trainer::new(TrainingConfig::default().with_forest(ForestParams::default().with_trees(5)))
            .train(&samples, crop)
            .unwrap()
    }

    #[test]
    fn missing_artifact_loads_as_none_without_creating_the_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(tmp.path().join("models"));
        assert!(store.load(CropType::Rice).unwrap().is_none());
        assert!(!store.dir().exists());
    }

    #[test]
    fn save_then_load_round_trips_exactly() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(tmp.path().join("nested").join("models"));
        let model = small_model(CropType::Corn);

        store.save(&model).unwrap();
        assert!(store.artifact_path(CropType::Corn).ends_with("corn.model.json"));
        assert!(!store.temp_path(CropType::Corn).exists());

        let loaded = store.load(CropType::Corn).unwrap().unwrap();
        assert_eq!(loaded, model);
        let v = FeatureVector::from_array([6.2, 3.1, 40.0, 30.0, 180.0, 24.0, 900.0, 70.0]);
        assert_eq!(loaded.predict_yield(&v).to_bits(), model.predict_yield(&v).to_bits());
    }

    #[test]
    fn artifact_under_the_wrong_name_is_a_crop_mismatch() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(tmp.path());
        store.save(&small_model(CropType::Wheat)).unwrap();
        fs::copy(store.artifact_path(CropType::Wheat), store.artifact_path(CropType::Rice)).unwrap();

        let err = store.load(CropType::Rice).unwrap_err();
        assert!(matches!(
            err,
            ModelStoreError::CropMismatch {
                expected: CropType::Rice,
                found: CropType::Wheat
            }
        ));
    }

    #[test]
    fn parseable_artifact_with_a_broken_tree_is_corrupt() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(tmp.path());
        store.save(&small_model(CropType::Corn)).unwrap();

        let path = store.artifact_path(CropType::Corn);
        let mut json: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        let root = &mut json["model"]["forest"]["trees"][0]["nodes"][0];
        assert_eq!(root["kind"], "split");
        root["feature"] = serde_json::json!(99);
        fs::write(&path, serde_json::to_vec(&json).unwrap()).unwrap();

        let err = store.load(CropType::Corn).unwrap_err();
        assert!(matches!(err, ModelStoreError::Corrupt { ref reason, .. } if reason.contains("feature 99")));
    }

    #[test]
    fn garbage_and_future_versions_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(tmp.path());

        fs::write(store.artifact_path(CropType::Soybean), b"{not json").unwrap();
        assert!(matches!(
            store.load(CropType::Soybean).unwrap_err(),
            ModelStoreError::Corrupt { .. }
        ));

        store.save(&small_model(CropType::Soybean)).unwrap();
        let path = store.artifact_path(CropType::Soybean);
        let mut json: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        json["format_version"] = serde_json::json!(ARTIFACT_FORMAT_VERSION + 1);
        fs::write(&path, serde_json::to_vec(&json).unwrap()).unwrap();
        assert!(matches!(
            store.load(CropType::Soybean).unwrap_err(),
            ModelStoreError::UnsupportedVersion { .. }
        ));
    }
}
