//! Application service: model lookup with on-demand training, prediction,
//! recommendations and optional live-weather enrichment.
//!
//! Model-facing methods are synchronous and may train (CPU-bound); async
//! callers run them on a blocking thread.

use std::sync::{Arc, Mutex};

use cropcast_advisory::{Recommendation, recommend};
use cropcast_core::{CropType, DomainError, Feature, FeatureBounds, FeatureVector, PartialFeatures};
use cropcast_model::{
    EnsemblePredictor, ModelError, ModelSummary, SyntheticDataGenerator, TrainedModel, Trainer, TrainingConfig,
    TrainingSample, YieldEstimate,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::model_cache::{ModelCache, ModelStore, ModelStoreError};
use crate::weather::{CurrentWeather, WeatherError, WeatherProvider};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Store(#[from] ModelStoreError),

    #[error(transparent)]
    Weather(#[from] WeatherError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Knobs for model lookup and training.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub auto_train: bool,
    pub training_samples: usize,
    pub seed: u64,
    pub training: TrainingConfig,
    pub bounds: FeatureBounds,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ServiceSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            auto_train: config.auto_train,
            training_samples: config.training_samples,
            seed: config.seed,
            training: config.training_config(),
            bounds: config.bounds,
        }
    }
}

/// Features after optional weather enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherFill {
    pub features: PartialFeatures,
    /// Observation used to fill missing weather features, if any.
    pub weather: Option<CurrentWeather>,
    /// Why enrichment was skipped or failed; prediction continues with the
    /// features the caller supplied.
    pub degraded: Option<String>,
}

const WEATHER_FEATURES: [Feature; 3] = [Feature::Temperature, Feature::Humidity, Feature::Rainfall];

pub struct YieldService {
    cache: ModelCache<Arc<dyn ModelStore>>,
    predictor: EnsemblePredictor,
    settings: ServiceSettings,
    weather: Option<Arc<dyn WeatherProvider>>,
    /// Serializes on-demand training so concurrent misses train once.
    training: Mutex<()>,
}

impl YieldService {
    pub fn new(store: Arc<dyn ModelStore>, settings: ServiceSettings) -> Self {
        Self {
            cache: ModelCache::new(store),
            predictor: EnsemblePredictor::new(settings.bounds),
            settings,
            weather: None,
            training: Mutex::new(()),
        }
    }

    pub fn with_weather(mut self, provider: Arc<dyn WeatherProvider>) -> Self {
        self.weather = Some(provider);
        self
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn has_weather(&self) -> bool {
        self.weather.is_some()
    }

    pub fn cache(&self) -> &ModelCache<Arc<dyn ModelStore>> {
        &self.cache
    }

    /// Model for `crop`, training one from synthetic data on a miss when
    /// auto-training is enabled.
    pub fn model(&self, crop: CropType) -> ServiceResult<Arc<TrainedModel>> {
        if let Some(model) = self.cache.load(crop)? {
            return Ok(model);
        }
        if !self.settings.auto_train {
            return Err(ModelError::ModelNotFound(crop).into());
        }

        let _guard = self.training.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(model) = self.cache.load(crop)? {
            return Ok(model);
        }
        info!(crop = %crop, samples = self.settings.training_samples, "no cached model; training on demand");
        self.train_synthetic(crop, self.settings.training_samples, self.settings.seed, self.settings.training)
    }

    /// Validate `features` and predict yield over `farm_area` hectares.
    pub fn predict(&self, crop: CropType, features: &FeatureVector, farm_area: f64) -> ServiceResult<YieldEstimate> {
        // Reject bad input before a miss can trigger training.
        self.settings.bounds.check(features)?;
        let model = self.model(crop)?;
        Ok(self.predictor.predict_for_area(&model, features, farm_area)?)
    }

    pub fn recommend(&self, crop: CropType, features: &FeatureVector) -> ServiceResult<Recommendation> {
        self.settings.bounds.check(features)?;
        Ok(recommend(features, crop))
    }

    /// Train a fresh model from `samples` synthetic rows and replace the
    /// cached one. `seed` overrides the configured seed for both data and
    /// training.
    pub fn retrain(&self, crop: CropType, samples: Option<usize>, seed: Option<u64>) -> ServiceResult<ModelSummary> {
        let n = samples.unwrap_or(self.settings.training_samples);
        let (seed, training) = match seed {
            Some(seed) => (seed, self.settings.training.with_seed(seed)),
            None => (self.settings.seed, self.settings.training),
        };
        let _guard = self.training.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(self.train_synthetic(crop, n, seed, training)?.summary())
    }

    /// Train from caller-supplied observations and replace the cached
    /// model. Samples labeled with another crop are ignored.
    pub fn train_on(&self, crop: CropType, samples: &[TrainingSample]) -> ServiceResult<ModelSummary> {
        let _guard = self.training.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        info!(crop = %crop, samples = samples.len(), "training on supplied observations");
        Ok(self.fit_and_publish(crop, samples, self.settings.training)?.summary())
    }

    /// Summary of the stored model; never trains.
    pub fn model_summary(&self, crop: CropType) -> ServiceResult<ModelSummary> {
        self.cache
            .load(crop)?
            .map(|m| m.summary())
            .ok_or_else(|| ModelError::ModelNotFound(crop).into())
    }

    fn train_synthetic(
        &self,
        crop: CropType,
        n: usize,
        seed: u64,
        training: TrainingConfig,
    ) -> ServiceResult<Arc<TrainedModel>> {
        let samples = SyntheticDataGenerator::new(seed).generate(n, crop)?;
        self.fit_and_publish(crop, &samples, training)
    }

    /// Train under the configured feature bounds and replace the cached model.
    fn fit_and_publish(
        &self,
        crop: CropType,
        samples: &[TrainingSample],
        training: TrainingConfig,
    ) -> ServiceResult<Arc<TrainedModel>> {
        let model = Trainer::new(training.with_bounds(self.settings.bounds))
            .train(samples, crop)
            .inspect_err(|e| log_training_failure(crop, e))?;
        Ok(self.cache.save(model)?)
    }

    pub async fn current_weather(&self, location: &str) -> ServiceResult<CurrentWeather> {
        let provider = self.weather.as_ref().ok_or(WeatherError::MissingApiKey)?;
        Ok(provider.current(location).await?)
    }

    pub async fn forecast(&self, location: &str, days: u32) -> ServiceResult<crate::weather::Forecast> {
        let provider = self.weather.as_ref().ok_or(WeatherError::MissingApiKey)?;
        Ok(provider.forecast(location, days).await?)
    }

    /// Fill missing temperature, humidity and rainfall from live weather at
    /// `location`. Values the caller supplied are never overwritten, and a
    /// weather failure only marks the result as degraded.
    pub async fn fill_weather(&self, mut features: PartialFeatures, location: Option<&str>) -> WeatherFill {
        let wants_weather = WEATHER_FEATURES.iter().any(|f| features.get(*f).is_none());
        let Some(location) = location.filter(|_| wants_weather) else {
            return WeatherFill {
                features,
                weather: None,
                degraded: None,
            };
        };

        match self.current_weather(location).await {
            Ok(weather) => {
                features.fill_missing(Feature::Temperature, weather.temperature);
                features.fill_missing(Feature::Humidity, weather.humidity);
                features.fill_missing(Feature::Rainfall, weather.rainfall_annual);
                WeatherFill {
                    features,
                    weather: Some(weather),
                    degraded: None,
                }
            }
            Err(e) => {
                warn!(location, error = %e, "weather unavailable; using supplied features only");
                WeatherFill {
                    features,
                    weather: None,
                    degraded: Some(format!("live weather unavailable: {e}")),
                }
            }
        }
    }
}

fn log_training_failure(crop: CropType, err: &ModelError) {
    match err {
        ModelError::InsufficientData { available, required, .. } => {
            warn!(crop = %crop, available, required, "not enough samples to train");
        }
        other => warn!(crop = %crop, error = %other, "training failed"),
    }
}
