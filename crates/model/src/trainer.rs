//! Per-crop training: split, scale, fit both members, weight, evaluate.
//!
//! Blend weights are chosen from out-of-sample predictions on the training
//! split (forest out-of-bag, linear cross-validated). The test split is only
//! used for the reported metrics.

use chrono::Utc;
use cropcast_core::{CropType, FeatureBounds, FeatureVector, ModelId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ensemble::{EnsembleWeights, TrainedModel};
use crate::error::{ModelError, ModelResult};
use crate::forest::{ForestParams, RandomForest};
use crate::linear::LinearRegression;
use crate::metrics::{ModelMetrics, RegressionMetrics};
use crate::sample::TrainingSample;
use crate::scaler::{Row, Scaler};

/// Smallest per-crop sample count that still leaves a usable test split.
pub const MIN_TRAINING_SAMPLES: usize = 20;

/// Folds for the cross-validated linear predictions used in weighting.
const WEIGHTING_FOLDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub forest: ForestParams,
    /// Fraction of samples held out for evaluation (rounded up).
    pub test_fraction: f64,
    pub split_seed: u64,
    /// Samples outside these ranges are dropped before training.
    pub bounds: FeatureBounds,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            forest: ForestParams::default(),
            test_fraction: 0.2,
            split_seed: 42,
            bounds: FeatureBounds::default(),
        }
    }
}

impl TrainingConfig {
    pub fn with_forest(mut self, forest: ForestParams) -> Self {
        self.forest = forest;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.split_seed = seed;
        self.forest.seed = seed;
        self
    }

    pub fn with_bounds(mut self, bounds: FeatureBounds) -> Self {
        self.bounds = bounds;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train a model for `crop` from the samples labeled with that crop.
    pub fn train(&self, samples: &[TrainingSample], crop: CropType) -> ModelResult<TrainedModel> {
        let for_crop: Vec<&TrainingSample> = samples.iter().filter(|s| s.crop() == crop).collect();
        let mut data: Vec<&TrainingSample> = for_crop
            .iter()
            .copied()
            .filter(|s| self.config.bounds.check(s.features()).is_ok())
            .collect();
        if data.len() < for_crop.len() {
            warn!(crop = %crop, dropped = for_crop.len() - data.len(), "samples outside feature bounds dropped");
        }
        if data.len() < MIN_TRAINING_SAMPLES {
            return Err(ModelError::InsufficientData {
                crop,
                available: data.len(),
                required: MIN_TRAINING_SAMPLES,
            });
        }
        if !(self.config.test_fraction > 0.0 && self.config.test_fraction < 1.0) {
            return Err(ModelError::training(format!(
                "test_fraction must be in (0, 1), got {}",
                self.config.test_fraction
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.config.split_seed);
        data.shuffle(&mut rng);
        let (test, train) = data.split_at(self.test_len(data.len()));
        debug!(crop = %crop, train = train.len(), test = test.len(), "split training data");

        let train_vectors: Vec<FeatureVector> = train.iter().map(|s| *s.features()).collect();
        let scaler = Scaler::fit(&train_vectors)?;
        let train_rows: Vec<Row> = train_vectors.iter().map(|v| scaler.transform(v)).collect();
        let train_y: Vec<f64> = train.iter().map(|s| s.yield_t_ha()).collect();

        let (forest, forest_oob) = RandomForest::fit_with_oob(&train_rows, &train_y, self.config.forest)?;
        let linear = LinearRegression::fit(&train_rows, &train_y)?;
        let weights = out_of_sample_weights(&forest_oob, &train_rows, &train_y)?;

        let test_rows: Vec<Row> = test.iter().map(|s| scaler.transform(s.features())).collect();
        let test_y: Vec<f64> = test.iter().map(|s| s.yield_t_ha()).collect();
        let forest_pred: Vec<f64> = test_rows.iter().map(|r| forest.predict(r)).collect();
        let linear_pred: Vec<f64> = test_rows.iter().map(|r| linear.predict(r)).collect();

        let forest_metrics = RegressionMetrics::evaluate(&forest_pred, &test_y);
        let linear_metrics = RegressionMetrics::evaluate(&linear_pred, &test_y);
        let blended: Vec<f64> = forest_pred
            .iter()
            .zip(&linear_pred)
            .map(|(f, l)| weights.blend(*f, *l).max(0.0))
            .collect();
        let metrics = ModelMetrics {
            forest: forest_metrics,
            linear: linear_metrics,
            ensemble: RegressionMetrics::evaluate(&blended, &test_y),
        };

        info!(
            crop = %crop,
            train_samples = train.len(),
            test_samples = test.len(),
            forest_mae = metrics.forest.mae,
            linear_mae = metrics.linear.mae,
            ensemble_mae = metrics.ensemble.mae,
            ensemble_r2 = metrics.ensemble.r2,
            forest_weight = weights.forest,
            "model trained"
        );

        Ok(TrainedModel {
            id: ModelId::new(),
            crop,
            scaler,
            forest,
            linear,
            weights,
            metrics,
            trained_at: Utc::now(),
            train_samples: train.len(),
            test_samples: test.len(),
        })
    }

    fn test_len(&self, n: usize) -> usize {
        ((n as f64) * self.config.test_fraction - 1e-9).ceil().max(1.0) as usize
    }
}

/// Blend weights from predictions no member made on its own training rows.
fn out_of_sample_weights(forest_oob: &[Option<f64>], rows: &[Row], targets: &[f64]) -> ModelResult<EnsembleWeights> {
    let linear_cv = cross_validated_linear(rows, targets, WEIGHTING_FOLDS)?;
    let (mut forest, mut linear, mut actual) = (Vec::new(), Vec::new(), Vec::new());
    for ((oob, lin), y) in forest_oob.iter().zip(linear_cv).zip(targets) {
        if let Some(f) = oob {
            forest.push(*f);
            linear.push(lin);
            actual.push(*y);
        }
    }
    Ok(EnsembleWeights::fit_holdout(&forest, &linear, &actual))
}

/// Each row predicted by a linear model fit on the other folds.
fn cross_validated_linear(rows: &[Row], targets: &[f64], folds: usize) -> ModelResult<Vec<f64>> {
    let folds = folds.clamp(1, rows.len().max(1));
    let mut out = vec![0.0; rows.len()];
    for k in 0..folds {
        let (fit_rows, fit_y): (Vec<Row>, Vec<f64>) = rows
            .iter()
            .zip(targets)
            .enumerate()
            .filter(|(i, _)| i % folds != k)
            .map(|(_, (r, y))| (*r, *y))
            .unzip();
        let model = LinearRegression::fit(&fit_rows, &fit_y)?;
        for i in (k..rows.len()).step_by(folds) {
            out[i] = model.predict(&rows[i]);
        }
    }
    Ok(out)
}

/// Train with the default configuration.
pub fn train(samples: &[TrainingSample], crop: CropType) -> ModelResult<TrainedModel> {
    Trainer::default().train(samples, crop)
}
