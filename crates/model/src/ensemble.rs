//! Trained per-crop model and the ensemble prediction path.

use chrono::{DateTime, Utc};
use cropcast_core::{CropType, DomainError, Feature, FeatureBounds, FeatureVector, ModelId};
use serde::{Deserialize, Serialize};

use crate::assessment::{RiskAssessment, assess_risk, confidence};
use crate::error::ModelResult;
use crate::forest::RandomForest;
use crate::linear::LinearRegression;
use crate::metrics::{ModelMetrics, mae};
use crate::scaler::Scaler;

/// Blend weights for the two ensemble members; they sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleWeights {
    pub forest: f64,
    pub linear: f64,
}

impl EnsembleWeights {
    pub const EQUAL: EnsembleWeights = EnsembleWeights {
        forest: 0.5,
        linear: 0.5,
    };

    /// Grid step used by [`EnsembleWeights::fit_holdout`].
    pub const GRID_STEP: f64 = 0.05;

    /// Pick the forest weight (on a 0.05 grid) that minimizes the held-out
    /// MAE of the clamped blend. Ties keep the weight closest to an even split.
    pub fn fit_holdout(forest: &[f64], linear: &[f64], actual: &[f64]) -> Self {
        let steps = (1.0 / Self::GRID_STEP).round() as usize;
        let mut best = Self::EQUAL;
        let mut best_mae = blended_mae(best, forest, linear, actual);
        if !best_mae.is_finite() {
            return Self::EQUAL;
        }
        for i in 0..=steps {
            let candidate = Self::with_forest_weight(i as f64 * Self::GRID_STEP);
            let err = blended_mae(candidate, forest, linear, actual);
            let closer = (candidate.forest - 0.5).abs() < (best.forest - 0.5).abs();
            if err < best_mae - 1e-12 || ((err - best_mae).abs() <= 1e-12 && closer) {
                best = candidate;
                best_mae = err;
            }
        }
        best
    }

    pub fn with_forest_weight(forest: f64) -> Self {
        let forest = forest.clamp(0.0, 1.0);
        Self {
            forest,
            linear: 1.0 - forest,
        }
    }

    pub fn blend(&self, forest: f64, linear: f64) -> f64 {
        self.forest * forest + self.linear * linear
    }
}

/// Everything needed to predict for one crop. Immutable once built; a
/// retrain produces a new value with a new id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub(crate) id: ModelId,
    pub(crate) crop: CropType,
    pub(crate) scaler: Scaler,
    pub(crate) forest: RandomForest,
    pub(crate) linear: LinearRegression,
    pub(crate) weights: EnsembleWeights,
    pub(crate) metrics: ModelMetrics,
    pub(crate) trained_at: DateTime<Utc>,
    pub(crate) train_samples: usize,
    pub(crate) test_samples: usize,
}

/// Summary of a trained model without the fitted parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub id: ModelId,
    pub crop: CropType,
    pub metrics: ModelMetrics,
    pub weights: EnsembleWeights,
    pub trained_at: DateTime<Utc>,
    pub train_samples: usize,
    pub test_samples: usize,
    pub n_trees: usize,
    pub feature_importances: Vec<FeatureImportance>,
}

impl TrainedModel {
    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn crop(&self) -> CropType {
        self.crop
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    pub fn linear(&self) -> &LinearRegression {
        &self.linear
    }

    pub fn weights(&self) -> EnsembleWeights {
        self.weights
    }

    pub fn metrics(&self) -> &ModelMetrics {
        &self.metrics
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Structural check for a model that came from outside the trainer,
    /// e.g. a deserialized artifact. Prediction assumes this holds.
    pub fn validate(&self) -> Result<(), String> {
        self.forest.validate()?;
        if !(self.weights.forest.is_finite() && self.weights.linear.is_finite()) {
            return Err("ensemble weights are not finite".to_string());
        }
        Ok(())
    }

    /// Forest importances, highest first.
    pub fn feature_importances(&self) -> Vec<FeatureImportance> {
        let raw = self.forest.feature_importances();
        let mut out: Vec<FeatureImportance> = Feature::ALL
            .into_iter()
            .map(|feature| FeatureImportance {
                feature,
                importance: raw[feature.index()],
            })
            .collect();
        out.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        out
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            id: self.id,
            crop: self.crop,
            metrics: self.metrics,
            weights: self.weights,
            trained_at: self.trained_at,
            train_samples: self.train_samples,
            test_samples: self.test_samples,
            n_trees: self.forest.n_trees(),
            feature_importances: self.feature_importances(),
        }
    }

    /// Raw member outputs for an already validated vector.
    pub fn components(&self, vector: &FeatureVector) -> (f64, f64) {
        let row = self.scaler.transform(vector);
        (self.forest.predict(&row), self.linear.predict(&row))
    }

    /// Blended per-hectare yield, finite and non-negative.
    pub fn predict_yield(&self, vector: &FeatureVector) -> f64 {
        let (forest, linear) = self.components(vector);
        non_negative(self.weights.blend(forest, linear))
    }
}

fn blended_mae(weights: EnsembleWeights, forest: &[f64], linear: &[f64], actual: &[f64]) -> f64 {
    let blended: Vec<f64> = forest
        .iter()
        .zip(linear)
        .map(|(f, l)| non_negative(weights.blend(*f, *l)))
        .collect();
    mae(&blended, actual)
}

fn non_negative(y: f64) -> f64 {
    if y.is_finite() { y.max(0.0) } else { 0.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: Feature,
    pub importance: f64,
}

/// Prediction output for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldEstimate {
    pub crop: CropType,
    pub model_id: ModelId,
    /// Tons per hectare.
    pub yield_per_ha: f64,
    /// Tons over `farm_area` hectares.
    pub total_yield: f64,
    pub farm_area: f64,
    pub forest_prediction: f64,
    pub linear_prediction: f64,
    pub weights: EnsembleWeights,
    pub confidence: f64,
    pub risk: RiskAssessment,
    pub feature_importances: Vec<FeatureImportance>,
}

pub const DEFAULT_FARM_AREA: f64 = 1.0;

/// Validates inputs against configured bounds and runs a [`TrainedModel`].
#[derive(Debug, Clone, Default)]
pub struct EnsemblePredictor {
    bounds: FeatureBounds,
}

impl EnsemblePredictor {
    pub fn new(bounds: FeatureBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> &FeatureBounds {
        &self.bounds
    }

    pub fn predict(&self, model: &TrainedModel, vector: &FeatureVector) -> ModelResult<YieldEstimate> {
        self.predict_for_area(model, vector, DEFAULT_FARM_AREA)
    }

    pub fn predict_for_area(
        &self,
        model: &TrainedModel,
        vector: &FeatureVector,
        farm_area: f64,
    ) -> ModelResult<YieldEstimate> {
        self.bounds.check(vector)?;
        if !(farm_area.is_finite() && farm_area > 0.0) {
            return Err(DomainError::validation(format!("farm_area must be a positive number, got {farm_area}")).into());
        }

        let (forest, linear) = model.components(vector);
        let per_ha = non_negative(model.weights.blend(forest, linear));

        Ok(YieldEstimate {
            crop: model.crop,
            model_id: model.id,
            yield_per_ha: per_ha,
            total_yield: per_ha * farm_area,
            farm_area,
            forest_prediction: forest,
            linear_prediction: linear,
            weights: model.weights,
            confidence: confidence(vector),
            risk: assess_risk(vector),
            feature_importances: model.feature_importances(),
        })
    }
}
