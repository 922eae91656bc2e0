//! `cropcast-model`
//!
//! Per-crop yield models: synthetic training data, a bagged regression
//! forest blended with ordinary least squares, and the rule-based
//! confidence/risk scoring attached to each estimate.
//!
//! Everything here is synchronous and storage-agnostic. Persistence and
//! caching of [`TrainedModel`] values live in `cropcast-infra`.

pub mod assessment;
pub mod ensemble;
pub mod error;
pub mod forest;
pub mod linear;
pub mod metrics;
pub mod sample;
pub mod scaler;
pub mod synthetic;
pub mod trainer;
pub mod tree;

pub use assessment::{RiskAssessment, RiskLevel, assess_risk, confidence};
pub use ensemble::{
    DEFAULT_FARM_AREA, EnsemblePredictor, EnsembleWeights, FeatureImportance, ModelSummary, TrainedModel,
    YieldEstimate,
};
pub use error::{ModelError, ModelResult};
pub use forest::{ForestParams, RandomForest};
pub use linear::LinearRegression;
pub use metrics::{ModelMetrics, RegressionMetrics};
pub use sample::TrainingSample;
pub use scaler::Scaler;
pub use synthetic::SyntheticDataGenerator;
pub use trainer::{MIN_TRAINING_SAMPLES, Trainer, TrainingConfig, train};
pub use tree::TreeParams;
