use serde::{Deserialize, Serialize};

use cropcast_advisory::profile;
use cropcast_core::{CropType, FeatureVector, PartialFeatures};
use cropcast_infra::CurrentWeather;
use cropcast_model::{TrainingSample, YieldEstimate};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub crop: String,
    #[serde(default)]
    pub features: PartialFeatures,
    pub farm_area: Option<f64>,
    /// Used to fill missing temperature, humidity and rainfall.
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FieldRequest {
    pub crop: String,
    #[serde(default)]
    pub features: PartialFeatures,
}

#[derive(Debug, Deserialize)]
pub struct SoilHealthRequest {
    #[serde(default)]
    pub features: PartialFeatures,
}

#[derive(Debug, Deserialize)]
pub struct FertilizerPlanRequest {
    pub crop: String,
    #[serde(default)]
    pub features: PartialFeatures,
    /// t/ha
    pub target_yield: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrainRequest {
    /// Synthetic sample count; ignored when `data` is given.
    pub samples: Option<usize>,
    pub seed: Option<u64>,
    /// Field observations to train on instead of synthetic data.
    pub data: Option<Vec<Observation>>,
}

/// One measured field: all eight features and the yield harvested (t/ha).
#[derive(Debug, Deserialize)]
pub struct Observation {
    pub features: PartialFeatures,
    pub yield_t_ha: f64,
}

#[derive(Debug, Deserialize)]
pub struct PlanQuery {
    pub month: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub days: Option<u32>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub estimate: YieldEstimate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<CurrentWeather>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

// -------------------------
// Mapping helpers
// -------------------------

pub fn crop_to_json(crop: CropType) -> serde_json::Value {
    let p = profile(crop);
    serde_json::json!({
        "slug": crop.slug(),
        "name": crop.display_name(),
        "water_needs": p.water_needs.label(),
        "planting_month": p.season.0,
        "harvest_month": p.season.1,
        "optimal_temperature": [p.temperature.0, p.temperature.1],
        "optimal_humidity": [p.humidity.0, p.humidity.1],
        "pests": p.pests,
    })
}

/// All eight features or a 400 naming the missing ones.
pub fn complete_features(features: &PartialFeatures) -> Result<FeatureVector, axum::response::Response> {
    features.complete().map_err(errors::domain_error_to_response)
}

/// Observations as training samples for `crop`, or a 400 naming the first bad one.
pub fn observations_to_samples(
    crop: CropType,
    observations: &[Observation],
) -> Result<Vec<TrainingSample>, axum::response::Response> {
    observations
        .iter()
        .enumerate()
        .map(|(i, obs)| {
            obs.features
                .complete()
                .and_then(|v| TrainingSample::new(v, crop, obs.yield_t_ha))
                .map_err(|e| {
                    errors::json_error(
                        axum::http::StatusCode::BAD_REQUEST,
                        "validation_error",
                        format!("data[{i}]: {e}"),
                    )
                })
        })
        .collect()
}
