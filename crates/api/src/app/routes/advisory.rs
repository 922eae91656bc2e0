use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{Datelike, Utc};
use cropcast_advisory::{fertilizer_plan, field_plan, soil_health, suitability, weekly_schedule};
use cropcast_core::{FeatureVector, PartialFeatures};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/recommend", post(recommend))
        .route("/suitability", post(soil_suitability))
        .route("/soil-health", post(soil_health_report))
        .route("/fertilizer-plan", post(fertilizer))
        .route("/plan/:crop/:stage", get(plan))
        .route("/schedule/:crop/:stage", get(schedule))
}

/// Complete and bounds-checked features, or the error response.
fn checked_features(
    services: &AppServices,
    features: &PartialFeatures,
) -> Result<FeatureVector, axum::response::Response> {
    let v = dto::complete_features(features)?;
    services
        .yields()
        .settings()
        .bounds
        .check(&v)
        .map_err(errors::domain_error_to_response)?;
    Ok(v)
}

pub async fn recommend(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::FieldRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let crop = match errors::parse_crop(&body.crop) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let v = match dto::complete_features(&body.features) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.yields().recommend(crop, &v) {
        Ok(rec) => (StatusCode::OK, Json(rec)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn soil_suitability(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::FieldRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let crop = match errors::parse_crop(&body.crop) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match checked_features(&services, &body.features) {
        Ok(v) => (StatusCode::OK, Json(suitability(&v, crop))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn soil_health_report(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::SoilHealthRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    match checked_features(&services, &body.features) {
        Ok(v) => (StatusCode::OK, Json(soil_health(&v))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn fertilizer(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::FertilizerPlanRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let crop = match errors::parse_crop(&body.crop) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let v = match checked_features(&services, &body.features) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match fertilizer_plan(&v, crop, body.target_yield) {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn plan(
    Path((crop, stage)): Path<(String, String)>,
    query: Result<Query<dto::PlanQuery>, QueryRejection>,
) -> axum::response::Response {
    let query = match errors::query_params(query) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let crop = match errors::parse_crop(&crop) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let stage = match errors::parse_stage(&stage) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let month = query.month.unwrap_or_else(|| Utc::now().month());
    match field_plan(crop, stage, month) {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn schedule(Path((crop, stage)): Path<(String, String)>) -> axum::response::Response {
    let crop = match errors::parse_crop(&crop) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let stage = match errors::parse_stage(&stage) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    (StatusCode::OK, Json(weekly_schedule(crop, stage))).into_response()
}
