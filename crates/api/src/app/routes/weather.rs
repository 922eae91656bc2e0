use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use cropcast_advisory::{weather_alerts, weather_impact};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Default and maximum forecast horizon, days.
const DEFAULT_FORECAST_DAYS: u32 = 7;
const MAX_FORECAST_DAYS: u32 = 16;

pub fn router() -> Router {
    Router::new()
        .route("/:location", get(current))
        .route("/:location/forecast", get(forecast))
        .route("/:location/alerts", get(alerts))
        .route("/:location/impact", get(impact))
}

pub async fn current(
    Extension(services): Extension<Arc<AppServices>>,
    Path(location): Path<String>,
) -> axum::response::Response {
    match services.yields().current_weather(&location).await {
        Ok(w) => (StatusCode::OK, Json(w)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn forecast(
    Extension(services): Extension<Arc<AppServices>>,
    Path(location): Path<String>,
    query: Result<Query<dto::ForecastQuery>, QueryRejection>,
) -> axum::response::Response {
    let query = match errors::query_params(query) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let days = query.days.unwrap_or(DEFAULT_FORECAST_DAYS);
    if !(1..=MAX_FORECAST_DAYS).contains(&days) {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("days must be between 1 and {MAX_FORECAST_DAYS}"),
        );
    }
    match services.yields().forecast(&location, days).await {
        Ok(f) => (StatusCode::OK, Json(f)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn alerts(
    Extension(services): Extension<Arc<AppServices>>,
    Path(location): Path<String>,
) -> axum::response::Response {
    match services.yields().current_weather(&location).await {
        Ok(w) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "location": w.location,
                "alerts": weather_alerts(&w.conditions()),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn impact(
    Extension(services): Extension<Arc<AppServices>>,
    Path(location): Path<String>,
) -> axum::response::Response {
    match services.yields().current_weather(&location).await {
        Ok(w) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "location": w.location,
                "temperature": w.temperature,
                "humidity": w.humidity,
                "description": w.description,
                "crops": weather_impact(&w.conditions()),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
