use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use cropcast_core::CropType;

use crate::app::dto;
use crate::app::services::AppServices;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn crops(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    let cached = services.yields().cache().cached_crops();
    Json(serde_json::json!({
        "crops": CropType::ALL.into_iter().map(dto::crop_to_json).collect::<Vec<_>>(),
        "cached_models": cached.iter().map(|c| c.slug()).collect::<Vec<_>>(),
        "weather_enabled": services.yields().has_weather(),
    }))
}
