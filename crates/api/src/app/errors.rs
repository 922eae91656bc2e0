use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use cropcast_core::{CropType, DomainError, GrowthStage};
use cropcast_infra::{ServiceError, WeatherError};
use cropcast_model::ModelError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Model(e) => model_error_to_response(e),
        ServiceError::Store(e) => {
            tracing::error!(error = %e, "model store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", e.to_string())
        }
        ServiceError::Weather(e) => weather_error_to_response(e),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let code = match &err {
        DomainError::UnknownCrop(_) => "unknown_crop",
        DomainError::UnknownStage(_) => "unknown_stage",
        DomainError::Dimension { .. } => "dimension_error",
        DomainError::Validation(_) | DomainError::InvalidId(_) => "validation_error",
    };
    json_error(StatusCode::BAD_REQUEST, code, err.to_string())
}

pub fn model_error_to_response(err: ModelError) -> axum::response::Response {
    match err {
        ModelError::Domain(e) => domain_error_to_response(e),
        ModelError::ModelNotFound(_) => json_error(StatusCode::NOT_FOUND, "model_not_found", err.to_string()),
        ModelError::InsufficientData { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "insufficient_data", err.to_string())
        }
        ModelError::Training(_) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "training_error", err.to_string()),
    }
}

pub fn weather_error_to_response(err: WeatherError) -> axum::response::Response {
    let (status, code) = match &err {
        WeatherError::MissingApiKey => (StatusCode::SERVICE_UNAVAILABLE, "weather_unavailable"),
        WeatherError::NotFound(_) => (StatusCode::NOT_FOUND, "location_not_found"),
        WeatherError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        WeatherError::Unauthorized
        | WeatherError::Status(_)
        | WeatherError::Transport(_)
        | WeatherError::Decode(_) => (StatusCode::BAD_GATEWAY, "weather_error"),
    };
    json_error(status, code, err.to_string())
}

/// Malformed or mistyped JSON bodies are validation errors like any other.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text())
}

pub fn json_body<T>(body: Result<axum::Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    body.map(|axum::Json(b)| b).map_err(json_rejection_to_response)
}

pub fn query_params<T>(query: Result<axum::extract::Query<T>, QueryRejection>) -> Result<T, axum::response::Response> {
    query
        .map(|axum::extract::Query(q)| q)
        .map_err(|rejection| json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text()))
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_crop(s: &str) -> Result<CropType, axum::response::Response> {
    s.parse().map_err(domain_error_to_response)
}

pub fn parse_stage(s: &str) -> Result<GrowthStage, axum::response::Response> {
    s.parse().map_err(domain_error_to_response)
}
