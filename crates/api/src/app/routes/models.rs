use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/:crop", get(get_model))
        .route("/:crop/train", post(train_model))
}

pub async fn get_model(
    Extension(services): Extension<Arc<AppServices>>,
    Path(crop): Path<String>,
) -> axum::response::Response {
    let crop = match errors::parse_crop(&crop) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match services.blocking(move |svc| svc.model_summary(crop)).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn train_model(
    Extension(services): Extension<Arc<AppServices>>,
    Path(crop): Path<String>,
    body: Result<Json<dto::TrainRequest>, JsonRejection>,
) -> axum::response::Response {
    let crop = match errors::parse_crop(&crop) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    // A bodiless POST trains on synthetic data with the configured defaults.
    let req = match body {
        Err(JsonRejection::MissingJsonContentType(_)) => dto::TrainRequest::default(),
        other => match errors::json_body(other) {
            Ok(r) => r,
            Err(resp) => return resp,
        },
    };

    let trained = match req.data {
        Some(observations) => {
            let samples = match dto::observations_to_samples(crop, &observations) {
                Ok(s) => s,
                Err(resp) => return resp,
            };
            services.blocking(move |svc| svc.train_on(crop, &samples)).await
        }
        None => {
            services
                .blocking(move |svc| svc.retrain(crop, req.samples, req.seed))
                .await
        }
    };
    match trained {
        Ok(summary) => (StatusCode::CREATED, Json(summary)).into_response(),
        Err(resp) => resp,
    }
}
