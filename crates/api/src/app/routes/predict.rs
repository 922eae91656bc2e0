use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use cropcast_model::DEFAULT_FARM_AREA;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn predict(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::PredictRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let crop = match errors::parse_crop(&body.crop) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let fill = services
        .yields()
        .fill_weather(body.features, body.location.as_deref())
        .await;

    let features = match fill.features.complete() {
        Ok(v) => v,
        Err(e) => {
            let message = match &fill.degraded {
                Some(note) => format!("{e} ({note})"),
                None => e.to_string(),
            };
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", message);
        }
    };

    let farm_area = body.farm_area.unwrap_or(DEFAULT_FARM_AREA);
    let estimate = match services
        .blocking(move |svc| svc.predict(crop, &features, farm_area))
        .await
    {
        Ok(e) => e,
        Err(resp) => return resp,
    };

    (
        StatusCode::OK,
        Json(dto::PredictResponse {
            estimate,
            weather: fill.weather,
            degraded: fill.degraded,
        }),
    )
        .into_response()
}
