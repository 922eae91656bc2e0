use axum::{
    Router,
    routing::{get, post},
};

pub mod advisory;
pub mod models;
pub mod predict;
pub mod system;
pub mod weather;

/// Router for all endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/crops", get(system::crops))
        .route("/predict", post(predict::predict))
        .merge(advisory::router())
        .nest("/models", models::router())
        .nest("/weather", weather::router())
}
