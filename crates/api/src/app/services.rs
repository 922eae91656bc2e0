use std::sync::Arc;

use cropcast_infra::{
    AppConfig, FileModelStore, ModelStore, OpenWeatherClient, ServiceResult, ServiceSettings, WeatherError,
    YieldService,
};

use crate::app::errors;

/// Shared per-process services handed to every handler.
pub struct AppServices {
    yield_service: Arc<YieldService>,
}

impl AppServices {
    pub fn new(yield_service: YieldService) -> Self {
        Self {
            yield_service: Arc::new(yield_service),
        }
    }

    pub fn yields(&self) -> &YieldService {
        &self.yield_service
    }

    /// Run model work (which may train) on the blocking pool.
    pub async fn blocking<T, F>(&self, f: F) -> Result<T, axum::response::Response>
    where
        T: Send + 'static,
        F: FnOnce(&YieldService) -> ServiceResult<T> + Send + 'static,
    {
        let svc = Arc::clone(&self.yield_service);
        match tokio::task::spawn_blocking(move || f(&svc)).await {
            Ok(result) => result.map_err(errors::service_error_to_response),
            Err(e) => {
                tracing::error!(error = %e, "blocking task failed");
                Err(errors::json_error(
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "request processing failed",
                ))
            }
        }
    }
}

/// Wire the file-backed model store and, when a key is configured, the
/// OpenWeatherMap client.
pub fn build_services(config: &AppConfig) -> AppServices {
    let store: Arc<dyn ModelStore> = Arc::new(FileModelStore::new(&config.model_dir));
    let mut service = YieldService::new(store, ServiceSettings::from(config));

    match OpenWeatherClient::new(&config.weather) {
        Ok(client) => service = service.with_weather(Arc::new(client)),
        Err(WeatherError::MissingApiKey) => {}
        Err(e) => tracing::warn!(error = %e, "weather client unavailable; continuing without live weather"),
    }

    tracing::info!(
        model_dir = %config.model_dir.display(),
        auto_train = config.auto_train,
        weather = service.has_weather(),
        "services ready"
    );
    AppServices::new(service)
}
