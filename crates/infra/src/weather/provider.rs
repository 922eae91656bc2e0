use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::types::{CurrentWeather, Forecast};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    #[error("weather API key is not configured")]
    MissingApiKey,

    #[error("weather API rejected the API key")]
    Unauthorized,

    #[error("location not found: {0}")]
    NotFound(String),

    #[error("invalid weather request: {0}")]
    InvalidRequest(String),

    #[error("weather API returned HTTP {0}")]
    Status(u16),

    #[error("weather API unreachable: {0}")]
    Transport(String),

    #[error("unexpected weather API response: {0}")]
    Decode(String),
}

impl WeatherError {
    /// Worth one more attempt: the request may succeed unchanged.
    pub fn is_transient(&self) -> bool {
        match self {
            WeatherError::Transport(_) => true,
            WeatherError::Status(code) => *code >= 500,
            _ => false,
        }
    }
}

/// Source of live weather data.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, location: &str) -> Result<CurrentWeather, WeatherError>;

    /// Up to `days` worth of three-hour forecast slots.
    async fn forecast(&self, location: &str, days: u32) -> Result<Forecast, WeatherError>;
}

#[async_trait]
impl<P> WeatherProvider for Arc<P>
where
    P: WeatherProvider + ?Sized,
{
    async fn current(&self, location: &str) -> Result<CurrentWeather, WeatherError> {
        (**self).current(location).await
    }

    async fn forecast(&self, location: &str, days: u32) -> Result<Forecast, WeatherError> {
        (**self).forecast(location, days).await
    }
}
