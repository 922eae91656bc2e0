//! Infrastructure layer: configuration, model persistence and caching, the
//! weather API client, and the application service that ties them to the
//! model and advisory crates.

pub mod config;
pub mod model_cache;
pub mod service;
pub mod weather;

pub use config::{AppConfig, ConfigError, WeatherConfig};
pub use model_cache::{FileModelStore, InMemoryModelStore, ModelCache, ModelStore, ModelStoreError};
pub use service::{ServiceError, ServiceResult, ServiceSettings, WeatherFill, YieldService};
pub use weather::{CurrentWeather, Forecast, OpenWeatherClient, WeatherError, WeatherProvider};
