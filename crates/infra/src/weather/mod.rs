//! Live weather: provider boundary, OpenWeatherMap client and result types.
//!
//! Weather is an optional input. Callers treat every [`WeatherError`] as a
//! degraded mode and fall back to manually entered features.

pub mod openweather;
pub mod provider;
pub mod types;

pub use openweather::OpenWeatherClient;
pub use provider::{WeatherError, WeatherProvider};
pub use types::{CurrentWeather, Forecast, ForecastEntry, estimate_annual_rainfall, estimate_uv_index};
