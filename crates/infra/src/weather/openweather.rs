use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::provider::{WeatherError, WeatherProvider};
use super::types::{
    CurrentWeather, Forecast, ForecastEntry, SLOTS_PER_DAY, estimate_annual_rainfall, estimate_uv_index,
};
use crate::config::WeatherConfig;

/// Extra attempts after a transient failure.
const MAX_RETRIES: u32 = 1;

/// OpenWeatherMap client for the `/weather` and `/forecast` endpoints.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let api_key = config.api_key.clone().ok_or(WeatherError::MissingApiKey)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WeatherError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, location: &str) -> Result<T, WeatherError> {
        let mut attempt = 0;
        loop {
            match self.fetch(endpoint, location).await {
                Err(e) if e.is_transient() && attempt < MAX_RETRIES => {
                    attempt += 1;
                    warn!(endpoint, location, error = %e, attempt, "retrying weather request");
                }
                other => return other,
            }
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, endpoint: &str, location: &str) -> Result<T, WeatherError> {
        let url = format!("{}/{endpoint}", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("q", location), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(|e| WeatherError::Transport(e.to_string()))?;

        let status = response.status();
        match status.as_u16() {
            200..=299 => {}
            401 => return Err(WeatherError::Unauthorized),
            404 => return Err(WeatherError::NotFound(location.to_string())),
            code => return Err(WeatherError::Status(code)),
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| WeatherError::Transport(e.to_string()))?;
        debug!(endpoint, location, bytes = body.len(), "weather response");
        serde_json::from_slice(&body).map_err(|e| WeatherError::Decode(e.to_string()))
    }
}

fn require_location(location: &str) -> Result<&str, WeatherError> {
    let location = location.trim();
    if location.is_empty() {
        return Err(WeatherError::InvalidRequest("location must not be empty".to_string()));
    }
    Ok(location)
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, location: &str) -> Result<CurrentWeather, WeatherError> {
        let location = require_location(location)?;
        let raw: OwmCurrent = self.get_json("weather", location).await?;
        Ok(CurrentWeather {
            country: raw.sys.country.unwrap_or_default(),
            temperature: raw.main.temp,
            feels_like: raw.main.feels_like.unwrap_or(raw.main.temp),
            humidity: raw.main.humidity,
            pressure: raw.main.pressure.unwrap_or_default(),
            description: first_description(&raw.weather),
            wind_speed: raw.wind.speed,
            wind_direction: raw.wind.deg.unwrap_or_default(),
            visibility_km: raw.visibility.unwrap_or_default() / 1000.0,
            uv_index: estimate_uv_index(raw.coord.lat),
            rainfall_annual: estimate_annual_rainfall(location),
            location: raw.name,
            observed_at: Utc::now(),
        })
    }

    async fn forecast(&self, location: &str, days: u32) -> Result<Forecast, WeatherError> {
        let location = require_location(location)?;
        if days == 0 {
            return Err(WeatherError::InvalidRequest("days must be at least 1".to_string()));
        }
        let raw: OwmForecast = self.get_json("forecast", location).await?;

        let entries = raw
            .list
            .into_iter()
            .take(days as usize * SLOTS_PER_DAY)
            .map(|slot| -> Result<ForecastEntry, WeatherError> {
                let time = DateTime::<Utc>::from_timestamp(slot.dt, 0)
                    .ok_or_else(|| WeatherError::Decode(format!("timestamp out of range: {}", slot.dt)))?;
                Ok(ForecastEntry {
                    time,
                    temperature: slot.main.temp,
                    humidity: slot.main.humidity,
                    description: first_description(&slot.weather),
                    wind_speed: slot.wind.speed,
                    precipitation: slot.rain.map(|r| r.three_hours).unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>, WeatherError>>()?;

        Ok(Forecast {
            location: raw.city.map(|c| c.name).unwrap_or_else(|| location.to_string()),
            days,
            entries,
        })
    }
}

fn first_description(weather: &[OwmDescription]) -> String {
    weather.first().map(|w| w.description.clone()).unwrap_or_default()
}

#[derive(Deserialize)]
struct OwmCurrent {
    name: String,
    #[serde(default)]
    sys: OwmSys,
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmDescription>,
    #[serde(default)]
    wind: OwmWind,
    visibility: Option<f64>,
    #[serde(default)]
    coord: OwmCoord,
}

#[derive(Deserialize, Default)]
struct OwmSys {
    country: Option<String>,
}

#[derive(Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
    feels_like: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Deserialize)]
struct OwmDescription {
    description: String,
}

#[derive(Deserialize, Default)]
struct OwmWind {
    #[serde(default)]
    speed: f64,
    deg: Option<f64>,
}

#[derive(Deserialize, Default)]
struct OwmCoord {
    #[serde(default)]
    lat: f64,
}

#[derive(Deserialize)]
struct OwmForecast {
    list: Vec<OwmSlot>,
    city: Option<OwmCity>,
}

#[derive(Deserialize)]
struct OwmSlot {
    dt: i64,
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmDescription>,
    #[serde(default)]
    wind: OwmWind,
    rain: Option<OwmRain>,
}

#[derive(Deserialize)]
struct OwmRain {
    #[serde(rename = "3h", default)]
    three_hours: f64,
}

#[derive(Deserialize)]
struct OwmCity {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    const KEY: &str = "test-key";

    #[derive(Clone, Default)]
    struct Mock {
        flaky_calls: Arc<AtomicUsize>,
        down_calls: Arc<AtomicUsize>,
    }

    fn rejected(params: &HashMap<String, String>) -> Option<Response> {
        if params.get("appid").map(String::as_str) != Some(KEY) {
            return Some((StatusCode::UNAUTHORIZED, Json(json!({"cod": 401}))).into_response());
        }
        if params.get("units").map(String::as_str) != Some("metric") {
            return Some(StatusCode::BAD_REQUEST.into_response());
        }
        None
    }

    async fn current(State(mock): State<Mock>, Query(params): Query<HashMap<String, String>>) -> Response {
        if let Some(resp) = rejected(&params) {
            return resp;
        }
        match params.get("q").map(String::as_str).unwrap_or_default() {
            "Nowhere" => StatusCode::NOT_FOUND.into_response(),
            "Down" => {
                mock.down_calls.fetch_add(1, Ordering::SeqCst);
                StatusCode::SERVICE_UNAVAILABLE.into_response()
            }
            "Flaky" if mock.flaky_calls.fetch_add(1, Ordering::SeqCst) == 0 => StatusCode::BAD_GATEWAY.into_response(),
            q => Json(json!({
                "name": q,
                "coord": {"lat": 31.5, "lon": 74.3},
                "sys": {"country": "PK"},
                "main": {"temp": 31.2, "feels_like": 33.0, "humidity": 48, "pressure": 1008},
                "weather": [{"description": "clear sky"}],
                "wind": {"speed": 3.6, "deg": 270},
                "visibility": 8000
            }))
            .into_response(),
        }
    }

    async fn forecast(Query(params): Query<HashMap<String, String>>) -> Response {
        if let Some(resp) = rejected(&params) {
            return resp;
        }
        let list: Vec<_> = (0..40)
            .map(|i| {
                let mut slot = json!({
                    "dt": 1_700_000_000 + i * 10_800,
                    "main": {"temp": 20.0 + i as f64 * 0.1, "humidity": 60},
                    "weather": [{"description": "light rain"}],
                    "wind": {"speed": 2.0}
                });
                if i % 2 == 0 {
                    slot["rain"] = json!({"3h": 0.5});
                }
                slot
            })
            .collect();
        Json(json!({"list": list, "city": {"name": "Lahore"}})).into_response()
    }

    async fn spawn_mock() -> (String, Mock) {
        let mock = Mock::default();
        let app = Router::new()
            .route("/weather", get(current))
            .route("/forecast", get(forecast))
            .with_state(mock.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), mock)
    }

    fn client(base_url: &str, key: &str) -> OpenWeatherClient {
        OpenWeatherClient::new(&WeatherConfig {
            api_key: Some(key.to_string()),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn client_needs_an_api_key() {
        let err = OpenWeatherClient::new(&WeatherConfig::default()).unwrap_err();
        assert_eq!(err, WeatherError::MissingApiKey);
    }

    #[tokio::test]
    async fn current_weather_is_parsed() {
        let (url, _) = spawn_mock().await;
        let w = client(&url, KEY).current("Lahore").await.unwrap();
        assert_eq!(w.location, "Lahore");
        assert_eq!(w.country, "PK");
        assert_eq!(w.temperature, 31.2);
        assert_eq!(w.humidity, 48.0);
        assert_eq!(w.wind_direction, 270.0);
        assert_eq!(w.visibility_km, 8.0);
        assert_eq!(w.uv_index, 7.5);
        assert_eq!(w.rainfall_annual, 850.0);
        assert_eq!(w.conditions().description, "clear sky");
    }

    #[tokio::test]
    async fn forecast_is_truncated_to_requested_days() {
        let (url, _) = spawn_mock().await;
        let f = client(&url, KEY).forecast("Lahore", 2).await.unwrap();
        assert_eq!(f.entries.len(), 16);
        assert_eq!(f.entries[0].precipitation, 0.5);
        assert_eq!(f.entries[1].precipitation, 0.0);
        assert_eq!(f.entries[1].time.timestamp(), 1_700_010_800);

        let all = client(&url, KEY).forecast("Lahore", 7).await.unwrap();
        assert_eq!(all.entries.len(), 40);
        assert!(client(&url, KEY).forecast("Lahore", 0).await.is_err());
    }

    #[tokio::test]
    async fn status_codes_map_to_errors() {
        let (url, mock) = spawn_mock().await;
        assert_eq!(client(&url, "wrong").current("Lahore").await.unwrap_err(), WeatherError::Unauthorized);
        assert_eq!(
            client(&url, KEY).current("Nowhere").await.unwrap_err(),
            WeatherError::NotFound("Nowhere".to_string())
        );
        assert_eq!(client(&url, KEY).current("Down").await.unwrap_err(), WeatherError::Status(503));
        assert_eq!(mock.down_calls.load(Ordering::SeqCst), 2);
        assert!(matches!(
            client(&url, KEY).current("  ").await.unwrap_err(),
            WeatherError::InvalidRequest(_)
        ));
    }

    #[tokio::test]
    async fn one_server_error_is_retried() {
        let (url, mock) = spawn_mock().await;
        let w = client(&url, KEY).current("Flaky").await.unwrap();
        assert_eq!(w.location, "Flaky");
        assert_eq!(mock.flaky_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let err = client(&url, KEY).current("Lahore").await.unwrap_err();
        assert!(matches!(err, WeatherError::Transport(_)));
    }
}
