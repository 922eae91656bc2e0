use chrono::{DateTime, Utc};
use cropcast_advisory::WeatherConditions;
use serde::{Deserialize, Serialize};

/// Current conditions at a location, in metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub location: String,
    pub country: String,
    /// °C
    pub temperature: f64,
    pub feels_like: f64,
    /// %
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
    pub description: String,
    /// m/s
    pub wind_speed: f64,
    /// Degrees from north.
    pub wind_direction: f64,
    pub visibility_km: f64,
    pub uv_index: f64,
    /// Rough annual rainfall for the location, mm.
    pub rainfall_annual: f64,
    pub observed_at: DateTime<Utc>,
}

impl CurrentWeather {
    pub fn conditions(&self) -> WeatherConditions {
        WeatherConditions::new(self.temperature, self.humidity, self.description.clone())
    }
}

/// One three-hour forecast slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub description: String,
    pub wind_speed: f64,
    /// mm over the slot.
    pub precipitation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub location: String,
    pub days: u32,
    pub entries: Vec<ForecastEntry>,
}

/// Forecast slots per day (three-hour resolution).
pub const SLOTS_PER_DAY: usize = 8;

/// Annual rainfall guess from keywords in the location name, mm.
pub fn estimate_annual_rainfall(location: &str) -> f64 {
    let location = location.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| location.contains(w));
    if mentions(&["desert", "arizona", "nevada"]) {
        250.0
    } else if mentions(&["tropical", "florida", "hawaii"]) {
        1850.0
    } else if mentions(&["seattle", "oregon", "washington"]) {
        1150.0
    } else {
        850.0
    }
}

/// UV index guess from latitude band.
pub fn estimate_uv_index(latitude: f64) -> f64 {
    let lat = latitude.abs();
    if lat < 23.5 {
        10.0
    } else if lat < 40.0 {
        7.5
    } else {
        5.0
    }
}
