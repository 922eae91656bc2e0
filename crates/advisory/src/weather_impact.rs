//! Crop impact ratings and alerts derived from current weather conditions.

use cropcast_core::CropType;
use serde::{Deserialize, Serialize};

use crate::tables::{Band, profile};

/// The slice of a weather observation the advisory rules look at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConditions {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    pub description: String,
}

impl WeatherConditions {
    pub fn new(temperature: f64, humidity: f64, description: impl Into<String>) -> Self {
        Self {
            temperature,
            humidity,
            description: description.into(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureImpact {
    Optimal,
    Suboptimal,
    Poor,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HumidityImpact {
    Good,
    Suboptimal,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallImpact {
    Favorable,
    Moderate,
    Unfavorable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropWeatherImpact {
    pub crop: CropType,
    pub temperature: TemperatureImpact,
    pub humidity: HumidityImpact,
    pub overall: OverallImpact,
    /// At most three actions, most pressing first.
    pub recommendation: String,
}

/// Degrees outside the optimal band beyond which temperature is rated Poor.
const POOR_TEMPERATURE_MARGIN: f64 = 5.0;

fn rate_temperature(t: f64, (lo, hi): Band) -> TemperatureImpact {
    if (lo..=hi).contains(&t) {
        TemperatureImpact::Optimal
    } else if t < lo - POOR_TEMPERATURE_MARGIN || t > hi + POOR_TEMPERATURE_MARGIN {
        TemperatureImpact::Poor
    } else {
        TemperatureImpact::Suboptimal
    }
}

/// Rate how today's weather affects `crop`.
pub fn assess_crop(conditions: &WeatherConditions, crop: CropType) -> CropWeatherImpact {
    let p = profile(crop);
    let temperature = rate_temperature(conditions.temperature, p.temperature);
    let humidity = if (p.humidity.0..=p.humidity.1).contains(&conditions.humidity) {
        HumidityImpact::Good
    } else {
        HumidityImpact::Suboptimal
    };
    let overall = match (temperature, humidity) {
        (TemperatureImpact::Optimal, HumidityImpact::Good) => OverallImpact::Favorable,
        (TemperatureImpact::Poor, _) => OverallImpact::Unfavorable,
        _ => OverallImpact::Moderate,
    };

    CropWeatherImpact {
        crop,
        temperature,
        humidity,
        overall,
        recommendation: impact_actions(conditions, crop, overall)
            .into_iter()
            .take(3)
            .collect::<Vec<_>>()
            .join(" | "),
    }
}

fn impact_actions(c: &WeatherConditions, crop: CropType, overall: OverallImpact) -> Vec<String> {
    let mut out = Vec::new();
    if c.description.to_lowercase().contains("rain") {
        out.push("Monitor for waterlogging in low-lying areas".to_string());
        out.push("Ensure proper drainage systems are functional".to_string());
    }
    if c.temperature > 30.0 {
        out.push("Increase irrigation frequency due to high temperatures".to_string());
        out.push("Provide shade or cooling for heat-sensitive crops".to_string());
    } else if c.temperature < 15.0 {
        out.push("Protect crops from potential frost damage".to_string());
        out.push("Consider covering sensitive plants".to_string());
    }
    if c.humidity > 80.0 {
        out.push("Ensure good ventilation to prevent fungal diseases".to_string());
        out.push("Monitor for pest activity in humid conditions".to_string());
    } else if c.humidity < 50.0 {
        out.push("Increase irrigation to compensate for low humidity".to_string());
        out.push("Monitor soil moisture levels closely".to_string());
    }
    if overall == OverallImpact::Unfavorable {
        out.push(format!("Consider postponing field activities for {crop}"));
        out.push("Implement protective measures immediately".to_string());
    }
    if out.is_empty() {
        out.push("Weather conditions are favorable for normal farming activities".to_string());
    }
    out
}

/// Impact of `conditions` on every supported crop.
pub fn weather_impact(conditions: &WeatherConditions) -> Vec<CropWeatherImpact> {
    CropType::ALL.into_iter().map(|crop| assess_crop(conditions, crop)).collect()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    #[serde(rename = "Heat Warning")]
    HeatWarning,
    #[serde(rename = "Frost Alert")]
    FrostAlert,
    #[serde(rename = "Heavy Rain Warning")]
    HeavyRainWarning,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    pub recommendations: Vec<String>,
}

const HEAT_ALERT_ABOVE: f64 = 35.0;
const FROST_ALERT_BELOW: f64 = 5.0;

/// Farm-relevant alerts for extreme heat, frost or heavy rain.
pub fn weather_alerts(c: &WeatherConditions) -> Vec<WeatherAlert> {
    let mut alerts = Vec::new();
    if c.temperature > HEAT_ALERT_ABOVE {
        alerts.push(WeatherAlert {
            kind: AlertKind::HeatWarning,
            severity: AlertSeverity::High,
            message: format!("Extreme heat detected ({}°C). Protect crops from heat stress.", c.temperature),
            recommendations: [
                "Increase irrigation frequency",
                "Provide shade for sensitive crops",
                "Avoid field work during peak hours",
            ]
            .map(String::from)
            .to_vec(),
        });
    } else if c.temperature < FROST_ALERT_BELOW {
        alerts.push(WeatherAlert {
            kind: AlertKind::FrostAlert,
            severity: AlertSeverity::High,
            message: format!("Frost risk detected ({}°C). Protect sensitive crops.", c.temperature),
            recommendations: [
                "Cover sensitive plants",
                "Use frost protection methods",
                "Delay planting if possible",
            ]
            .map(String::from)
            .to_vec(),
        });
    }

    let description = c.description.to_lowercase();
    if description.contains("heavy rain") || description.contains("thunderstorm") {
        alerts.push(WeatherAlert {
            kind: AlertKind::HeavyRainWarning,
            severity: AlertSeverity::Medium,
            message: "Heavy rainfall expected. Check drainage systems.".to_string(),
            recommendations: [
                "Ensure proper field drainage",
                "Delay fertilizer application",
                "Monitor for waterlogging",
            ]
            .map(String::from)
            .to_vec(),
        });
    }
    alerts
}
