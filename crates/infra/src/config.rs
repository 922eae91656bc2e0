//! Process configuration read from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use cropcast_core::{Feature, FeatureBounds};
use cropcast_model::{ForestParams, TrainingConfig};
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MODEL_DIR: &str = "./models";
pub const DEFAULT_TRAINING_SAMPLES: usize = 1000;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_WEATHER_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            var: var.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherConfig {
    /// `None` disables live weather; callers fall back to manual features.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_WEATHER_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub model_dir: PathBuf,
    /// Train a model on first use when none is cached.
    pub auto_train: bool,
    /// Synthetic samples generated per crop for automatic training.
    pub training_samples: usize,
    pub seed: u64,
    pub forest_trees: usize,
    pub bounds: FeatureBounds,
    pub weather: WeatherConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            auto_train: true,
            training_samples: DEFAULT_TRAINING_SAMPLES,
            seed: DEFAULT_SEED,
            forest_trees: ForestParams::default().n_trees,
            bounds: FeatureBounds::default(),
            weather: WeatherConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which returns the raw value of a
    /// variable if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = match lookup("CROPCAST_BIND_ADDR") {
            Some(raw) => parse("CROPCAST_BIND_ADDR", &raw)?,
            None => {
                warn!("CROPCAST_BIND_ADDR not set; using {DEFAULT_BIND_ADDR}");
                defaults.bind_addr
            }
        };
        let model_dir = match lookup("CROPCAST_MODEL_DIR") {
            Some(raw) if !raw.trim().is_empty() => PathBuf::from(raw),
            _ => {
                warn!("CROPCAST_MODEL_DIR not set; using {DEFAULT_MODEL_DIR}");
                defaults.model_dir
            }
        };
        let auto_train = match lookup("CROPCAST_AUTO_TRAIN") {
            Some(raw) => parse_bool("CROPCAST_AUTO_TRAIN", &raw)?,
            None => defaults.auto_train,
        };
        let training_samples = optional(&lookup, "CROPCAST_TRAINING_SAMPLES")?.unwrap_or(defaults.training_samples);
        let seed = optional(&lookup, "CROPCAST_SEED")?.unwrap_or(defaults.seed);
        let forest_trees: usize = optional(&lookup, "CROPCAST_FOREST_TREES")?.unwrap_or(defaults.forest_trees);
        if forest_trees == 0 {
            return Err(ConfigError::invalid("CROPCAST_FOREST_TREES", "0", "must be at least 1"));
        }

        let mut bounds = defaults.bounds;
        for feature in Feature::ALL {
            let var = format!("CROPCAST_BOUNDS_{}", feature.name().to_uppercase());
            if let Some(raw) = lookup(&var) {
                let (min, max) = parse_range(&var, &raw)?;
                bounds = bounds
                    .with_range(feature, min, max)
                    .map_err(|e| ConfigError::invalid(&var, &raw, e))?;
            }
        }

        let api_key = lookup("OPENWEATHER_API_KEY").filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!("OPENWEATHER_API_KEY not set; live weather is disabled");
        }
        let weather = WeatherConfig {
            api_key,
            base_url: lookup("OPENWEATHER_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.weather.base_url),
            timeout: optional(&lookup, "CROPCAST_WEATHER_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.weather.timeout),
        };

        Ok(Self {
            bind_addr,
            model_dir,
            auto_train,
            training_samples,
            seed,
            forest_trees,
            bounds,
            weather,
        })
    }

    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig::default()
            .with_seed(self.seed)
            .with_forest(ForestParams::default().with_trees(self.forest_trees).with_seed(self.seed))
            .with_bounds(self.bounds)
    }
}

fn parse<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::invalid(var, raw, e))
}

fn optional<T>(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    lookup(var).map(|raw| parse(var, &raw)).transpose()
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(var, raw, "expected true or false")),
    }
}

fn parse_range(var: &str, raw: &str) -> Result<(f64, f64), ConfigError> {
    let (min, max) = raw
        .split_once(',')
        .ok_or_else(|| ConfigError::invalid(var, raw, "expected min,max"))?;
    Ok((parse(var, min)?, parse(var, max)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(cfg.weather.api_key.is_none());
    }

    #[test]
    fn values_override_defaults() {
        let cfg = config(&[
            ("CROPCAST_BIND_ADDR", "127.0.0.1:9000"),
            ("CROPCAST_MODEL_DIR", "/var/lib/cropcast"),
            ("CROPCAST_AUTO_TRAIN", "false"),
            ("CROPCAST_TRAINING_SAMPLES", "250"),
            ("CROPCAST_SEED", "7"),
            ("CROPCAST_FOREST_TREES", "25"),
            ("OPENWEATHER_API_KEY", "k"),
            ("OPENWEATHER_BASE_URL", "http://localhost:1234/"),
            ("CROPCAST_WEATHER_TIMEOUT_SECS", "3"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.model_dir, PathBuf::from("/var/lib/cropcast"));
        assert!(!cfg.auto_train);
        assert_eq!(cfg.training_samples, 250);
        assert_eq!(cfg.weather.api_key.as_deref(), Some("k"));
        assert_eq!(cfg.weather.base_url, "http://localhost:1234");
        assert_eq!(cfg.weather.timeout, Duration::from_secs(3));

        let training = cfg.training_config();
        assert_eq!(training.split_seed, 7);
        assert_eq!(training.forest.n_trees, 25);
        assert_eq!(training.forest.seed, 7);
    }

    #[test]
    fn bounds_are_configurable_per_feature() {
        let cfg = config(&[("CROPCAST_BOUNDS_PH", "4, 9")]).unwrap();
        assert_eq!(cfg.bounds.range(Feature::Ph).min, 4.0);
        assert_eq!(cfg.bounds.range(Feature::Ph).max, 9.0);
        assert_eq!(cfg.bounds.range(Feature::Humidity), FeatureBounds::default().range(Feature::Humidity));
        assert_eq!(cfg.training_config().bounds, cfg.bounds);
    }

    #[test]
    fn malformed_values_are_config_errors() {
        for vars in [
            [("CROPCAST_SEED", "forty-two")],
            [("CROPCAST_AUTO_TRAIN", "maybe")],
            [("CROPCAST_BIND_ADDR", "not-an-addr")],
            [("CROPCAST_BOUNDS_PH", "9")],
            [("CROPCAST_BOUNDS_PH", "9,4")],
            [("CROPCAST_FOREST_TREES", "0")],
        ] {
            let err = config(&vars).unwrap_err();
            let ConfigError::Invalid { var, .. } = err;
            assert_eq!(var, vars[0].0);
        }
    }
}
