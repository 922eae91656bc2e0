//! Soil and weather feature vectors and their validation bounds.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// One of the eight model inputs, in canonical column order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Ph,
    OrganicMatter,
    Nitrogen,
    Phosphorus,
    Potassium,
    Temperature,
    Rainfall,
    Humidity,
}

impl Feature {
    pub const ALL: [Feature; FeatureVector::LEN] = [
        Feature::Ph,
        Feature::OrganicMatter,
        Feature::Nitrogen,
        Feature::Phosphorus,
        Feature::Potassium,
        Feature::Temperature,
        Feature::Rainfall,
        Feature::Humidity,
    ];

    /// Column index inside a [`FeatureVector`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Machine name (matches the JSON field name).
    pub fn name(self) -> &'static str {
        match self {
            Feature::Ph => "ph",
            Feature::OrganicMatter => "organic_matter",
            Feature::Nitrogen => "nitrogen",
            Feature::Phosphorus => "phosphorus",
            Feature::Potassium => "potassium",
            Feature::Temperature => "temperature",
            Feature::Rainfall => "rainfall",
            Feature::Humidity => "humidity",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Feature::Ph => "pH Level",
            Feature::OrganicMatter => "Organic Matter",
            Feature::Nitrogen => "Nitrogen",
            Feature::Phosphorus => "Phosphorus",
            Feature::Potassium => "Potassium",
            Feature::Temperature => "Temperature",
            Feature::Rainfall => "Rainfall",
            Feature::Humidity => "Humidity",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Feature::Ph => "pH",
            Feature::OrganicMatter => "%",
            Feature::Nitrogen | Feature::Phosphorus | Feature::Potassium => "ppm",
            Feature::Temperature => "°C",
            Feature::Rainfall => "mm/yr",
            Feature::Humidity => "%",
        }
    }

    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Eight soil/weather measurements in canonical order.
///
/// The struct itself only guarantees that all eight values exist; range and
/// finiteness checks are done by [`FeatureBounds::check`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub ph: f64,
    pub organic_matter: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub temperature: f64,
    pub rainfall: f64,
    pub humidity: f64,
}

impl ValueObject for FeatureVector {}

impl FeatureVector {
    pub const LEN: usize = 8;

    /// Build from a raw slice in canonical order.
    pub fn from_slice(values: &[f64]) -> DomainResult<Self> {
        let arr: [f64; Self::LEN] = values
            .try_into()
            .map_err(|_| DomainError::dimension(Self::LEN, values.len()))?;
        Ok(Self::from_array(arr))
    }

    pub fn from_array(values: [f64; Self::LEN]) -> Self {
        let [ph, organic_matter, nitrogen, phosphorus, potassium, temperature, rainfall, humidity] = values;
        Self {
            ph,
            organic_matter,
            nitrogen,
            phosphorus,
            potassium,
            temperature,
            rainfall,
            humidity,
        }
    }

    pub fn to_array(&self) -> [f64; Self::LEN] {
        [
            self.ph,
            self.organic_matter,
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.temperature,
            self.rainfall,
            self.humidity,
        ]
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.to_array()[feature.index()]
    }

    /// Copy of `self` with one reading replaced.
    pub fn with(self, feature: Feature, value: f64) -> Self {
        let mut values = self.to_array();
        values[feature.index()] = value;
        Self::from_array(values)
    }
}

/// Feature input where any value may be absent (e.g. a form or JSON body).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialFeatures {
    pub ph: Option<f64>,
    pub organic_matter: Option<f64>,
    pub nitrogen: Option<f64>,
    pub phosphorus: Option<f64>,
    pub potassium: Option<f64>,
    pub temperature: Option<f64>,
    pub rainfall: Option<f64>,
    pub humidity: Option<f64>,
}

impl PartialFeatures {
    pub fn get(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::Ph => self.ph,
            Feature::OrganicMatter => self.organic_matter,
            Feature::Nitrogen => self.nitrogen,
            Feature::Phosphorus => self.phosphorus,
            Feature::Potassium => self.potassium,
            Feature::Temperature => self.temperature,
            Feature::Rainfall => self.rainfall,
            Feature::Humidity => self.humidity,
        }
    }

    /// Fill `feature` only if the caller left it empty.
    pub fn fill_missing(&mut self, feature: Feature, value: f64) {
        let slot = match feature {
            Feature::Ph => &mut self.ph,
            Feature::OrganicMatter => &mut self.organic_matter,
            Feature::Nitrogen => &mut self.nitrogen,
            Feature::Phosphorus => &mut self.phosphorus,
            Feature::Potassium => &mut self.potassium,
            Feature::Temperature => &mut self.temperature,
            Feature::Rainfall => &mut self.rainfall,
            Feature::Humidity => &mut self.humidity,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    pub fn missing(&self) -> Vec<Feature> {
        Feature::ALL.into_iter().filter(|f| self.get(*f).is_none()).collect()
    }

    /// Require all eight values.
    pub fn complete(&self) -> DomainResult<FeatureVector> {
        let missing = self.missing();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|f| f.name()).collect();
            return Err(DomainError::validation(format!(
                "missing feature(s): {}",
                names.join(", ")
            )));
        }
        let mut values = [0.0; FeatureVector::LEN];
        for feature in Feature::ALL {
            values[feature.index()] = self.get(feature).unwrap_or_default();
        }
        Ok(FeatureVector::from_array(values))
    }
}

impl From<FeatureVector> for PartialFeatures {
    fn from(v: FeatureVector) -> Self {
        Self {
            ph: Some(v.ph),
            organic_matter: Some(v.organic_matter),
            nitrogen: Some(v.nitrogen),
            phosphorus: Some(v.phosphorus),
            potassium: Some(v.potassium),
            temperature: Some(v.temperature),
            rainfall: Some(v.rainfall),
            humidity: Some(v.humidity),
        }
    }
}

/// Inclusive valid range for one feature.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl ValueObject for FeatureRange {}

impl FeatureRange {
    pub fn new(min: f64, max: f64) -> DomainResult<Self> {
        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(DomainError::validation(format!(
                "invalid feature range [{min}, {max}]"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Configured valid ranges for all eight features.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureBounds {
    ranges: [FeatureRange; FeatureVector::LEN],
}

impl Default for FeatureBounds {
    /// Physical limits of each measurement.
    fn default() -> Self {
        let r = |min, max| FeatureRange { min, max };
        Self {
            ranges: [
                r(0.0, 14.0),
                r(0.0, 100.0),
                r(0.0, 1000.0),
                r(0.0, 1000.0),
                r(0.0, 2000.0),
                r(-50.0, 60.0),
                r(0.0, 10000.0),
                r(0.0, 100.0),
            ],
        }
    }
}

impl FeatureBounds {
    pub fn range(&self, feature: Feature) -> FeatureRange {
        self.ranges[feature.index()]
    }

    pub fn with_range(mut self, feature: Feature, min: f64, max: f64) -> DomainResult<Self> {
        self.ranges[feature.index()] = FeatureRange::new(min, max)?;
        Ok(self)
    }

    /// Check finiteness and range of every value, reporting all violations.
    pub fn check(&self, vector: &FeatureVector) -> DomainResult<()> {
        let mut problems = Vec::new();
        for feature in Feature::ALL {
            let value = vector.get(feature);
            let range = self.range(feature);
            if !value.is_finite() {
                problems.push(format!("{} must be a finite number", feature.name()));
            } else if !range.contains(value) {
                problems.push(format!(
                    "{} = {value} is outside the valid range [{}, {}] {}",
                    feature.name(),
                    range.min,
                    range.max,
                    feature.unit()
                ));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(DomainError::validation(problems.join("; ")))
        }
    }

    pub fn validate(&self, vector: FeatureVector) -> DomainResult<FeatureVector> {
        self.check(&vector)?;
        Ok(vector)
    }
}
