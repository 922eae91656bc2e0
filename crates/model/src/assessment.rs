//! Rule-based confidence and risk scoring that accompany every estimate.

use cropcast_core::{Feature, FeatureVector};
use serde::{Deserialize, Serialize};

/// Subtracted from the range-based confidence to account for model error.
pub const MODEL_UNCERTAINTY: f64 = 0.10;
pub const MIN_CONFIDENCE: f64 = 0.30;
pub const MAX_CONFIDENCE: f64 = 0.95;

pub const NO_RISK_FACTORS: &str = "No significant risk factors identified";

/// Ranges within which the models are considered reliable (crop-independent).
fn reliable_range(feature: Feature) -> (f64, f64) {
    match feature {
        Feature::Ph => (6.0, 7.0),
        Feature::OrganicMatter => (2.5, 5.0),
        Feature::Nitrogen => (20.0, 50.0),
        Feature::Phosphorus => (15.0, 40.0),
        Feature::Potassium => (100.0, 250.0),
        Feature::Temperature => (15.0, 30.0),
        Feature::Rainfall => (500.0, 1500.0),
        Feature::Humidity => (50.0, 80.0),
    }
}

/// Confidence in `[0.30, 0.95]`.
///
/// Each feature inside its reliable range scores 1; outside it scores
/// `1 - relative distance` (floored at 0). The mean score minus
/// [`MODEL_UNCERTAINTY`] is clamped to the bounds.
pub fn confidence(v: &FeatureVector) -> f64 {
    let total: f64 = Feature::ALL
        .into_iter()
        .map(|f| {
            let (lo, hi) = reliable_range(f);
            let x = v.get(f);
            if (lo..=hi).contains(&x) {
                1.0
            } else if x < lo {
                (1.0 - (lo - x) / lo).max(0.0)
            } else {
                (1.0 - (x - hi) / hi).max(0.0)
            }
        })
        .sum();
    let base = total / Feature::ALL.len() as f64;
    (base - MODEL_UNCERTAINTY).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 4 => RiskLevel::High,
            s if s >= 2 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: u32,
    /// Human-readable factors; never empty.
    pub factors: Vec<String>,
}

pub fn assess_risk(v: &FeatureVector) -> RiskAssessment {
    let mut score = 0;
    let mut factors = Vec::new();
    let mut flag = |points: u32, text: &str| {
        score += points;
        factors.push(text.to_string());
    };

    if v.ph < 5.5 || v.ph > 8.0 {
        flag(2, "Extreme pH levels may affect nutrient availability");
    } else if v.ph < 6.0 || v.ph > 7.5 {
        flag(1, "Suboptimal pH levels may reduce yield");
    }

    if v.temperature < 10.0 || v.temperature > 35.0 {
        flag(2, "Extreme temperatures may stress crops");
    } else if v.temperature < 15.0 || v.temperature > 30.0 {
        flag(1, "Temperature outside optimal range");
    }

    if v.rainfall < 300.0 {
        flag(2, "Insufficient rainfall may require additional irrigation");
    } else if v.rainfall > 2000.0 {
        flag(2, "Excessive rainfall may cause waterlogging");
    } else if v.rainfall < 500.0 || v.rainfall > 1500.0 {
        flag(1, "Rainfall outside optimal range");
    }

    if v.nitrogen < 15.0 {
        flag(1, "Low nitrogen levels may limit growth");
    }
    if v.phosphorus < 10.0 {
        flag(1, "Low phosphorus levels may affect root development");
    }
    if v.potassium < 80.0 {
        flag(1, "Low potassium levels may reduce disease resistance");
    }

    if factors.is_empty() {
        factors.push(NO_RISK_FACTORS.to_string());
    }
    RiskAssessment {
        level: RiskLevel::from_score(score),
        score,
        factors,
    }
}
