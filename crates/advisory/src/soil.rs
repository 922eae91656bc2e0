//! Soil scoring: generic soil health and crop-specific suitability.

use cropcast_core::{CropType, Feature, FeatureVector};
use serde::{Deserialize, Serialize};

use crate::tables::{Band, profile};

/// 100 inside the band, otherwise reduced by the relative distance to it.
pub fn band_score(value: f64, (lo, hi): Band) -> f64 {
    if (lo..=hi).contains(&value) {
        100.0
    } else if value < lo {
        (100.0 - (lo - value) / lo * 100.0).max(0.0)
    } else {
        (100.0 - (value - hi) / hi * 100.0).max(0.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterStatus {
    Optimal,
    Suboptimal,
    Poor,
}

impl ParameterStatus {
    fn from_score(score: f64) -> Self {
        if score >= 100.0 {
            ParameterStatus::Optimal
        } else if score > 70.0 {
            ParameterStatus::Suboptimal
        } else {
            ParameterStatus::Poor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterScore {
    pub feature: Feature,
    pub score: f64,
    pub current: f64,
    pub optimal_range: Band,
    pub status: ParameterStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuitabilityReport {
    pub crop: CropType,
    /// Mean parameter score, rounded.
    pub overall: u32,
    pub parameters: Vec<ParameterScore>,
    /// Parameters scoring below 70.
    pub limiting_factors: Vec<ParameterScore>,
    pub recommendations: Vec<String>,
}

const LIMITING_BELOW: f64 = 70.0;

/// Score the soil in `v` against `crop`'s pH and N/P/K preferences.
pub fn suitability(v: &FeatureVector, crop: CropType) -> SuitabilityReport {
    let prefs = profile(crop).soil;
    let checks = [
        (Feature::Ph, prefs.ph),
        (Feature::Nitrogen, prefs.nitrogen),
        (Feature::Phosphorus, prefs.phosphorus),
        (Feature::Potassium, prefs.potassium),
    ];

    let parameters: Vec<ParameterScore> = checks
        .into_iter()
        .map(|(feature, band)| {
            let current = v.get(feature);
            let score = band_score(current, band);
            ParameterScore {
                feature,
                score,
                current,
                optimal_range: band,
                status: ParameterStatus::from_score(score),
            }
        })
        .collect();
    let overall = (parameters.iter().map(|p| p.score).sum::<f64>() / parameters.len() as f64).round() as u32;
    let limiting_factors: Vec<ParameterScore> = parameters
        .iter()
        .filter(|p| p.score < LIMITING_BELOW)
        .cloned()
        .collect();

    let mut recommendations = Vec::new();
    if overall >= 85 {
        recommendations.push(format!("Soil conditions are excellent for {crop} production"));
        recommendations.push("Maintain current soil management practices".to_string());
    } else if overall >= 70 {
        recommendations.push(format!("Soil conditions are good for {crop} with minor adjustments needed"));
    } else {
        recommendations.push(format!("Soil requires significant improvements for optimal {crop} production"));
    }

    for factor in &limiting_factors {
        let (lo, hi) = factor.optimal_range;
        let low = factor.current < lo;
        let line = match (factor.feature, low) {
            (Feature::Ph, true) => format!("Apply lime to raise pH to {lo}-{hi} range for {crop}"),
            (Feature::Ph, false) => format!("Apply sulfur to lower pH to {lo}-{hi} range for {crop}"),
            (Feature::Nitrogen, true) => format!("Apply nitrogen fertilizer to reach {lo}-{hi} ppm for {crop}"),
            (Feature::Nitrogen, false) => {
                format!("Reduce nitrogen applications - current levels exceed {crop} requirements")
            }
            (nutrient, true) => format!(
                "Apply {} fertilizer to reach {lo}-{hi} ppm for {crop}",
                nutrient.name()
            ),
            (nutrient, false) => format!("Reduce {} applications for {crop}", nutrient.name()),
        };
        recommendations.push(line);
    }
    recommendations.extend(profile(crop).soil_notes.iter().map(|s| s.to_string()));

    SuitabilityReport {
        crop,
        overall,
        parameters,
        limiting_factors,
        recommendations,
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoilRating {
    Excellent,
    Good,
    Fair,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
}

impl SoilRating {
    pub fn from_score(score: u32) -> Self {
        match score {
            85.. => SoilRating::Excellent,
            75..=84 => SoilRating::Good,
            60..=74 => SoilRating::Fair,
            40..=59 => SoilRating::Poor,
            _ => SoilRating::VeryPoor,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Medium,
    High,
}

/// A parameter outside its generic optimal band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Imbalance {
    pub feature: Feature,
    pub current: f64,
    /// The violated edge of the optimal band.
    pub limit: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoilActions {
    pub immediate: Vec<String>,
    pub short_term: Vec<String>,
    pub long_term: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilHealthReport {
    pub overall: u32,
    pub rating: SoilRating,
    pub parameters: Vec<ParameterScore>,
    pub deficiencies: Vec<Imbalance>,
    pub excesses: Vec<Imbalance>,
    pub actions: SoilActions,
}

/// Crop-independent optimal bands for the soil features.
pub fn generic_soil_band(feature: Feature) -> Option<Band> {
    match feature {
        Feature::Ph => Some((6.0, 7.0)),
        Feature::OrganicMatter => Some((2.5, 5.0)),
        Feature::Nitrogen => Some((20.0, 50.0)),
        Feature::Phosphorus => Some((15.0, 40.0)),
        Feature::Potassium => Some((100.0, 250.0)),
        Feature::Temperature | Feature::Rainfall | Feature::Humidity => None,
    }
}

/// Score the five soil features against generic bands and plan remediation.
pub fn soil_health(v: &FeatureVector) -> SoilHealthReport {
    let mut parameters = Vec::new();
    let mut deficiencies = Vec::new();
    let mut excesses = Vec::new();

    for feature in Feature::ALL {
        let Some(band) = generic_soil_band(feature) else {
            continue;
        };
        let current = v.get(feature);
        let score = band_score(current, band);
        let severity = if score < 50.0 { Severity::High } else { Severity::Medium };
        if current < band.0 {
            deficiencies.push(Imbalance {
                feature,
                current,
                limit: band.0,
                severity,
            });
        } else if current > band.1 {
            excesses.push(Imbalance {
                feature,
                current,
                limit: band.1,
                severity,
            });
        }
        parameters.push(ParameterScore {
            feature,
            score,
            current,
            optimal_range: band,
            status: ParameterStatus::from_score(score),
        });
    }

    let overall = (parameters.iter().map(|p| p.score).sum::<f64>() / parameters.len() as f64).round() as u32;
    SoilHealthReport {
        overall,
        rating: SoilRating::from_score(overall),
        parameters,
        deficiencies,
        excesses,
        actions: soil_actions(v, overall),
    }
}

fn soil_actions(v: &FeatureVector, overall: u32) -> SoilActions {
    let mut a = SoilActions::default();

    if v.ph < 6.0 {
        a.immediate.push(format!("Apply lime to raise pH from {} to 6.0-7.0 range", v.ph));
        a.short_term.push("Retest pH after 3-4 months to monitor lime effectiveness".to_string());
    } else if v.ph > 8.0 {
        a.immediate.push(format!("Apply sulfur or organic matter to lower pH from {}", v.ph));
        a.short_term.push("Consider using acidifying fertilizers".to_string());
    }

    if v.organic_matter < 2.5 {
        a.immediate.push("Add compost or well-rotted manure to increase organic matter".to_string());
        a.long_term.push("Implement cover cropping to build long-term organic matter".to_string());
    } else if v.organic_matter > 6.0 {
        a.short_term.push("Monitor drainage as high organic matter can retain excess water".to_string());
    }

    for feature in [Feature::Nitrogen, Feature::Phosphorus, Feature::Potassium] {
        let Some((lo, hi)) = generic_soil_band(feature) else {
            continue;
        };
        let value = v.get(feature);
        let name = feature.name();
        if value < lo {
            if (lo - value) / lo > 0.5 {
                a.immediate.push(format!("Apply {name} fertilizer - severe deficiency detected"));
            } else {
                a.short_term.push(format!("Increase {name} levels through targeted fertilization"));
            }
        } else if value > hi * 1.5 {
            a.immediate.push(format!("Reduce {name} applications - excess levels detected"));
        }
    }

    if overall < 60 {
        a.immediate.push("Conduct comprehensive soil remediation program".to_string());
        a.long_term.push("Implement regular soil testing schedule (every 2-3 years)".to_string());
    }
    a.long_term.extend(
        [
            "Maintain crop rotation to preserve soil health",
            "Consider precision agriculture techniques for optimal nutrient management",
            "Implement sustainable farming practices to build long-term soil fertility",
        ]
        .map(String::from),
    );
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(ph: f64, n: f64, p: f64, k: f64) -> FeatureVector {
        FeatureVector::from_array([ph, 3.5, n, p, k, 22.0, 800.0, 65.0])
    }

    #[test]
    fn band_score_penalizes_relative_distance() {
        assert_eq!(band_score(6.5, (6.0, 7.0)), 100.0);
        assert!((band_score(4.5, (6.0, 7.0)) - 75.0).abs() < 1e-9);
        assert!((band_score(14.0, (6.0, 7.0)) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn ideal_corn_soil_is_excellent() {
        let report = suitability(&field(6.4, 45.0, 35.0, 200.0), CropType::Corn);
        assert_eq!(report.overall, 100);
        assert!(report.limiting_factors.is_empty());
        assert!(report.recommendations[0].contains("excellent for Corn"));
        assert!(report.recommendations.iter().any(|r| r.contains("drainage")));
    }

    #[test]
    fn acidic_low_potassium_soil_gets_lime_and_potash() {
        let report = suitability(&field(4.0, 30.0, 25.0, 40.0), CropType::Wheat);
        let limiting: Vec<Feature> = report.limiting_factors.iter().map(|f| f.feature).collect();
        assert_eq!(limiting, vec![Feature::Ph, Feature::Potassium]);
        assert!(report.recommendations.iter().any(|r| r.starts_with("Apply lime to raise pH to 6-7")));
        assert!(report.recommendations.iter().any(|r| r.starts_with("Apply potassium fertilizer")));
    }

    #[test]
    fn excess_nitrogen_is_flagged_for_reduction() {
        let report = suitability(&field(6.5, 90.0, 25.0, 150.0), CropType::Soybean);
        assert!(report.recommendations.iter().any(|r| r.starts_with("Reduce nitrogen applications")));
        assert!(report.recommendations.iter().any(|r| r.contains("Rhizobia")));
    }

    #[test]
    fn soil_health_rates_and_lists_imbalances() {
        let v = FeatureVector {
            organic_matter: 1.0,
            ..field(5.0, 5.0, 30.0, 500.0)
        };
        let report = soil_health(&v);
        assert_eq!(report.parameters.len(), 5);
        let deficient: Vec<Feature> = report.deficiencies.iter().map(|d| d.feature).collect();
        assert_eq!(deficient, vec![Feature::Ph, Feature::OrganicMatter, Feature::Nitrogen]);
        assert_eq!(report.excesses[0].feature, Feature::Potassium);
        assert!(report.actions.immediate.iter().any(|a| a.contains("nitrogen fertilizer - severe")));
        assert!(report.actions.immediate.iter().any(|a| a.contains("Reduce potassium")));
        assert!(report.overall < 85);
    }

    #[test]
    fn rating_bands() {
        assert_eq!(SoilRating::from_score(100), SoilRating::Excellent);
        assert_eq!(SoilRating::from_score(80), SoilRating::Good);
        assert_eq!(SoilRating::from_score(60), SoilRating::Fair);
        assert_eq!(SoilRating::from_score(59), SoilRating::Poor);
        assert_eq!(SoilRating::from_score(10), SoilRating::VeryPoor);
    }
}
