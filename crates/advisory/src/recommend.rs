//! Rule-table recommendations for a field, keyed by crop and coarse feature buckets.

use cropcast_core::{CropType, Feature, FeatureVector, GrowthStage};
use serde::{Deserialize, Serialize};

use crate::field_plan::{Priority, fertilizer_priority};
use crate::tables::{WaterNeeds, fertilizer_timing, profile};

const MAINTAIN_SOIL: &str = "Soil is within the preferred range; maintain current practices";
const MAINTAIN_WEATHER: &str = "Conditions match the crop's optimal range; maintain current practices";

/// Organic matter (%) below which compost is advised.
const LOW_ORGANIC_MATTER: f64 = 2.5;
/// Humidity (%) above which fungal disease pressure is flagged.
const FUNGAL_HUMIDITY: f64 = 80.0;
/// Temperature (°C) above which insect pressure is flagged.
const INSECT_TEMPERATURE: f64 = 28.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageAdvice {
    pub stage: GrowthStage,
    pub fertilizers: Vec<String>,
    pub timing: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub crop: CropType,
    pub water_needs: WaterNeeds,
    /// Fertilizer schedule, one entry per growth stage.
    pub stages: Vec<StageAdvice>,
    pub pest_management: Vec<String>,
    pub soil_amendments: Vec<String>,
    pub weather_notes: Vec<String>,
}

impl Recommendation {
    /// True when every section carries at least one entry.
    pub fn is_complete(&self) -> bool {
        !self.stages.is_empty()
            && !self.pest_management.is_empty()
            && !self.soil_amendments.is_empty()
            && !self.weather_notes.is_empty()
    }
}

/// Advice for growing `crop` on a field described by `v`. Never fails and
/// never returns an empty section.
pub fn recommend(v: &FeatureVector, crop: CropType) -> Recommendation {
    let p = profile(crop);

    let stages = GrowthStage::ALL
        .into_iter()
        .map(|stage| StageAdvice {
            stage,
            fertilizers: p.fertilizers_for(stage).iter().map(|s| s.to_string()).collect(),
            timing: fertilizer_timing(stage).to_string(),
            priority: fertilizer_priority(stage),
        })
        .collect();

    Recommendation {
        crop,
        water_needs: p.water_needs,
        stages,
        pest_management: pest_notes(v, crop),
        soil_amendments: soil_amendments(v, crop),
        weather_notes: weather_notes(v, crop),
    }
}

fn pest_notes(v: &FeatureVector, crop: CropType) -> Vec<String> {
    let p = profile(crop);
    let mut notes = vec![format!("Scout regularly for {}", p.pests.join(", "))];
    if v.humidity > FUNGAL_HUMIDITY {
        notes.push(format!(
            "High humidity ({}%) favors fungal disease; improve airflow and consider preventive fungicide",
            v.humidity
        ));
    }
    if v.temperature > INSECT_TEMPERATURE {
        notes.push(format!(
            "Warm conditions ({}°C) speed up insect life cycles; shorten the scouting interval",
            v.temperature
        ));
    }
    notes
}

fn soil_amendments(v: &FeatureVector, crop: CropType) -> Vec<String> {
    let prefs = profile(crop).soil;
    let mut out = Vec::new();

    let (ph_lo, ph_hi) = prefs.ph;
    if v.ph < ph_lo {
        out.push(format!("Apply agricultural lime to raise pH from {} toward {ph_lo}-{ph_hi}", v.ph));
    } else if v.ph > ph_hi {
        out.push(format!("Apply elemental sulfur to lower pH from {} toward {ph_lo}-{ph_hi}", v.ph));
    }

    for (feature, (lo, hi)) in [
        (Feature::Nitrogen, prefs.nitrogen),
        (Feature::Phosphorus, prefs.phosphorus),
        (Feature::Potassium, prefs.potassium),
    ] {
        let value = v.get(feature);
        let name = feature.name();
        if value < lo {
            out.push(format!("Increase {name}: {value} {} is below the {lo}-{hi} target", feature.unit()));
        } else if value > hi {
            out.push(format!("Withhold {name} fertilizer: {value} {} exceeds the {lo}-{hi} target", feature.unit()));
        }
    }

    if v.organic_matter < LOW_ORGANIC_MATTER {
        out.push("Incorporate compost or manure to raise organic matter".to_string());
    }
    if out.is_empty() {
        out.push(MAINTAIN_SOIL.to_string());
    }
    out
}

fn weather_notes(v: &FeatureVector, crop: CropType) -> Vec<String> {
    let p = profile(crop);
    let mut out = Vec::new();

    let (t_lo, t_hi) = p.temperature;
    if v.temperature < t_lo {
        out.push(format!("Temperature {}°C is below the {t_lo}-{t_hi}°C optimum; growth will slow", v.temperature));
    } else if v.temperature > t_hi {
        out.push(format!("Temperature {}°C is above the {t_lo}-{t_hi}°C optimum; watch for heat stress", v.temperature));
    }

    let (h_lo, h_hi) = p.humidity;
    if v.humidity < h_lo {
        out.push(format!("Humidity {}% is below the {h_lo}-{h_hi}% optimum; monitor soil moisture", v.humidity));
    } else if v.humidity > h_hi {
        out.push(format!("Humidity {}% is above the {h_lo}-{h_hi}% optimum; monitor for disease", v.humidity));
    }

    if out.is_empty() {
        out.push(MAINTAIN_WEATHER.to_string());
    }
    out
}
