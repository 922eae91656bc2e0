//! Nutrient budget for a target yield, split into application windows and costed.

use cropcast_core::{CropType, DomainError, DomainResult, FeatureVector};
use serde::{Deserialize, Serialize};

use crate::tables::profile;

/// Soil P (ppm) to P2O5 and soil K (ppm) to K2O conversion factors.
const P_TO_P2O5: f64 = 2.29;
const K_TO_K2O: f64 = 1.2;

/// Share of the soil test value counted as plant-available this season.
const N_AVAILABILITY: f64 = 0.5;
const P_AVAILABILITY: f64 = 0.3;
const K_AVAILABILITY: f64 = 0.8;

/// USD per kg of nutrient.
const N_PRICE: f64 = 1.20;
const P2O5_PRICE: f64 = 1.50;
const K2O_PRICE: f64 = 0.80;

pub const CURRENCY: &str = "USD";

const WINDOWS: [(&str, &str); 4] = [
    ("pre_plant", "Before planting or at planting"),
    ("early_growth", "2-4 weeks after emergence"),
    ("mid_growth", "6-8 weeks after emergence"),
    ("late_growth", "Before reproductive stage"),
];

/// kg/ha of N, P2O5 and K2O.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientAmounts {
    pub n: f64,
    pub p2o5: f64,
    pub k2o: f64,
}

impl NutrientAmounts {
    fn rounded(self) -> Self {
        Self {
            n: round_to(self.n, 1),
            p2o5: round_to(self.p2o5, 1),
            k2o: round_to(self.k2o, 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub window: String,
    pub timing: String,
    pub amounts: NutrientAmounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub n: f64,
    pub p2o5: f64,
    pub k2o: f64,
    pub total: f64,
    pub per_hectare: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerPlan {
    pub crop: CropType,
    pub target_yield: f64,
    /// Crop uptake for the target yield.
    pub total_needs: NutrientAmounts,
    /// Nutrient already supplied by the soil.
    pub soil_supply: NutrientAmounts,
    /// Fertilizer to apply after the soil credit, never negative.
    pub required: NutrientAmounts,
    pub schedule: Vec<Application>,
    pub cost: CostEstimate,
}

/// Build a fertilizer plan for reaching `target_yield` t/ha of `crop` on soil `v`.
pub fn fertilizer_plan(v: &FeatureVector, crop: CropType, target_yield: f64) -> DomainResult<FertilizerPlan> {
    if !target_yield.is_finite() || target_yield <= 0.0 {
        return Err(DomainError::validation(format!(
            "target_yield must be a positive number, got {target_yield}"
        )));
    }

    let p = profile(crop);
    let total_needs = NutrientAmounts {
        n: p.needs_per_ton.n * target_yield,
        p2o5: p.needs_per_ton.p2o5 * target_yield,
        k2o: p.needs_per_ton.k2o * target_yield,
    };
    let soil_supply = NutrientAmounts {
        n: v.nitrogen * N_AVAILABILITY,
        p2o5: v.phosphorus * P_TO_P2O5 * P_AVAILABILITY,
        k2o: v.potassium * K_TO_K2O * K_AVAILABILITY,
    };
    let required = NutrientAmounts {
        n: (total_needs.n - soil_supply.n).max(0.0),
        p2o5: (total_needs.p2o5 - soil_supply.p2o5).max(0.0),
        k2o: (total_needs.k2o - soil_supply.k2o).max(0.0),
    }
    .rounded();

    let schedule = WINDOWS
        .iter()
        .zip(&p.splits)
        .map(|((window, timing), split)| Application {
            window: window.to_string(),
            timing: timing.to_string(),
            amounts: NutrientAmounts {
                n: required.n * split.n,
                p2o5: required.p2o5 * split.p2o5,
                k2o: required.k2o * split.k2o,
            }
            .rounded(),
        })
        .collect();

    let cost_n = round_to(required.n * N_PRICE, 2);
    let cost_p = round_to(required.p2o5 * P2O5_PRICE, 2);
    let cost_k = round_to(required.k2o * K2O_PRICE, 2);
    let total = round_to(cost_n + cost_p + cost_k, 2);
    let cost = CostEstimate {
        n: cost_n,
        p2o5: cost_p,
        k2o: cost_k,
        total,
        per_hectare: total,
        currency: CURRENCY.to_string(),
    };

    Ok(FertilizerPlan {
        crop,
        target_yield,
        total_needs: total_needs.rounded(),
        soil_supply: soil_supply.rounded(),
        required,
        schedule,
        cost,
    })
}

fn round_to(x: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (x * f).round() / f
}
