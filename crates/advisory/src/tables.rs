//! Static agronomic reference tables, one entry per crop.

use cropcast_core::{CropType, GrowthStage};
use serde::{Deserialize, Serialize};

/// Closed interval `(min, max)`.
pub type Band = (f64, f64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaterNeeds {
    Medium,
    #[serde(rename = "Medium-High")]
    MediumHigh,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl WaterNeeds {
    pub fn label(self) -> &'static str {
        match self {
            WaterNeeds::Medium => "Medium",
            WaterNeeds::MediumHigh => "Medium-High",
            WaterNeeds::High => "High",
            WaterNeeds::VeryHigh => "Very High",
        }
    }
}

/// Soil test targets a crop does best in.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SoilPreferences {
    pub ph: Band,
    pub nitrogen: Band,
    pub phosphorus: Band,
    pub potassium: Band,
}

/// Nutrient removal per ton of harvested yield, kg/ha.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NutrientNeeds {
    pub n: f64,
    pub p2o5: f64,
    pub k2o: f64,
}

/// Share of each season's fertilizer applied at one timing window.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StageSplit {
    pub n: f64,
    pub p2o5: f64,
    pub k2o: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CropAdvisoryProfile {
    pub crop: CropType,
    /// Planting and harvest months (1-12).
    pub season: (u32, u32),
    pub water_needs: WaterNeeds,
    pub fertilizers: [[&'static str; 2]; 4],
    pub pests: [&'static str; 3],
    pub temperature: Band,
    pub humidity: Band,
    pub soil: SoilPreferences,
    pub needs_per_ton: NutrientNeeds,
    /// Pre-plant, early, mid and late growth splits.
    pub splits: [StageSplit; 4],
    pub harvest_checks: [&'static str; 4],
    pub soil_notes: [&'static str; 2],
}

impl CropAdvisoryProfile {
    pub fn fertilizers_for(&self, stage: GrowthStage) -> &[&'static str; 2] {
        &self.fertilizers[stage_index(stage)]
    }
}

pub(crate) fn stage_index(stage: GrowthStage) -> usize {
    match stage {
        GrowthStage::Seedling => 0,
        GrowthStage::Vegetative => 1,
        GrowthStage::Flowering => 2,
        GrowthStage::Maturity => 3,
    }
}

const fn split(n: f64, p2o5: f64, k2o: f64) -> StageSplit {
    StageSplit { n, p2o5, k2o }
}

static WHEAT: CropAdvisoryProfile = CropAdvisoryProfile {
    crop: CropType::Wheat,
    season: (10, 6),
    water_needs: WaterNeeds::Medium,
    fertilizers: [
        ["Phosphorus-rich starter", "Light nitrogen"],
        ["High nitrogen", "Potassium"],
        ["Balanced NPK", "Micronutrients"],
        ["Minimal fertilizer", "Potassium boost"],
    ],
    pests: ["Aphids", "Wheat rust", "Armyworms"],
    temperature: (15.0, 25.0),
    humidity: (50.0, 70.0),
    soil: SoilPreferences {
        ph: (6.0, 7.0),
        nitrogen: (25.0, 45.0),
        phosphorus: (20.0, 40.0),
        potassium: (120.0, 200.0),
    },
    needs_per_ton: NutrientNeeds {
        n: 25.0,
        p2o5: 12.0,
        k2o: 20.0,
    },
    splits: [
        split(0.3, 1.0, 0.5),
        split(0.4, 0.0, 0.3),
        split(0.3, 0.0, 0.2),
        split(0.0, 0.0, 0.0),
    ],
    harvest_checks: [
        "Check grain moisture content (target: 12-14% for storage)",
        "Test grain hardness and protein content",
        "Monitor weather forecasts for dry harvest conditions",
        "Prepare combine harvester and grain storage facilities",
    ],
    soil_notes: [
        "Monitor sulfur levels for protein development",
        "Ensure good soil structure for root development",
    ],
};

static CORN: CropAdvisoryProfile = CropAdvisoryProfile {
    crop: CropType::Corn,
    season: (4, 10),
    water_needs: WaterNeeds::High,
    fertilizers: [
        ["Starter fertilizer", "Phosphorus"],
        ["Heavy nitrogen", "Side-dress application"],
        ["Balanced fertilizer", "Zinc supplement"],
        ["Minimal nitrogen", "Potassium"],
    ],
    pests: ["Corn borer", "Rootworm", "Fall armyworm"],
    temperature: (20.0, 30.0),
    humidity: (60.0, 80.0),
    soil: SoilPreferences {
        ph: (6.0, 6.8),
        nitrogen: (30.0, 60.0),
        phosphorus: (25.0, 45.0),
        potassium: (150.0, 250.0),
    },
    needs_per_ton: NutrientNeeds {
        n: 22.0,
        p2o5: 10.0,
        k2o: 18.0,
    },
    splits: [
        split(0.2, 1.0, 0.4),
        split(0.3, 0.0, 0.3),
        split(0.5, 0.0, 0.3),
        split(0.0, 0.0, 0.0),
    ],
    harvest_checks: [
        "Monitor grain moisture (target: 15-20% for field drying)",
        "Check for black layer formation at kernel base",
        "Assess stalk strength to prevent lodging",
        "Prepare for grain drying if moisture is high",
    ],
    soil_notes: [
        "Ensure adequate drainage for corn production",
        "Plan for high nitrogen requirements during vegetative growth",
    ],
};

static RICE: CropAdvisoryProfile = CropAdvisoryProfile {
    crop: CropType::Rice,
    season: (5, 10),
    water_needs: WaterNeeds::VeryHigh,
    fertilizers: [
        ["Nitrogen-phosphorus", "Transplanting fertilizer"],
        ["Split nitrogen application", "Potassium"],
        ["Panicle initiation fertilizer", "Micronutrients"],
        ["Final potassium", "Harvest preparation"],
    ],
    pests: ["Rice blast", "Brown planthopper", "Stem borer"],
    temperature: (25.0, 35.0),
    humidity: (70.0, 90.0),
    soil: SoilPreferences {
        ph: (5.5, 6.5),
        nitrogen: (20.0, 40.0),
        phosphorus: (15.0, 30.0),
        potassium: (100.0, 180.0),
    },
    needs_per_ton: NutrientNeeds {
        n: 20.0,
        p2o5: 8.0,
        k2o: 15.0,
    },
    splits: [
        split(0.4, 1.0, 0.5),
        split(0.3, 0.0, 0.0),
        split(0.3, 0.0, 0.5),
        split(0.0, 0.0, 0.0),
    ],
    harvest_checks: [
        "Check grain filling and color change",
        "Monitor panicle moisture content",
        "Plan for proper field drying before threshing",
        "Prepare threshing and winnowing equipment",
    ],
    soil_notes: [
        "Ensure proper water management for paddy conditions",
        "Monitor for anaerobic soil conditions",
    ],
};

static SOYBEAN: CropAdvisoryProfile = CropAdvisoryProfile {
    crop: CropType::Soybean,
    season: (5, 9),
    water_needs: WaterNeeds::MediumHigh,
    fertilizers: [
        ["Starter phosphorus", "Inoculant"],
        ["Light nitrogen", "Potassium"],
        ["Calcium", "Boron supplement"],
        ["Final potassium", "Harvest timing"],
    ],
    pests: ["Soybean aphid", "Bean leaf beetle", "White mold"],
    temperature: (20.0, 28.0),
    humidity: (55.0, 75.0),
    soil: SoilPreferences {
        ph: (6.0, 7.0),
        nitrogen: (15.0, 30.0),
        phosphorus: (20.0, 35.0),
        potassium: (120.0, 220.0),
    },
    needs_per_ton: NutrientNeeds {
        n: 5.0,
        p2o5: 8.0,
        k2o: 12.0,
    },
    splits: [
        split(0.5, 1.0, 0.6),
        split(0.3, 0.0, 0.2),
        split(0.2, 0.0, 0.2),
        split(0.0, 0.0, 0.0),
    ],
    harvest_checks: [
        "Check pod color and rattle test",
        "Monitor grain moisture (target: 13-15% for storage)",
        "Assess plant maturity uniformity across field",
        "Prepare combine settings for soybean harvest",
    ],
    soil_notes: [
        "Consider inoculation with Rhizobia bacteria for nitrogen fixation",
        "Monitor calcium levels for pod development",
    ],
};

pub fn profile(crop: CropType) -> &'static CropAdvisoryProfile {
    match crop {
        CropType::Wheat => &WHEAT,
        CropType::Corn => &CORN,
        CropType::Rice => &RICE,
        CropType::Soybean => &SOYBEAN,
    }
}

/// Fertilizer application timing per stage.
pub fn fertilizer_timing(stage: GrowthStage) -> &'static str {
    match stage {
        GrowthStage::Seedling => "At planting or within 2 weeks of emergence",
        GrowthStage::Vegetative => "Every 3-4 weeks during active growth",
        GrowthStage::Flowering => "At flower initiation and early flowering",
        GrowthStage::Maturity => "Final application before grain filling",
    }
}
