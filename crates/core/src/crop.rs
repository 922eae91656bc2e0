//! Supported crops and growth stages.
//!
//! Crops form a closed set: every per-crop table in the workspace (models,
//! rule tables, artifact paths) is keyed by [`CropType`], and names coming
//! from the outside world are validated here once.

use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// A crop with its own yield model and rule tables.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CropType {
    Wheat,
    Corn,
    Rice,
    Soybean,
}

impl CropType {
    pub const ALL: [CropType; 4] = [CropType::Wheat, CropType::Corn, CropType::Rice, CropType::Soybean];

    /// Stable lowercase key used for artifact names and URLs.
    pub fn slug(self) -> &'static str {
        match self {
            CropType::Wheat => "wheat",
            CropType::Corn => "corn",
            CropType::Rice => "rice",
            CropType::Soybean => "soybean",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CropType::Wheat => "Wheat",
            CropType::Corn => "Corn",
            CropType::Rice => "Rice",
            CropType::Soybean => "Soybean",
        }
    }
}

impl core::fmt::Display for CropType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for CropType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wheat" => Ok(CropType::Wheat),
            "corn" | "maize" => Ok(CropType::Corn),
            "rice" => Ok(CropType::Rice),
            "soybean" | "soybeans" => Ok(CropType::Soybean),
            _ => Err(DomainError::unknown_crop(s)),
        }
    }
}

impl Serialize for CropType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.slug())
    }
}

impl<'de> Deserialize<'de> for CropType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Phenological stage used by the advisory tables.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GrowthStage {
    Seedling,
    Vegetative,
    Flowering,
    Maturity,
}

impl GrowthStage {
    pub const ALL: [GrowthStage; 4] = [
        GrowthStage::Seedling,
        GrowthStage::Vegetative,
        GrowthStage::Flowering,
        GrowthStage::Maturity,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            GrowthStage::Seedling => "seedling",
            GrowthStage::Vegetative => "vegetative",
            GrowthStage::Flowering => "flowering",
            GrowthStage::Maturity => "maturity",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            GrowthStage::Seedling => "Seedling",
            GrowthStage::Vegetative => "Vegetative",
            GrowthStage::Flowering => "Flowering",
            GrowthStage::Maturity => "Maturity",
        }
    }
}

impl core::fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for GrowthStage {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seedling" => Ok(GrowthStage::Seedling),
            "vegetative" => Ok(GrowthStage::Vegetative),
            "flowering" => Ok(GrowthStage::Flowering),
            "maturity" => Ok(GrowthStage::Maturity),
            _ => Err(DomainError::UnknownStage(s.to_string())),
        }
    }
}

impl Serialize for GrowthStage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.slug())
    }
}

impl<'de> Deserialize<'de> for GrowthStage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_names_parse_case_insensitively() {
        assert_eq!("WHEAT".parse::<CropType>().unwrap(), CropType::Wheat);
        assert_eq!(" corn ".parse::<CropType>().unwrap(), CropType::Corn);
        assert_eq!("Soybeans".parse::<CropType>().unwrap(), CropType::Soybean);
    }

    #[test]
    fn unknown_crop_is_a_domain_error() {
        let err = "barley".parse::<CropType>().unwrap_err();
        assert_eq!(err, DomainError::UnknownCrop("barley".to_string()));
    }

    #[test]
    fn slug_round_trips_for_every_crop() {
        for crop in CropType::ALL {
            assert_eq!(crop.slug().parse::<CropType>().unwrap(), crop);
        }
    }

    #[test]
    fn crop_serializes_as_slug() {
        let json = serde_json::to_string(&CropType::Soybean).unwrap();
        assert_eq!(json, "\"soybean\"");
        let back: CropType = serde_json::from_str("\"Rice\"").unwrap();
        assert_eq!(back, CropType::Rice);
    }

    #[test]
    fn stage_parse_rejects_unknown_names() {
        assert_eq!("Flowering".parse::<GrowthStage>().unwrap(), GrowthStage::Flowering);
        assert!(matches!("tillering".parse::<GrowthStage>(), Err(DomainError::UnknownStage(_))));
    }
}
