use cropcast_core::{CropType, DomainError, DomainResult, FeatureVector};
use serde::{Deserialize, Serialize};

/// One labeled observation: field conditions and the yield they produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    features: FeatureVector,
    crop: CropType,
    yield_t_ha: f64,
}

impl TrainingSample {
    pub fn new(features: FeatureVector, crop: CropType, yield_t_ha: f64) -> DomainResult<Self> {
        if !yield_t_ha.is_finite() || yield_t_ha < 0.0 {
            return Err(DomainError::validation(format!(
                "yield must be a finite non-negative number, got {yield_t_ha}"
            )));
        }
        Ok(Self {
            features,
            crop,
            yield_t_ha,
        })
    }

    pub fn features(&self) -> &FeatureVector {
        &self.features
    }

    pub fn crop(&self) -> CropType {
        self.crop
    }

    /// Yield in tons per hectare.
    pub fn yield_t_ha(&self) -> f64 {
        self.yield_t_ha
    }
}
