//! Zero-mean / unit-variance feature scaling.

use cropcast_core::{DomainResult, FeatureVector};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

pub(crate) const N_FEATURES: usize = FeatureVector::LEN;

/// A scaled row, in canonical feature order.
pub type Row = [f64; N_FEATURES];

/// Per-feature mean and population standard deviation captured at fit time.
///
/// A constant column has its std stored as 1, so it maps to 0 after scaling
/// instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    mean: Row,
    std: Row,
}

impl Scaler {
    pub fn fit(vectors: &[FeatureVector]) -> ModelResult<Self> {
        if vectors.is_empty() {
            return Err(ModelError::training("cannot fit scaler on zero samples"));
        }
        let n = vectors.len() as f64;

        let mut mean = [0.0; N_FEATURES];
        for v in vectors {
            for (m, x) in mean.iter_mut().zip(v.to_array()) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = [0.0; N_FEATURES];
        for v in vectors {
            for (j, x) in v.to_array().into_iter().enumerate() {
                var[j] += (x - mean[j]).powi(2);
            }
        }
        let std = var.map(|s| {
            let sd = (s / n).sqrt();
            if sd > 0.0 && sd.is_finite() { sd } else { 1.0 }
        });

        Ok(Self { mean, std })
    }

    pub fn transform(&self, vector: &FeatureVector) -> Row {
        let raw = vector.to_array();
        core::array::from_fn(|j| (raw[j] - self.mean[j]) / self.std[j])
    }

    /// Like [`Scaler::transform`] but for an unchecked raw slice.
    pub fn transform_slice(&self, values: &[f64]) -> DomainResult<Row> {
        let vector = FeatureVector::from_slice(values)?;
        Ok(self.transform(&vector))
    }

    pub fn mean(&self) -> &Row {
        &self.mean
    }

    pub fn std(&self) -> &Row {
        &self.std
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropcast_core::DomainError;

    fn v(values: [f64; 8]) -> FeatureVector {
        FeatureVector::from_array(values)
    }

    #[test]
    fn transformed_training_columns_have_zero_mean() {
        let data = vec![
            v([5.0, 1.0, 10.0, 10.0, 100.0, 10.0, 500.0, 50.0]),
            v([6.0, 2.0, 20.0, 20.0, 200.0, 20.0, 700.0, 60.0]),
            v([7.0, 3.0, 30.0, 30.0, 300.0, 30.0, 900.0, 70.0]),
        ];
        let scaler = Scaler::fit(&data).unwrap();
        let mut sums = [0.0; 8];
        for row in data.iter().map(|x| scaler.transform(x)) {
            for j in 0..8 {
                sums[j] += row[j];
            }
        }
        for s in sums {
            assert!(s.abs() < 1e-9);
        }
        // population std of {5, 6, 7}
        assert!((scaler.std()[0] - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn constant_column_maps_to_zero() {
        let data = vec![
            v([6.0, 1.0, 10.0, 10.0, 100.0, 10.0, 500.0, 50.0]),
            v([6.0, 2.0, 20.0, 20.0, 200.0, 20.0, 700.0, 60.0]),
        ];
        let scaler = Scaler::fit(&data).unwrap();
        assert_eq!(scaler.std()[0], 1.0);
        assert_eq!(scaler.transform(&data[0])[0], 0.0);
    }

    #[test]
    fn wrong_length_slice_is_a_dimension_error() {
        let scaler = Scaler::fit(&[v([1.0; 8])]).unwrap();
        let err = scaler.transform_slice(&[1.0; 5]).unwrap_err();
        assert_eq!(err, DomainError::Dimension { expected: 8, actual: 5 });
    }

    #[test]
    fn fit_on_empty_input_fails() {
        assert!(matches!(Scaler::fit(&[]), Err(ModelError::Training(_))));
    }
}
