use serde::{Deserialize, Serialize};

/// Mean absolute error. Returns 0 for empty input.
pub fn mae(predicted: &[f64], actual: &[f64]) -> f64 {
    if predicted.is_empty() {
        return 0.0;
    }
    let total: f64 = predicted.iter().zip(actual).map(|(p, a)| (p - a).abs()).sum();
    total / predicted.len() as f64
}

/// Coefficient of determination.
///
/// With constant targets this is 1 for a perfect fit and 0 otherwise.
pub fn r2(predicted: &[f64], actual: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = predicted.iter().zip(actual).map(|(p, a)| (a - p).powi(2)).sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    pub fn evaluate(predicted: &[f64], actual: &[f64]) -> Self {
        Self {
            mae: mae(predicted, actual),
            r2: r2(predicted, actual),
        }
    }
}

/// Held-out metrics for both ensemble members and the blend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub forest: RegressionMetrics,
    pub linear: RegressionMetrics,
    pub ensemble: RegressionMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let y = [1.0, 2.0, 3.0];
        assert_eq!(mae(&y, &y), 0.0);
        assert_eq!(r2(&y, &y), 1.0);
    }

    #[test]
    fn mean_prediction_has_zero_r2() {
        let y = [1.0, 2.0, 3.0];
        let m = RegressionMetrics::evaluate(&[2.0, 2.0, 2.0], &y);
        assert!((m.mae - 2.0 / 3.0).abs() < 1e-12);
        assert!(m.r2.abs() < 1e-12);
    }

    #[test]
    fn constant_targets() {
        assert_eq!(r2(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(r2(&[4.0, 5.0], &[5.0, 5.0]), 0.0);
    }
}
