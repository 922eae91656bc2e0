//! Ordinary least squares via the normal equations.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::scaler::{N_FEATURES, Row};

/// Added to the coefficient diagonal of `XᵀX` (not the intercept) so a
/// constant column does not make the system singular.
const RIDGE: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    intercept: f64,
    coefficients: Row,
}

impl LinearRegression {
    /// Solve `(XᵀX) β = Xᵀy` with an intercept column, using Cholesky.
    ///
    /// Requires at least `features + 1` rows.
    pub fn fit(rows: &[Row], targets: &[f64]) -> ModelResult<Self> {
        const P: usize = N_FEATURES + 1;
        if rows.len() != targets.len() {
            return Err(ModelError::training("feature rows and targets differ in length"));
        }
        if rows.len() < P {
            return Err(ModelError::training(format!(
                "linear regression needs at least {P} samples, got {}",
                rows.len()
            )));
        }

        let mut xtx = [[0.0; P]; P];
        let mut xty = [0.0; P];
        for (row, &y) in rows.iter().zip(targets) {
            let x = augmented(row);
            for i in 0..P {
                xty[i] += x[i] * y;
                for j in 0..=i {
                    xtx[i][j] += x[i] * x[j];
                }
            }
        }
        for i in 0..P {
            for j in 0..i {
                xtx[j][i] = xtx[i][j];
            }
        }
        for (i, r) in xtx.iter_mut().enumerate().skip(1) {
            r[i] += RIDGE * rows.len() as f64;
        }

        let beta = cholesky_solve(&xtx, &xty)?;
        Ok(Self {
            intercept: beta[0],
            coefficients: core::array::from_fn(|j| beta[j + 1]),
        })
    }

    pub fn predict(&self, row: &Row) -> f64 {
        self.intercept + self.coefficients.iter().zip(row).map(|(b, x)| b * x).sum::<f64>()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &Row {
        &self.coefficients
    }
}

fn augmented(row: &Row) -> [f64; N_FEATURES + 1] {
    core::array::from_fn(|i| if i == 0 { 1.0 } else { row[i - 1] })
}

fn cholesky_solve<const P: usize>(a: &[[f64; P]; P], b: &[f64; P]) -> ModelResult<[f64; P]> {
    let mut l = [[0.0; P]; P];
    for i in 0..P {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[i][k] * l[j][k]).sum();
            if i == j {
                let diag = a[i][i] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return Err(ModelError::training("normal equations are not positive definite"));
                }
                l[i][i] = diag.sqrt();
            } else {
                l[i][j] = (a[i][j] - sum) / l[j][j];
            }
        }
    }

    // L y = b
    let mut y = [0.0; P];
    for i in 0..P {
        let sum: f64 = (0..i).map(|k| l[i][k] * y[k]).sum();
        y[i] = (b[i] - sum) / l[i][i];
    }
    // Lᵀ x = y
    let mut x = [0.0; P];
    for i in (0..P).rev() {
        let sum: f64 = (i + 1..P).map(|k| l[k][i] * x[k]).sum();
        x[i] = (y[i] - sum) / l[i][i];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pseudo_row(i: usize) -> Row {
        core::array::from_fn(|j| ((i * (j + 3) * 7919 + j * 131) % 101) as f64 / 10.0)
    }

    #[test]
    fn recovers_exact_linear_relationship() {
        let rows: Vec<Row> = (0..60).map(pseudo_row).collect();
        let truth = [0.5, -1.0, 2.0, 0.25, 0.0, 0.1, 3.0, -2.0];
        let targets: Vec<f64> = rows
            .iter()
            .map(|r| 4.0 + r.iter().zip(&truth).map(|(x, b)| x * b).sum::<f64>())
            .collect();

        let model = LinearRegression::fit(&rows, &targets).unwrap();
        assert!((model.intercept() - 4.0).abs() < 1e-3);
        for (b, t) in model.coefficients().iter().zip(truth) {
            assert!((b - t).abs() < 1e-3, "coef {b} vs {t}");
        }
    }

    #[test]
    fn constant_column_does_not_break_the_solve() {
        let rows: Vec<Row> = (0..30)
            .map(|i| {
                let mut r = pseudo_row(i);
                r[1] = 0.0;
                r
            })
            .collect();
        let targets: Vec<f64> = rows.iter().map(|r| 1.0 + 2.0 * r[0]).collect();
        let model = LinearRegression::fit(&rows, &targets).unwrap();
        assert!((model.predict(&rows[10]) - targets[10]).abs() < 1e-4);
        assert!(model.coefficients()[1].abs() < 1e-9);
    }

    #[test]
    fn too_few_rows_is_a_training_error() {
        let rows = vec![[1.0; N_FEATURES]; 5];
        let err = LinearRegression::fit(&rows, &[1.0; 5]).unwrap_err();
        assert!(matches!(err, ModelError::Training(_)));
    }
}
