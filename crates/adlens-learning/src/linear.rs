//! Linear estimators: ordinary least squares, ridge and lasso.
//!
//! All three fit an intercept by centering `x` and `y`, solve for the
//! coefficients on centered data and recover the intercept as
//! `mean(y) - mean(x) · w`.

use crate::error::{LearningError, Result};
use crate::linalg::{center_columns, mean, solve_spd};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Fitted linear model `y = x · coefficients + intercept`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    /// Ordinary least squares.
    ///
    /// Rank-deficient designs (e.g. a full one-hot block next to the
    /// intercept) are solved with a minimal diagonal jitter.
    pub fn fit_ols(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<Self> {
        Self::fit_ridge(x, y, 0.0)
    }

    /// Ridge regression minimizing `||y - Xw||² + alpha ||w||²`.
    pub fn fit_ridge(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, alpha: f64) -> Result<Self> {
        if alpha < 0.0 || !alpha.is_finite() {
            return Err(LearningError::InvalidConfig(format!(
                "ridge alpha must be a non-negative number, got {}",
                alpha
            )));
        }

        let (x_mean, xc) = center_columns(x);
        let y_mean = mean(y);
        let yc = y.mapv(|v| v - y_mean);

        let mut xtx = xc.t().dot(&xc);
        for i in 0..xtx.nrows() {
            xtx[[i, i]] += alpha;
        }
        let xty = xc.t().dot(&yc);

        let w = solve_spd(&xtx, &xty)?;
        let intercept = y_mean - x_mean.dot(&w);

        Ok(Self {
            coefficients: w.to_vec(),
            intercept,
        })
    }

    /// Lasso by cyclic coordinate descent on
    /// `(1 / 2n) ||y - Xw||² + alpha ||w||₁`.
    pub fn fit_lasso(
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        alpha: f64,
        max_iter: usize,
        tolerance: f64,
    ) -> Result<Self> {
        if alpha < 0.0 || !alpha.is_finite() {
            return Err(LearningError::InvalidConfig(format!(
                "lasso alpha must be a non-negative number, got {}",
                alpha
            )));
        }

        let n = x.nrows() as f64;
        let p = x.ncols();
        let (x_mean, xc) = center_columns(x);
        let y_mean = mean(y);

        let col_sq: Vec<f64> = xc.columns().into_iter().map(|c| c.dot(&c) / n).collect();
        let mut w = Array1::<f64>::zeros(p);
        let mut residual = y.mapv(|v| v - y_mean);

        let mut converged = false;
        for iter in 0..max_iter {
            let mut max_delta: f64 = 0.0;
            let mut max_weight: f64 = 0.0;

            for j in 0..p {
                if col_sq[j] == 0.0 {
                    continue;
                }
                let column = xc.column(j);
                let old = w[j];
                let rho = column.dot(&residual) / n + col_sq[j] * old;
                let new = soft_threshold(rho, alpha) / col_sq[j];

                if new != old {
                    residual.scaled_add(old - new, &column);
                    w[j] = new;
                }
                max_delta = max_delta.max((new - old).abs());
                max_weight = max_weight.max(new.abs());
            }

            if max_weight == 0.0 || max_delta / max_weight < tolerance {
                debug!("Lasso converged after {} iteration(s)", iter + 1);
                converged = true;
                break;
            }
        }
        if !converged {
            warn!(
                "Lasso did not converge within {} iterations; using the last estimate",
                max_iter
            );
        }

        let intercept = y_mean - x_mean.dot(&w);
        Ok(Self {
            coefficients: w.to_vec(),
            intercept,
        })
    }
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};

    fn line_data() -> (Array2<f64>, Array1<f64>) {
        // y = 3 x0 - 2 x1 + 5
        let x = array![
            [1.0, 0.0],
            [2.0, 1.0],
            [3.0, 0.5],
            [4.0, 2.0],
            [5.0, 1.5],
            [6.0, 3.0]
        ];
        let y = x.rows().into_iter().map(|r| 3.0 * r[0] - 2.0 * r[1] + 5.0).collect();
        (x, y)
    }

    #[test]
    fn test_ols_recovers_exact_line() {
        let (x, y) = line_data();
        let model = LinearModel::fit_ols(x.view(), y.view()).unwrap();
        assert!((model.coefficients[0] - 3.0).abs() < 1e-8);
        assert!((model.coefficients[1] + 2.0).abs() < 1e-8);
        assert!((model.intercept - 5.0).abs() < 1e-8);
        assert!((model.predict_row(&[10.0, 1.0]) - 33.0).abs() < 1e-6);
    }

    #[test]
    fn test_ridge_shrinks_coefficients() {
        let (x, y) = line_data();
        let ols = LinearModel::fit_ols(x.view(), y.view()).unwrap();
        let ridge = LinearModel::fit_ridge(x.view(), y.view(), 10.0).unwrap();
        let norm = |m: &LinearModel| m.coefficients.iter().map(|w| w * w).sum::<f64>();
        assert!(norm(&ridge) < norm(&ols));
    }

    #[test]
    fn test_ridge_rejects_negative_alpha() {
        let (x, y) = line_data();
        assert!(matches!(
            LinearModel::fit_ridge(x.view(), y.view(), -1.0),
            Err(LearningError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_lasso_zero_alpha_matches_ols() {
        let (x, y) = line_data();
        let lasso = LinearModel::fit_lasso(x.view(), y.view(), 0.0, 10_000, 1e-10).unwrap();
        assert!((lasso.coefficients[0] - 3.0).abs() < 1e-4);
        assert!((lasso.coefficients[1] + 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_lasso_large_alpha_zeroes_weights() {
        let (x, y) = line_data();
        let lasso = LinearModel::fit_lasso(x.view(), y.view(), 1e6, 1000, 1e-4).unwrap();
        assert!(lasso.coefficients.iter().all(|w| *w == 0.0));
        // Intercept falls back to the target mean
        let y_mean = y.sum() / y.len() as f64;
        assert!((lasso.intercept - y_mean).abs() < 1e-12);
    }

    #[test]
    fn test_soft_threshold() {
        assert_eq!(soft_threshold(3.0, 1.0), 2.0);
        assert_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
    }
}
