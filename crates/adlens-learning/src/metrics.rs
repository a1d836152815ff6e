//! Held-out regression metrics.

use serde::{Deserialize, Serialize};

/// R², RMSE and MAE of a set of predictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Coefficient of determination.
    pub r2: f64,
    /// Root mean squared error; the selection criterion.
    pub rmse: f64,
    /// Mean absolute error.
    pub mae: f64,
}

impl RegressionMetrics {
    /// Compare `predicted` against `actual` element-wise.
    ///
    /// A constant target gives `r2 = 1` for a perfect fit and `0`
    /// otherwise. Empty input yields NaN for every metric.
    pub fn calculate(actual: &[f64], predicted: &[f64]) -> Self {
        let n = actual.len().min(predicted.len());
        if n == 0 {
            return Self {
                r2: f64::NAN,
                rmse: f64::NAN,
                mae: f64::NAN,
            };
        }

        let actual = &actual[..n];
        let predicted = &predicted[..n];
        let mean = actual.iter().sum::<f64>() / n as f64;

        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        let mut abs_sum = 0.0;
        for (a, p) in actual.iter().zip(predicted) {
            let err = a - p;
            ss_res += err * err;
            ss_tot += (a - mean) * (a - mean);
            abs_sum += err.abs();
        }

        let r2 = if ss_tot == 0.0 {
            if ss_res == 0.0 { 1.0 } else { 0.0 }
        } else {
            1.0 - ss_res / ss_tot
        };

        Self {
            r2,
            rmse: (ss_res / n as f64).sqrt(),
            mae: abs_sum / n as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_fit() {
        let m = RegressionMetrics::calculate(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert_eq!(m.r2, 1.0);
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.mae, 0.0);
    }

    #[test]
    fn test_known_values() {
        let m = RegressionMetrics::calculate(&[1.0, 2.0, 3.0, 4.0], &[2.0, 2.0, 3.0, 2.0]);
        // errors: -1, 0, 0, 2
        assert!((m.rmse - (5.0f64 / 4.0).sqrt()).abs() < 1e-12);
        assert!((m.mae - 0.75).abs() < 1e-12);
        // ss_tot = 5, ss_res = 5
        assert!(m.r2.abs() < 1e-12);
    }

    #[test]
    fn test_constant_target() {
        let m = RegressionMetrics::calculate(&[2.0, 2.0], &[2.0, 3.0]);
        assert_eq!(m.r2, 0.0);
    }

    #[test]
    fn test_empty_is_nan() {
        assert!(RegressionMetrics::calculate(&[], &[]).rmse.is_nan());
    }
}
