//! Small dense linear-algebra helpers for the linear estimators.

use crate::error::{LearningError, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use tracing::debug;

/// Column means and the centered copy of `x`.
pub(crate) fn center_columns(x: ArrayView2<'_, f64>) -> (Array1<f64>, Array2<f64>) {
    let n = x.nrows().max(1) as f64;
    let means = x.sum_axis(Axis(0)) / n;
    let centered = &x - &means;
    (means, centered)
}

pub(crate) fn mean(y: ArrayView1<'_, f64>) -> f64 {
    if y.is_empty() {
        0.0
    } else {
        y.sum() / y.len() as f64
    }
}

/// Cholesky factorization; `None` if `a` is not positive definite.
fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }
    Some(l)
}

fn cholesky_solve(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();

    // Forward substitution: L * z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * z[j];
        }
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L' * x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (z[i] - sum) / l[[i, i]];
    }
    x
}

/// Solve `(a + jitter * I) x = b` for symmetric positive semi-definite `a`.
///
/// Starts without jitter and escalates it relative to the mean diagonal
/// when the factorization fails, which handles collinear one-hot blocks.
pub(crate) fn solve_spd(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    let mean_diag = (0..n).map(|i| a[[i, i]].abs()).sum::<f64>() / n.max(1) as f64;
    let base = if mean_diag > 0.0 { mean_diag } else { 1.0 };

    let mut jitter = 0.0;
    for attempt in 0..10 {
        let mut regularized = a.clone();
        for i in 0..n {
            regularized[[i, i]] += jitter;
        }
        if let Some(l) = cholesky(&regularized) {
            if attempt > 0 {
                debug!("Normal equations solved with diagonal jitter {:e}", jitter);
            }
            return Ok(cholesky_solve(&l, b));
        }
        jitter = if jitter == 0.0 { base * 1e-10 } else { jitter * 10.0 };
    }

    Err(LearningError::TrainingFailed(
        "normal equations are numerically singular".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_solve_spd() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![2.0, 1.0];
        let x = solve_spd(&a, &b).unwrap();
        // 4x + 2y = 2, 2x + 3y = 1 -> x = 0.5, y = 0
        assert!((x[0] - 0.5).abs() < 1e-12);
        assert!(x[1].abs() < 1e-12);
    }

    #[test]
    fn test_solve_singular_with_jitter() {
        // Two identical columns: any split of the weight works, the result must be finite
        let a = array![[2.0, 2.0], [2.0, 2.0]];
        let b = array![4.0, 4.0];
        let x = solve_spd(&a, &b).unwrap();
        assert!(x.iter().all(|v| v.is_finite()));
        assert!((x[0] + x[1] - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_center_columns() {
        let x = array![[1.0, 10.0], [3.0, 20.0]];
        let (means, centered) = center_columns(x.view());
        assert_eq!(means, array![2.0, 15.0]);
        assert_eq!(centered, array![[-1.0, -5.0], [1.0, 5.0]]);
        assert_eq!(mean(array![1.0, 2.0, 3.0].view()), 2.0);
    }
}
