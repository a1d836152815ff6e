//! Gradient boosting with squared-error loss on smartcore regression trees.
//!
//! The ensemble starts from the target mean. Each round fits a
//! [`DecisionTreeRegressor`] to the current residuals and adds its output
//! scaled by `learning_rate`.

use crate::error::{LearningError, Result};
use crate::linalg::mean;
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};
use std::sync::Arc;
use tracing::debug;

type BoostedTree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Gradient boosting hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_rounds: 100,
            learning_rate: 0.3,
            max_depth: 6,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Additive tree ensemble fitted on residuals.
///
/// Fitted trees are shared behind an `Arc`, so cloning a bundle does not
/// copy the ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    pub n_features: usize,
    pub base_score: f64,
    pub learning_rate: f64,
    trees: Arc<Vec<BoostedTree>>,
}

impl GradientBoosting {
    /// # Errors
    ///
    /// Returns [`LearningError::TrainingFailed`] if smartcore rejects the
    /// matrix or a round's tree cannot be fitted.
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        params: &BoostingParams,
    ) -> Result<Self> {
        let matrix = dense_matrix(x).map_err(LearningError::TrainingFailed)?;
        let base_score = mean(y);
        let tree_params = DecisionTreeRegressorParameters::default()
            .with_max_depth(params.max_depth)
            .with_min_samples_split(params.min_samples_split)
            .with_min_samples_leaf(params.min_samples_leaf);

        let mut predictions = vec![base_score; x.nrows()];
        let mut trees = Vec::with_capacity(params.n_rounds);

        for round in 1..=params.n_rounds {
            let residuals: Vec<f64> = y
                .iter()
                .zip(&predictions)
                .map(|(target, current)| target - current)
                .collect();

            let tree = BoostedTree::fit(&matrix, &residuals, tree_params.clone()).map_err(|e| {
                LearningError::TrainingFailed(format!("boosting round {}: {:?}", round, e))
            })?;
            let step = tree.predict(&matrix).map_err(|e| {
                LearningError::TrainingFailed(format!("boosting round {}: {:?}", round, e))
            })?;

            for (current, delta) in predictions.iter_mut().zip(step) {
                *current += params.learning_rate * delta;
            }
            trees.push(tree);
        }

        let sse: f64 = y
            .iter()
            .zip(&predictions)
            .map(|(target, current)| (target - current).powi(2))
            .sum();
        debug!(
            "Gradient boosting: {} rounds, final training RMSE {:.4}",
            trees.len(),
            (sse / x.nrows().max(1) as f64).sqrt()
        );

        Ok(Self {
            n_features: x.ncols(),
            base_score,
            learning_rate: params.learning_rate,
            trees: Arc::new(trees),
        })
    }

    /// Predict every row of `x` with one pass per tree.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InferenceError`] if smartcore fails on the
    /// matrix.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        if x.nrows() == 0 {
            return Ok(Vec::new());
        }
        let matrix = dense_matrix(x).map_err(LearningError::InferenceError)?;

        let mut output = vec![self.base_score; x.nrows()];
        for tree in self.trees.iter() {
            let step = tree
                .predict(&matrix)
                .map_err(|e| LearningError::InferenceError(format!("{:?}", e)))?;
            for (value, delta) in output.iter_mut().zip(step) {
                *value += self.learning_rate * delta;
            }
        }
        Ok(output)
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        let x = ArrayView2::from_shape((1, row.len()), row)
            .map_err(|e| LearningError::InferenceError(e.to_string()))?;
        let output = self.predict(x)?;
        Ok(output.first().copied().unwrap_or(self.base_score))
    }

    pub fn n_rounds(&self) -> usize {
        self.trees.len()
    }

    /// Reject a deserialized ensemble with no trees or a non-finite
    /// starting point.
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(LearningError::InvalidBundle(
                "gradient boosting ensemble has no trees".to_string(),
            ));
        }
        if !self.base_score.is_finite() || !self.learning_rate.is_finite() {
            return Err(LearningError::InvalidBundle(
                "gradient boosting base score and learning rate must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

fn dense_matrix(x: ArrayView2<'_, f64>) -> std::result::Result<DenseMatrix<f64>, String> {
    let rows: Vec<Vec<f64>> = x.rows().into_iter().map(|row| row.to_vec()).collect();
    DenseMatrix::from_2d_vec(&rows).map_err(|e| format!("failed to build feature matrix: {:?}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn wave() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((30, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(30, |i| (i as f64 / 3.0).sin() * 10.0);
        (x, y)
    }

    fn sse(model: &GradientBoosting, x: &Array2<f64>, y: &Array1<f64>) -> f64 {
        model
            .predict(x.view())
            .unwrap()
            .iter()
            .zip(y.iter())
            .map(|(p, t)| (p - t).powi(2))
            .sum()
    }

    #[test]
    fn test_boosting_reduces_error() {
        let (x, y) = wave();
        let few = GradientBoosting::fit(
            x.view(),
            y.view(),
            &BoostingParams {
                n_rounds: 1,
                ..Default::default()
            },
        )
        .unwrap();
        let many = GradientBoosting::fit(x.view(), y.view(), &BoostingParams::default()).unwrap();

        assert!(sse(&many, &x, &y) < sse(&few, &x, &y));
        assert_eq!(many.n_rounds(), 100);
    }

    #[test]
    fn test_row_and_batch_agree() {
        let (x, y) = wave();
        let params = BoostingParams {
            n_rounds: 10,
            ..Default::default()
        };
        let model = GradientBoosting::fit(x.view(), y.view(), &params).unwrap();

        let batch = model.predict(x.view()).unwrap();
        for (i, row) in x.rows().into_iter().enumerate() {
            let single = model.predict_row(&row.to_vec()).unwrap();
            assert!((single - batch[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_rounds_predicts_mean() {
        let x = Array2::from_shape_fn((4, 1), |(i, _)| i as f64);
        let y = Array1::from(vec![1.0, 2.0, 3.0, 6.0]);
        let model = GradientBoosting::fit(
            x.view(),
            y.view(),
            &BoostingParams {
                n_rounds: 0,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(model.predict_row(&[10.0]).unwrap(), 3.0);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip_keeps_predictions() {
        let (x, y) = wave();
        let params = BoostingParams {
            n_rounds: 5,
            ..Default::default()
        };
        let model = GradientBoosting::fit(x.view(), y.view(), &params).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let back: GradientBoosting = serde_json::from_str(&json).unwrap();
        assert_eq!(back.n_rounds(), 5);
        let before = model.predict_row(&[12.0]).unwrap();
        let after = back.predict_row(&[12.0]).unwrap();
        assert!((before - after).abs() < 1e-9 * before.abs().max(1.0));
    }
}
