//! Estimator kinds and the fitted-model enum stored in bundles.
//!
//! [`ModelKind`] names an estimator (the names accepted on the command
//! line); [`Model`] is a fitted estimator of any kind. `Model` serializes
//! with an internal `kind` tag:
//!
//! ```json
//! { "kind": "Ridge", "coefficients": [0.4, -1.2], "intercept": 3.1 }
//! ```

use crate::boosting::{BoostingParams, GradientBoosting};
use crate::config::TrainerConfig;
use crate::error::{LearningError, Result};
use crate::forest::{ForestParams, RandomForest};
use crate::linear::LinearModel;
use crate::tree::TreeParams;
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The estimator types the trainer can fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Ordinary least squares.
    LinearRegression,
    /// L2-penalized least squares (alpha 1.0).
    Ridge,
    /// L1-penalized least squares by coordinate descent (alpha 1.0).
    Lasso,
    /// 100 bootstrap regression trees, mean prediction.
    RandomForest,
    /// Gradient-boosted smartcore regression trees: 100 rounds, learning
    /// rate 0.3, depth 6.
    XGBoost,
}

impl ModelKind {
    /// All estimators in default fitting order.
    pub const ALL: [ModelKind; 5] = [
        ModelKind::LinearRegression,
        ModelKind::Ridge,
        ModelKind::Lasso,
        ModelKind::RandomForest,
        ModelKind::XGBoost,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::LinearRegression => "LinearRegression",
            ModelKind::Ridge => "Ridge",
            ModelKind::Lasso => "Lasso",
            ModelKind::RandomForest => "RandomForest",
            ModelKind::XGBoost => "XGBoost",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = LearningError;

    /// Case-insensitive; `_`, `-` and spaces are ignored, so
    /// `random_forest` and `RandomForest` are the same name.
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "linearregression" | "linear" | "ols" => Ok(ModelKind::LinearRegression),
            "ridge" => Ok(ModelKind::Ridge),
            "lasso" => Ok(ModelKind::Lasso),
            "randomforest" | "rf" => Ok(ModelKind::RandomForest),
            "xgboost" | "xgb" | "gradientboosting" => Ok(ModelKind::XGBoost),
            _ => Err(LearningError::InvalidConfig(format!(
                "unknown model '{}'; expected one of: {}",
                s,
                ModelKind::ALL.map(|k| k.as_str()).join(", ")
            ))),
        }
    }
}

/// Anything that maps one feature vector to one estimate.
pub trait Estimator {
    fn predict_row(&self, row: &[f64]) -> Result<f64>;

    /// Width of the feature vectors the estimator was fitted on.
    fn n_features(&self) -> usize;

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        x.rows()
            .into_iter()
            .map(|row| match row.as_slice() {
                Some(slice) => self.predict_row(slice),
                None => self.predict_row(&row.to_vec()),
            })
            .collect()
    }

    /// Structural checks for an estimator read back from disk.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl Estimator for LinearModel {
    fn predict_row(&self, row: &[f64]) -> Result<f64> {
        Ok(LinearModel::predict_row(self, row))
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }
}

impl Estimator for RandomForest {
    fn predict_row(&self, row: &[f64]) -> Result<f64> {
        Ok(RandomForest::predict_row(self, row))
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn validate(&self) -> Result<()> {
        RandomForest::validate(self)
    }
}

impl Estimator for GradientBoosting {
    fn predict_row(&self, row: &[f64]) -> Result<f64> {
        GradientBoosting::predict_row(self, row)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        GradientBoosting::predict(self, x)
    }

    fn validate(&self) -> Result<()> {
        GradientBoosting::validate(self)
    }
}

/// A fitted estimator of any supported kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Model {
    LinearRegression(LinearModel),
    Ridge(LinearModel),
    Lasso(LinearModel),
    RandomForest(RandomForest),
    XGBoost(GradientBoosting),
}

impl Model {
    /// Fit an estimator of `kind` on `x` / `y` with the hyperparameters
    /// from `config`.
    ///
    /// # Errors
    ///
    /// - [`LearningError::InvalidData`] if the shapes disagree, there are
    ///   no rows, or any value is non-finite
    /// - [`LearningError::TrainingFailed`] if a linear system is singular or
    ///   a boosting round cannot be fitted
    pub fn fit(
        kind: ModelKind,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        config: &TrainerConfig,
    ) -> Result<Self> {
        check_training_data(x, y)?;

        let model = match kind {
            ModelKind::LinearRegression => Model::LinearRegression(LinearModel::fit_ols(x, y)?),
            ModelKind::Ridge => Model::Ridge(LinearModel::fit_ridge(x, y, config.ridge_alpha)?),
            ModelKind::Lasso => Model::Lasso(LinearModel::fit_lasso(
                x,
                y,
                config.lasso_alpha,
                config.lasso_max_iter,
                config.lasso_tolerance,
            )?),
            ModelKind::RandomForest => {
                let params = ForestParams {
                    n_estimators: config.n_estimators,
                    tree: TreeParams::default(),
                };
                Model::RandomForest(RandomForest::fit(x, y, &params, config.random_seed))
            }
            ModelKind::XGBoost => {
                let params = BoostingParams {
                    n_rounds: config.boosting_rounds,
                    learning_rate: config.learning_rate,
                    max_depth: config.max_depth,
                    ..Default::default()
                };
                Model::XGBoost(GradientBoosting::fit(x, y, &params)?)
            }
        };

        Ok(model)
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Model::LinearRegression(_) => ModelKind::LinearRegression,
            Model::Ridge(_) => ModelKind::Ridge,
            Model::Lasso(_) => ModelKind::Lasso,
            Model::RandomForest(_) => ModelKind::RandomForest,
            Model::XGBoost(_) => ModelKind::XGBoost,
        }
    }

    fn estimator(&self) -> &dyn Estimator {
        match self {
            Model::LinearRegression(m) | Model::Ridge(m) | Model::Lasso(m) => m,
            Model::RandomForest(m) => m,
            Model::XGBoost(m) => m,
        }
    }

    pub fn n_features(&self) -> usize {
        self.estimator().n_features()
    }

    /// Check the fitted state, e.g. after deserialization.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidBundle`] for an empty ensemble or a
    /// tree that would index past the feature vector or its own nodes.
    pub fn validate(&self) -> Result<()> {
        self.estimator().validate()
    }

    /// Predict one feature vector.
    ///
    /// # Errors
    ///
    /// - [`LearningError::WidthMismatch`] if `row` has the wrong width
    /// - [`LearningError::InferenceError`] if the estimate is not finite
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        let expected = self.n_features();
        if row.len() != expected {
            return Err(LearningError::WidthMismatch {
                expected,
                got: row.len(),
            });
        }

        let value = self.estimator().predict_row(row)?;
        if !value.is_finite() {
            return Err(LearningError::InferenceError(format!(
                "{} produced a non-finite estimate ({})",
                self.kind(),
                value
            )));
        }
        Ok(value)
    }

    /// Predict every row of `x`; no finiteness check, used for evaluation.
    pub fn predict_batch(&self, x: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        let expected = self.n_features();
        if x.ncols() != expected {
            return Err(LearningError::WidthMismatch {
                expected,
                got: x.ncols(),
            });
        }
        self.estimator().predict(x)
    }
}

fn check_training_data(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(LearningError::InvalidData(format!(
            "feature matrix has {} rows but target has {}",
            x.nrows(),
            y.len()
        )));
    }
    if x.nrows() == 0 {
        return Err(LearningError::InvalidData(
            "training split is empty".to_string(),
        ));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(LearningError::InvalidData(
            "training data contains non-finite values".to_string(),
        ));
    }
    Ok(())
}
