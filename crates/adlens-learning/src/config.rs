//! Configuration for the model trainer.
//!
//! # Example
//!
//! ```
//! use adlens_learning::{ModelKind, TrainerConfig};
//!
//! let config = TrainerConfig::builder()
//!     .models([ModelKind::Ridge, ModelKind::RandomForest])
//!     .n_estimators(50)
//!     .random_seed(7)
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.models.len(), 2);
//! ```

use crate::error::LearningError;
use crate::model::ModelKind;
use serde::{Deserialize, Serialize};

/// Estimators to fit and their hyperparameters.
///
/// Defaults train every estimator with the hyperparameters listed on
/// [`ModelKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Estimators in fitting order. Order matters for RMSE ties: the
    /// earlier estimator wins.
    pub models: Vec<ModelKind>,

    /// Seed for bootstrap sampling (default: 42).
    pub random_seed: u64,

    /// Ridge penalty (default: 1.0).
    pub ridge_alpha: f64,

    /// Lasso penalty (default: 1.0).
    pub lasso_alpha: f64,

    /// Lasso coordinate-descent sweep limit (default: 1000).
    pub lasso_max_iter: usize,

    /// Lasso relative convergence tolerance (default: 1e-4).
    pub lasso_tolerance: f64,

    /// Trees in the random forest (default: 100).
    pub n_estimators: usize,

    /// Boosting rounds (default: 100).
    pub boosting_rounds: usize,

    /// Boosting shrinkage (default: 0.3).
    pub learning_rate: f64,

    /// Boosted tree depth (default: 6).
    pub max_depth: u16,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            models: ModelKind::ALL.to_vec(),
            random_seed: 42,
            ridge_alpha: 1.0,
            lasso_alpha: 1.0,
            lasso_max_iter: 1000,
            lasso_tolerance: 1e-4,
            n_estimators: 100,
            boosting_rounds: 100,
            learning_rate: 0.3,
            max_depth: 6,
        }
    }
}

impl TrainerConfig {
    /// Create a new builder for `TrainerConfig`.
    #[must_use]
    pub fn builder() -> TrainerConfigBuilder {
        TrainerConfigBuilder::default()
    }
}

/// Builder for [`TrainerConfig`].
#[derive(Debug, Clone, Default)]
pub struct TrainerConfigBuilder {
    config: TrainerConfig,
}

impl TrainerConfigBuilder {
    /// Set the estimators to fit.
    #[must_use]
    pub fn models(mut self, models: impl IntoIterator<Item = ModelKind>) -> Self {
        self.config.models = models.into_iter().collect();
        self
    }

    /// Set the estimators by name, e.g. from a command-line list.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] for the first unknown name,
    /// before anything is fitted.
    pub fn model_names<I, S>(mut self, names: I) -> Result<Self, LearningError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.models = names
            .into_iter()
            .map(|name| name.as_ref().parse::<ModelKind>())
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    #[must_use]
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    #[must_use]
    pub fn ridge_alpha(mut self, alpha: f64) -> Self {
        self.config.ridge_alpha = alpha;
        self
    }

    #[must_use]
    pub fn lasso_alpha(mut self, alpha: f64) -> Self {
        self.config.lasso_alpha = alpha;
        self
    }

    #[must_use]
    pub fn lasso_max_iter(mut self, max_iter: usize) -> Self {
        self.config.lasso_max_iter = max_iter;
        self
    }

    #[must_use]
    pub fn n_estimators(mut self, n: usize) -> Self {
        self.config.n_estimators = n;
        self
    }

    #[must_use]
    pub fn boosting_rounds(mut self, rounds: usize) -> Self {
        self.config.boosting_rounds = rounds;
        self
    }

    #[must_use]
    pub fn learning_rate(mut self, rate: f64) -> Self {
        self.config.learning_rate = rate;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, depth: u16) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] if:
    /// - no estimator is selected
    /// - a penalty is negative or not finite
    /// - `n_estimators`, `boosting_rounds`, `lasso_max_iter` or `max_depth`
    ///   is zero
    /// - `learning_rate` is not in `(0, 1]`
    pub fn build(self) -> Result<TrainerConfig, LearningError> {
        let config = self.config;

        if config.models.is_empty() {
            return Err(LearningError::InvalidConfig(
                "at least one model must be selected".to_string(),
            ));
        }

        for (name, value) in [
            ("ridge_alpha", config.ridge_alpha),
            ("lasso_alpha", config.lasso_alpha),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LearningError::InvalidConfig(format!(
                    "{} must be a non-negative number",
                    name
                )));
            }
        }

        if config.n_estimators == 0 {
            return Err(LearningError::InvalidConfig(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        if config.boosting_rounds == 0 {
            return Err(LearningError::InvalidConfig(
                "boosting_rounds must be at least 1".to_string(),
            ));
        }

        if config.lasso_max_iter == 0 {
            return Err(LearningError::InvalidConfig(
                "lasso_max_iter must be at least 1".to_string(),
            ));
        }

        if config.max_depth == 0 {
            return Err(LearningError::InvalidConfig(
                "max_depth must be at least 1".to_string(),
            ));
        }

        if !(config.learning_rate > 0.0 && config.learning_rate <= 1.0) {
            return Err(LearningError::InvalidConfig(
                "learning_rate must be in (0.0, 1.0]".to_string(),
            ));
        }

        Ok(config)
    }
}
