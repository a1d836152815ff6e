//! Model selection: fit every configured estimator on the training split,
//! score it on the held-out split and keep the lowest RMSE.
//!
//! # Example
//!
//! ```rust,ignore
//! use adlens_learning::{ModelTrainer, TrainerConfig};
//!
//! let trainer = ModelTrainer::builder()
//!     .config(TrainerConfig::default())
//!     .on_progress(|u| println!("[{}/{}] {}", u.completed, u.total, u.message))
//!     .build();
//!
//! let report = trainer.train(&prepared)?;
//! println!("Best model: {}", report.best_kind);
//! ```

use crate::config::TrainerConfig;
use crate::error::{LearningError, Result};
use crate::metrics::RegressionMetrics;
use crate::model::{Model, ModelKind};
use adlens_processing::PreparedData;
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// One progress notification, sent after each estimator is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub model: ModelKind,
    /// Estimators finished so far, including this one.
    pub completed: usize,
    pub total: usize,
    pub message: String,
}

/// Callback invoked with each [`ProgressUpdate`].
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Held-out evaluation of one estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    pub kind: ModelKind,
    pub metrics: RegressionMetrics,
    pub training_time_seconds: f64,
}

/// Outcome of a training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Every estimator in fitting order.
    pub results: Vec<ModelResult>,
    pub best_kind: ModelKind,
    pub best_model: Model,
}

impl TrainingReport {
    pub fn best_result(&self) -> Option<&ModelResult> {
        self.results.iter().find(|r| r.kind == self.best_kind)
    }
}

/// Fits and compares the estimators named in a [`TrainerConfig`].
pub struct ModelTrainer {
    config: TrainerConfig,
    progress: Option<ProgressCallback>,
}

impl fmt::Debug for ModelTrainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelTrainer")
            .field("config", &self.config)
            .field("has_progress_callback", &self.progress.is_some())
            .finish()
    }
}

impl ModelTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    #[must_use]
    pub fn builder() -> ModelTrainerBuilder {
        ModelTrainerBuilder::default()
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train on the splits produced by the preprocessor.
    pub fn train(&self, data: &PreparedData) -> Result<TrainingReport> {
        self.train_arrays(
            data.x_train.view(),
            data.y_train.view(),
            data.x_test.view(),
            data.y_test.view(),
        )
    }

    /// Train on explicit train/test arrays.
    ///
    /// Estimators are fitted one after another in configuration order. The
    /// winner has the strictly lowest held-out RMSE; on a tie the earlier
    /// estimator is kept, and a NaN RMSE never wins.
    ///
    /// # Errors
    ///
    /// - [`LearningError::InvalidData`] if the test split is empty or the
    ///   widths of the splits differ
    /// - any error from fitting an estimator; the run stops there
    pub fn train_arrays(
        &self,
        x_train: ArrayView2<'_, f64>,
        y_train: ArrayView1<'_, f64>,
        x_test: ArrayView2<'_, f64>,
        y_test: ArrayView1<'_, f64>,
    ) -> Result<TrainingReport> {
        if x_test.nrows() == 0 || x_test.nrows() != y_test.len() {
            return Err(LearningError::InvalidData(format!(
                "test split has {} feature rows and {} targets",
                x_test.nrows(),
                y_test.len()
            )));
        }
        if x_train.ncols() != x_test.ncols() {
            return Err(LearningError::InvalidData(format!(
                "train split has {} features but test split has {}",
                x_train.ncols(),
                x_test.ncols()
            )));
        }

        let total = self.config.models.len();
        info!(
            "Training {} model(s) on {} rows, evaluating on {}",
            total,
            x_train.nrows(),
            x_test.nrows()
        );

        let actual = y_test.to_vec();
        let mut results = Vec::with_capacity(total);
        let mut best: Option<(Model, f64)> = None;

        for (i, &kind) in self.config.models.iter().enumerate() {
            let start = Instant::now();
            let model = Model::fit(kind, x_train, y_train, &self.config)?;
            let elapsed = start.elapsed().as_secs_f64();

            let predicted = model.predict_batch(x_test)?;
            let metrics = RegressionMetrics::calculate(&actual, &predicted);
            info!(
                "{}: R2={:.4}, RMSE={:.4}, MAE={:.4} ({:.2}s)",
                kind, metrics.r2, metrics.rmse, metrics.mae, elapsed
            );
            if metrics.rmse.is_nan() {
                warn!("{} produced a NaN RMSE and cannot be selected", kind);
            }

            let improves = match &best {
                None => !metrics.rmse.is_nan(),
                Some((_, best_rmse)) => metrics.rmse < *best_rmse,
            };
            if improves {
                best = Some((model, metrics.rmse));
            }

            results.push(ModelResult {
                kind,
                metrics,
                training_time_seconds: elapsed,
            });

            if let Some(callback) = &self.progress {
                callback(ProgressUpdate {
                    model: kind,
                    completed: i + 1,
                    total,
                    message: format!("{} RMSE {:.4}", kind, metrics.rmse),
                });
            }
        }

        let (best_model, best_rmse) = best.ok_or_else(|| {
            LearningError::TrainingFailed("no model produced a usable RMSE".to_string())
        })?;
        let best_kind = best_model.kind();
        info!("Best model: {} (RMSE {:.4})", best_kind, best_rmse);

        Ok(TrainingReport {
            results,
            best_kind,
            best_model,
        })
    }
}

/// Builder for [`ModelTrainer`].
#[derive(Default)]
pub struct ModelTrainerBuilder {
    config: Option<TrainerConfig>,
    progress: Option<ProgressCallback>,
}

impl ModelTrainerBuilder {
    /// Trainer configuration; defaults to [`TrainerConfig::default`].
    #[must_use]
    pub fn config(mut self, config: TrainerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register a callback invoked after each estimator is evaluated.
    #[must_use]
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> ModelTrainer {
        ModelTrainer {
            config: self.config.unwrap_or_default(),
            progress: self.progress,
        }
    }
}
