//! adlens-learning: regression estimators and model selection for ad-revenue
//! estimation.
//!
//! The crate fits five estimator families on the preprocessed feature
//! matrix, picks the one with the lowest held-out RMSE and persists it
//! together with the preprocessing artifacts as a [`ModelBundle`].
//!
//! # Estimators
//!
//! | [`ModelKind`] | Implementation |
//! |---------------|----------------|
//! | `LinearRegression` | least squares via Cholesky on the normal equations |
//! | `Ridge` | least squares with an L2 penalty (alpha 1.0) |
//! | `Lasso` | coordinate descent with an L1 penalty (alpha 1.0) |
//! | `RandomForest` | 100 bootstrap regression trees |
//! | `XGBoost` | 100 rounds of boosted smartcore regression trees, depth 6, eta 0.3 |
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use adlens_learning::{ModelBundle, ModelTrainer, TrainerConfig};
//! use adlens_processing::{PreprocessConfig, Preprocessor};
//!
//! let prepared = Preprocessor::new(&PreprocessConfig::default()).fit(&frame)?;
//! let report = ModelTrainer::new(TrainerConfig::default()).train(&prepared)?;
//!
//! let bundle = ModelBundle::new(report.best_model, prepared.artifacts)?;
//! bundle.save("models/best_model.json")?;
//! ```

pub mod boosting;
pub mod bundle;
pub mod config;
pub mod error;
pub mod forest;
pub mod linear;
pub mod metrics;
pub mod model;
pub mod trainer;
pub mod tree;

mod linalg;

pub use bundle::{BundleMetadata, ModelBundle};
pub use config::{TrainerConfig, TrainerConfigBuilder};
pub use error::{LearningError, Result};
pub use metrics::RegressionMetrics;
pub use model::{Estimator, Model, ModelKind};
pub use trainer::{
    ModelResult, ModelTrainer, ModelTrainerBuilder, ProgressCallback, ProgressUpdate,
    TrainingReport,
};
