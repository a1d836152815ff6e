//! Error types for the adlens-learning crate.
//!
//! [`LearningError`] is returned by every fallible operation in the crate:
//! configuration, fitting, evaluation, bundle persistence and prediction.
//!
//! # Example
//!
//! ```no_run
//! use adlens_learning::{LearningError, TrainerConfig};
//!
//! fn configure() -> Result<TrainerConfig, LearningError> {
//!     TrainerConfig::builder()
//!         .model_names(["Ridge", "XGBoost"])?
//!         .build()
//! }
//! ```

use adlens_processing::ProcessingError;
use thiserror::Error;

/// The main error type for adlens-learning operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LearningError {
    /// Invalid configuration, including unknown estimator names.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Training data cannot be used as given.
    ///
    /// Common causes:
    /// - feature matrix and target have different lengths
    /// - empty training or test split
    /// - non-finite values in the feature matrix
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// An estimator could not be fitted.
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    /// The model bundle file does not exist.
    #[error("Model not found: {path}")]
    ModelNotFound {
        /// The path that was not found.
        path: String,
    },

    /// The bundle exists but is incomplete or inconsistent.
    #[error("Invalid model bundle: {0}")]
    InvalidBundle(String),

    /// Prediction input has the wrong number of features.
    #[error("Feature width mismatch: model expects {expected}, got {got}")]
    WidthMismatch {
        /// Width the model was trained on.
        expected: usize,
        /// Width of the supplied vector.
        got: usize,
    },

    /// Prediction failed or produced a non-finite value.
    #[error("Inference error: {0}")]
    InferenceError(String),

    /// Error from the preprocessing layer.
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    /// I/O error during bundle save/load.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LearningError {
    /// Stable code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::TrainingFailed(_) => "TRAINING_FAILED",
            Self::ModelNotFound { .. } => "MODEL_NOT_FOUND",
            Self::InvalidBundle(_) => "INVALID_BUNDLE",
            Self::WidthMismatch { .. } => "WIDTH_MISMATCH",
            Self::InferenceError(_) => "INFERENCE_ERROR",
            Self::Processing(e) => e.error_code(),
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// Whether the error happened while producing a prediction.
    pub fn is_prediction_error(&self) -> bool {
        matches!(self, Self::WidthMismatch { .. } | Self::InferenceError(_))
    }
}

/// Result type alias for learning operations.
pub type Result<T> = std::result::Result<T, LearningError>;
