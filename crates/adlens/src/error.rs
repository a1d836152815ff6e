//! Application error taxonomy.
//!
//! Library errors are folded into five categories so the CLI can report
//! them uniformly:
//!
//! | Category | Examples |
//! |----------|----------|
//! | configuration | missing API key, missing model file, unknown estimator |
//! | input | unparseable video URL, out-of-range manual fields |
//! | upstream | network failure, non-success HTTP status |
//! | data | bundle missing `model` or `artifacts`, bad CSV dates, too few rows |
//! | prediction | width mismatch or non-finite estimate |

use crate::config::ConfigValidationError;
use adlens_learning::LearningError;
use adlens_metadata::MetadataError;
use adlens_processing::{ConfigValidationError as PreprocessConfigError, ProcessingError};
use serde::Serialize;
use thiserror::Error;

/// Feature columns listed in prediction errors.
pub const PREVIEW_COLUMNS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Configuration,
    Input,
    Upstream,
    Data,
    Prediction,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model file not found: {path}. Train a model first with `adlens train`.")]
    ModelNotFound { path: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Upstream(MetadataError),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Prediction failed: {message}. Expected feature columns: {}", preview(.expected_columns))]
    Prediction {
        message: String,
        expected_columns: Vec<String>,
    },
}

fn preview(columns: &[String]) -> String {
    let shown = columns
        .iter()
        .take(PREVIEW_COLUMNS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if columns.len() > PREVIEW_COLUMNS {
        format!("{} ... ({} total)", shown, columns.len())
    } else {
        shown
    }
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::ModelNotFound { .. } => ErrorCategory::Configuration,
            Self::InvalidInput(_) => ErrorCategory::Input,
            Self::Upstream(_) => ErrorCategory::Upstream,
            Self::Data(_) => ErrorCategory::Data,
            Self::Prediction { .. } => ErrorCategory::Prediction,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::ModelNotFound { .. } => "MODEL_NOT_FOUND",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Upstream(e) => e.error_code(),
            Self::Data(_) => "DATA_ERROR",
            Self::Prediction { .. } => "PREDICTION_ERROR",
        }
    }

    /// Wrap a failure inside `predict` with the columns the model expects.
    pub fn prediction(err: impl std::fmt::Display, expected_columns: &[String]) -> Self {
        Self::Prediction {
            message: err.to_string(),
            expected_columns: expected_columns.to_vec(),
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("AppError", 3)?;
        state.serialize_field("code", self.error_code())?;
        state.serialize_field("category", &self.category())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl From<ConfigValidationError> for AppError {
    fn from(err: ConfigValidationError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PreprocessConfigError> for AppError {
    fn from(err: PreprocessConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::InvalidConfig(msg) => Self::Config(msg),
            other => Self::Data(other.to_string()),
        }
    }
}

impl From<LearningError> for AppError {
    fn from(err: LearningError) -> Self {
        match err {
            LearningError::ModelNotFound { path } => Self::ModelNotFound { path },
            LearningError::InvalidConfig(msg) => Self::Config(msg),
            LearningError::Processing(inner) => inner.into(),
            other if other.is_prediction_error() => Self::Prediction {
                message: other.to_string(),
                expected_columns: Vec::new(),
            },
            other => Self::Data(other.to_string()),
        }
    }
}

impl From<MetadataError> for AppError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::MissingApiKey | MetadataError::InvalidConfig(_) => {
                Self::Config(err.to_string())
            }
            MetadataError::InvalidVideoId(_) => Self::InvalidInput(err.to_string()),
            e if e.is_upstream() => Self::Upstream(e),
            other => Self::Data(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
