//! Error types for the cleaning, feature engineering and preprocessing stages.
//!
//! Errors serialize as `{code, message}` so the CLI can emit them in its
//! machine-readable output mode.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the processing pipeline.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The data itself cannot be processed.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A non-empty date cell could not be parsed.
    #[error("Row {row}: cannot parse date '{value}'")]
    InvalidDate { row: usize, value: String },

    /// Too few usable rows to fit and split.
    #[error("Not enough rows: {rows} usable row(s), need at least 2")]
    InsufficientRows { rows: usize },

    /// Persisted preprocessing state is internally inconsistent.
    #[error("Invalid artifacts: {0}")]
    InvalidArtifacts(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A known numeric column could not be cast to floats.
    #[error("Cannot coerce column '{column}' to numeric: {source}")]
    Coercion {
        column: String,
        #[source]
        source: polars::error::PolarsError,
    },
}

impl ProcessingError {
    /// Stable code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::InvalidDate { .. } => "INVALID_DATE",
            Self::InsufficientRows { .. } => "INSUFFICIENT_ROWS",
            Self::InvalidArtifacts(_) => "INVALID_ARTIFACTS",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Coercion { .. } => "COERCION_ERROR",
        }
    }
}

impl Serialize for ProcessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ProcessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            ProcessingError::ColumnNotFound("views".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert_eq!(
            ProcessingError::InsufficientRows { rows: 1 }.error_code(),
            "INSUFFICIENT_ROWS"
        );
    }

    #[test]
    fn test_invalid_date_names_row() {
        let error = ProcessingError::InvalidDate {
            row: 7,
            value: "31/31/2024".to_string(),
        };
        assert_eq!(error.to_string(), "Row 7: cannot parse date '31/31/2024'");
        assert_eq!(error.error_code(), "INVALID_DATE");
    }

    #[test]
    fn test_error_serialization() {
        let error = ProcessingError::ColumnNotFound("ad_revenue_usd".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("ad_revenue_usd"));
    }

    #[test]
    fn test_coercion_names_column() {
        let error = ProcessingError::Coercion {
            column: "views".to_string(),
            source: polars::error::PolarsError::ComputeError("bad cast".into()),
        };
        assert_eq!(error.error_code(), "COERCION_ERROR");
        assert!(error.to_string().contains("'views'"));
        assert!(std::error::Error::source(&error).is_some());
    }
}
