//! Configuration for cleaning and preprocessing.
//!
//! Built with [`PreprocessConfig::builder()`]; every field has a default that
//! matches the analytics CSV layout.

use crate::record::columns;
use serde::{Deserialize, Serialize};

/// Configuration for the cleaning and preprocessing stages.
///
/// # Example
///
/// ```rust,ignore
/// use adlens_processing::PreprocessConfig;
///
/// let config = PreprocessConfig::builder()
///     .test_size(0.25)
///     .random_seed(7)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Column holding the regression target.
    /// Default: "ad_revenue_usd"
    pub target_column: String,

    /// Identifier-like columns removed before fitting.
    /// Default: ["video_id", "date"]
    pub drop_columns: Vec<String>,

    /// Columns coerced to numbers during cleaning; unparseable cells become null.
    pub numeric_columns: Vec<String>,

    /// Column holding the publication date.
    /// Default: "date"
    pub date_column: String,

    /// Fraction of rows held out for evaluation (exclusive 0.0 - 1.0).
    /// Default: 0.2
    pub test_size: f64,

    /// Seed for the train/test shuffle.
    /// Default: 42
    pub random_seed: u64,

    /// Whether to remove duplicate rows during cleaning.
    /// Default: true
    pub remove_duplicates: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            target_column: columns::AD_REVENUE.to_string(),
            drop_columns: vec![columns::VIDEO_ID.to_string(), columns::DATE.to_string()],
            numeric_columns: columns::RAW_NUMERIC.iter().map(|c| c.to_string()).collect(),
            date_column: columns::DATE.to_string(),
            test_size: 0.2,
            random_seed: 42,
            remove_duplicates: true,
        }
    }
}

impl PreprocessConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PreprocessConfigBuilder {
        PreprocessConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ConfigValidationError::InvalidTestSize(self.test_size));
        }

        if self.target_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyTargetColumn);
        }

        if self.drop_columns.contains(&self.target_column) {
            return Err(ConfigValidationError::TargetDropped(
                self.target_column.clone(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid test size: {0} (must be strictly between 0.0 and 1.0)")]
    InvalidTestSize(f64),

    #[error("Target column name must not be empty")]
    EmptyTargetColumn,

    #[error("Target column '{0}' is also listed as a dropped column")]
    TargetDropped(String),
}

/// Builder for [`PreprocessConfig`].
#[derive(Debug, Default)]
pub struct PreprocessConfigBuilder {
    target_column: Option<String>,
    drop_columns: Option<Vec<String>>,
    numeric_columns: Option<Vec<String>>,
    date_column: Option<String>,
    test_size: Option<f64>,
    random_seed: Option<u64>,
    remove_duplicates: Option<bool>,
}

impl PreprocessConfigBuilder {
    /// Set the target column.
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    /// Replace the list of identifier columns dropped before fitting.
    pub fn drop_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the list of columns coerced to numbers during cleaning.
    pub fn numeric_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the date column.
    pub fn date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = Some(column.into());
        self
    }

    /// Set the held-out fraction.
    ///
    /// # Arguments
    /// * `size` - Value strictly between 0.0 and 1.0 (e.g., 0.2 = 20%)
    pub fn test_size(mut self, size: f64) -> Self {
        self.test_size = Some(size);
        self
    }

    /// Set the shuffle seed.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Enable or disable duplicate row removal.
    pub fn remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = Some(remove);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PreprocessConfig` or an error if validation fails.
    pub fn build(self) -> Result<PreprocessConfig, ConfigValidationError> {
        let defaults = PreprocessConfig::default();
        let config = PreprocessConfig {
            target_column: self.target_column.unwrap_or(defaults.target_column),
            drop_columns: self.drop_columns.unwrap_or(defaults.drop_columns),
            numeric_columns: self.numeric_columns.unwrap_or(defaults.numeric_columns),
            date_column: self.date_column.unwrap_or(defaults.date_column),
            test_size: self.test_size.unwrap_or(defaults.test_size),
            random_seed: self.random_seed.unwrap_or(defaults.random_seed),
            remove_duplicates: self.remove_duplicates.unwrap_or(defaults.remove_duplicates),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PreprocessConfig::default();
        assert_eq!(config.target_column, "ad_revenue_usd");
        assert_eq!(config.drop_columns, vec!["video_id", "date"]);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.random_seed, 42);
        assert!(config.numeric_columns.contains(&"views".to_string()));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PreprocessConfig::builder()
            .test_size(0.3)
            .random_seed(7)
            .drop_columns(["video_id"])
            .build()
            .unwrap();

        assert_eq!(config.test_size, 0.3);
        assert_eq!(config.random_seed, 7);
        assert_eq!(config.drop_columns, vec!["video_id"]);
    }

    #[test]
    fn test_validation_invalid_test_size() {
        for size in [0.0, 1.0, -0.1, f64::NAN] {
            let result = PreprocessConfig::builder().test_size(size).build();
            assert!(matches!(
                result,
                Err(ConfigValidationError::InvalidTestSize(_))
            ));
        }
    }

    #[test]
    fn test_validation_target_dropped() {
        let result = PreprocessConfig::builder()
            .drop_columns(["ad_revenue_usd"])
            .build();
        assert!(matches!(
            result,
            Err(ConfigValidationError::TargetDropped(_))
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "target_column": "revenue",
            "drop_columns": ["id"],
            "numeric_columns": ["views"],
            "date_column": "published",
            "test_size": 0.25,
            "random_seed": 1,
            "remove_duplicates": false
        }"#;

        let config: PreprocessConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.target_column, "revenue");
        assert_eq!(config.date_column, "published");
        assert!(!config.remove_duplicates);
        assert!(config.validate().is_ok());
    }
}
