//! Model bundle persistence.
//!
//! A bundle is one JSON file holding the fitted estimator and the
//! preprocessing artifacts it was trained against:
//!
//! ```json
//! {
//!   "model": { "kind": "Ridge", "coefficients": [...], "intercept": 0.0 },
//!   "artifacts": { "feature_columns": [...], ... },
//!   "metadata": { "created_at": "...", "metrics": {...} }
//! }
//! ```

use crate::error::{LearningError, Result};
use crate::metrics::RegressionMetrics;
use crate::model::Model;
use adlens_processing::Artifacts;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Informational fields; absent in older bundles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub created_at: Option<DateTime<Utc>>,
    pub metrics: Option<RegressionMetrics>,
    pub training_rows: Option<usize>,
}

/// A fitted model together with its preprocessing artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub model: Model,
    pub artifacts: Artifacts,
    #[serde(default)]
    pub metadata: BundleMetadata,
}

impl ModelBundle {
    /// Pair `model` with `artifacts`.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidBundle`] if the artifacts are
    /// inconsistent, the model is structurally broken, or its width differs
    /// from `feature_columns`.
    pub fn new(model: Model, artifacts: Artifacts) -> Result<Self> {
        let bundle = Self {
            model,
            artifacts,
            metadata: BundleMetadata::default(),
        };
        bundle.validate()?;
        Ok(bundle)
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: BundleMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.artifacts.feature_columns
    }

    fn validate(&self) -> Result<()> {
        self.artifacts
            .validate()
            .map_err(|e| LearningError::InvalidBundle(e.to_string()))?;
        self.model.validate()?;

        let width = self.artifacts.width();
        if self.model.n_features() != width {
            return Err(LearningError::InvalidBundle(format!(
                "{} model expects {} features but artifacts list {} feature columns",
                self.model.kind(),
                self.model.n_features(),
                width
            )));
        }
        Ok(())
    }

    /// Write the bundle as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("Saved {} bundle to {}", self.model.kind(), path.display());
        Ok(())
    }

    /// Read and validate a bundle.
    ///
    /// # Errors
    ///
    /// - [`LearningError::ModelNotFound`] if the file does not exist
    /// - [`LearningError::InvalidBundle`] if the JSON lacks `model` or
    ///   `artifacts`, a tree is malformed, or the two disagree
    /// - [`LearningError::Json`] if the file is not valid JSON
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LearningError::ModelNotFound {
                path: path.display().to_string(),
            });
        }

        let text = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&text)?;

        let Some(object) = value.as_object() else {
            return Err(LearningError::InvalidBundle(
                "bundle must be a JSON object".to_string(),
            ));
        };
        for key in ["model", "artifacts"] {
            if !object.contains_key(key) {
                return Err(LearningError::InvalidBundle(format!(
                    "bundle is missing '{}'",
                    key
                )));
            }
        }

        let bundle: ModelBundle = serde_json::from_value(value)
            .map_err(|e| LearningError::InvalidBundle(e.to_string()))?;
        bundle.validate()?;

        info!(
            "Loaded {} bundle with {} feature columns from {}",
            bundle.model.kind(),
            bundle.artifacts.width(),
            path.display()
        );
        Ok(bundle)
    }

    /// Predict an already aligned feature vector.
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        self.model.predict(row)
    }
}
