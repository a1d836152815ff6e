//! Inference-time alignment of a single engineered row against fitted
//! [`Artifacts`].
//!
//! Slots are resolved once, by exact column name, when the schema is built.
//! Aligning a row never fails: unknown or missing categories leave their
//! one-hot block at zero and the output always has `feature_columns` width.

use crate::error::{ProcessingError, Result};
use crate::preprocessor::{Artifacts, StandardScaler};
use crate::record::EngineeredRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a row is turned into a model input vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlignMode {
    /// Zero-initialized vector with present numeric values copied in and the
    /// matching one-hot slots set. No imputation, no scaling.
    Raw,
    /// Like `Raw`, but gaps are filled with the fitted medians and modes and
    /// the fitted standardization is applied.
    #[default]
    Standardized,
}

#[derive(Debug, Clone)]
struct NumericSlot {
    name: String,
    index: usize,
    median: f64,
}

#[derive(Debug, Clone)]
struct CategoricalBlock {
    mode: String,
    slots: HashMap<String, usize>,
}

/// Fixed feature layout derived from artifacts.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    columns: Vec<String>,
    numeric: Vec<NumericSlot>,
    categorical: HashMap<String, CategoricalBlock>,
    scaler: StandardScaler,
}

impl FeatureSchema {
    pub fn from_artifacts(artifacts: &Artifacts) -> Result<Self> {
        artifacts.validate()?;

        let positions: HashMap<&str, usize> = artifacts
            .feature_columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let locate = |name: &str| {
            positions.get(name).copied().ok_or_else(|| {
                ProcessingError::InvalidArtifacts(format!(
                    "column '{}' is missing from feature_columns",
                    name
                ))
            })
        };

        let numeric = artifacts
            .numeric
            .iter()
            .map(|feature| {
                Ok(NumericSlot {
                    name: feature.name.clone(),
                    index: locate(&feature.name)?,
                    median: feature.median,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut categorical = HashMap::new();
        for feature in &artifacts.categorical {
            let mut slots = HashMap::new();
            for value in &feature.categories {
                slots.insert(value.clone(), locate(&feature.encoded_name(value))?);
            }
            categorical.insert(
                feature.name.clone(),
                CategoricalBlock {
                    mode: feature.mode.clone(),
                    slots,
                },
            );
        }

        Ok(Self {
            columns: artifacts.feature_columns.clone(),
            numeric,
            categorical,
            scaler: artifacts.scaler.clone(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Slot of a numeric feature.
    pub fn numeric_slot(&self, name: &str) -> Option<usize> {
        self.numeric.iter().find(|s| s.name == name).map(|s| s.index)
    }

    /// Slot of the one-hot column for `(field, value)`.
    pub fn category_slot(&self, field: &str, value: &str) -> Option<usize> {
        self.categorical.get(field)?.slots.get(value).copied()
    }

    /// Build the model input vector for one row.
    pub fn align(&self, row: &EngineeredRecord, mode: AlignMode) -> Vec<f64> {
        let mut vector = vec![0.0; self.width()];
        let impute = mode == AlignMode::Standardized;

        for slot in &self.numeric {
            match row.numeric(&slot.name).filter(|v| v.is_finite()) {
                Some(value) => vector[slot.index] = value,
                None if impute => vector[slot.index] = slot.median,
                None => {}
            }
        }

        for (field, value) in row.categorical_fields() {
            let Some(block) = self.categorical.get(field) else {
                continue;
            };
            let value = match value {
                Some(v) => Some(v),
                None if impute => Some(block.mode.as_str()),
                None => None,
            };
            if let Some(index) = value.and_then(|v| block.slots.get(v)) {
                vector[*index] = 1.0;
            }
        }

        if impute {
            self.scaler.transform_row(&mut vector);
        }
        vector
    }
}
