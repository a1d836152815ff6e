//! Fit-mode preprocessing: imputation, one-hot encoding, standardization and
//! the train/test split.
//!
//! The fitted state is captured in [`Artifacts`]; inference-time alignment
//! against that state lives in [`crate::schema`].

mod artifacts;
mod scaler;

pub use artifacts::{Artifacts, CategoricalFeature, NumericFeature};
pub use scaler::StandardScaler;

use crate::config::PreprocessConfig;
use crate::error::{ProcessingError, Result};
use crate::features::parse_date_column;
use crate::utils::{column_f64, column_str, is_numeric_dtype, is_string_dtype, median, string_mode};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Train/test matrices plus the fitted state that produced them.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    pub artifacts: Artifacts,
}

impl PreparedData {
    pub fn feature_columns(&self) -> &[String] {
        &self.artifacts.feature_columns
    }
}

/// Fits the preprocessing state on an engineered table.
pub struct Preprocessor<'a> {
    config: &'a PreprocessConfig,
}

impl<'a> Preprocessor<'a> {
    pub fn new(config: &'a PreprocessConfig) -> Self {
        Self { config }
    }

    /// Fit imputers, encoder and scaler, then split into train and test sets.
    ///
    /// Rows with a missing target are dropped; columns with no observed value
    /// are skipped. Both produce a warning rather than an error.
    pub fn fit(&self, df: &DataFrame) -> Result<PreparedData> {
        let target = self.config.target_column.as_str();
        let (rows, targets): (Vec<usize>, Vec<f64>) = column_f64(df, target)?
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| v.filter(|y| y.is_finite()).map(|y| (i, y)))
            .unzip();

        let missing_target = df.height() - rows.len();
        if missing_target > 0 {
            warn!(
                "Dropping {} row(s) with a missing '{}' value",
                missing_target, target
            );
        }
        if rows.len() < 2 {
            return Err(ProcessingError::InsufficientRows { rows: rows.len() });
        }

        let (numeric_names, categorical_names) = self.classify_columns(df);

        let mut numeric = Vec::new();
        let mut numeric_values: Vec<Vec<f64>> = Vec::new();
        for name in numeric_names {
            let all = column_f64(df, &name)?;
            let values: Vec<Option<f64>> = rows
                .iter()
                .map(|&i| all[i].filter(|v| v.is_finite()))
                .collect();
            let Some(fill) = median(&values) else {
                warn!("Column '{}' has no observed values, skipping it", name);
                continue;
            };
            numeric_values.push(values.into_iter().map(|v| v.unwrap_or(fill)).collect());
            numeric.push(NumericFeature { name, median: fill });
        }

        let mut categorical = Vec::new();
        let mut categorical_values: Vec<Vec<String>> = Vec::new();
        for name in categorical_names {
            let all = column_str(df, &name)?;
            let values: Vec<Option<String>> = rows.iter().map(|&i| all[i].clone()).collect();
            let Some(mode) = string_mode(&values) else {
                warn!("Column '{}' has no observed values, skipping it", name);
                continue;
            };
            let filled: Vec<String> = values
                .into_iter()
                .map(|v| v.unwrap_or_else(|| mode.clone()))
                .collect();
            let categories: Vec<String> = filled
                .iter()
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            debug!("Column '{}': {} categories", name, categories.len());
            categorical_values.push(filled);
            categorical.push(CategoricalFeature {
                name,
                mode,
                categories,
            });
        }

        let mut feature_columns: Vec<String> = numeric.iter().map(|f| f.name.clone()).collect();
        for feature in &categorical {
            feature_columns.extend(feature.encoded_names());
        }
        if feature_columns.is_empty() {
            return Err(ProcessingError::InvalidData(
                "no usable feature columns after preprocessing".to_string(),
            ));
        }

        let mut x = Array2::<f64>::zeros((rows.len(), feature_columns.len()));
        for (j, values) in numeric_values.iter().enumerate() {
            for (i, value) in values.iter().enumerate() {
                x[[i, j]] = *value;
            }
        }
        let mut offset = numeric.len();
        for (feature, values) in categorical.iter().zip(&categorical_values) {
            for (i, value) in values.iter().enumerate() {
                if let Ok(k) = feature.categories.binary_search(value) {
                    x[[i, offset + k]] = 1.0;
                }
            }
            offset += feature.categories.len();
        }

        let scaler = StandardScaler::fit(x.view());
        scaler.transform_in_place(&mut x);

        let reference_date = self.reference_date(df, &rows)?;
        let artifacts = Artifacts {
            target_column: target.to_string(),
            dropped_columns: self.config.drop_columns.clone(),
            numeric,
            categorical,
            scaler,
            feature_columns,
            reference_date,
        };

        let (train_idx, test_idx) =
            split_indices(rows.len(), self.config.test_size, self.config.random_seed)?;
        let y = Array1::from(targets);

        info!(
            "Preprocessed {} rows into {} features ({} train / {} test)",
            rows.len(),
            artifacts.width(),
            train_idx.len(),
            test_idx.len()
        );

        Ok(PreparedData {
            x_train: x.select(Axis(0), &train_idx),
            x_test: x.select(Axis(0), &test_idx),
            y_train: y.select(Axis(0), &train_idx),
            y_test: y.select(Axis(0), &test_idx),
            artifacts,
        })
    }

    fn classify_columns(&self, df: &DataFrame) -> (Vec<String>, Vec<String>) {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();

        for col in df.get_columns() {
            let name = col.name().as_str();
            if name == self.config.target_column || self.config.drop_columns.iter().any(|d| d == name)
            {
                continue;
            }
            if is_numeric_dtype(col.dtype()) {
                numeric.push(name.to_string());
            } else if is_string_dtype(col.dtype()) {
                categorical.push(name.to_string());
            } else {
                debug!("Skipping column '{}' with dtype {:?}", name, col.dtype());
            }
        }

        (numeric, categorical)
    }

    fn reference_date(&self, df: &DataFrame, rows: &[usize]) -> Result<Option<chrono::NaiveDate>> {
        if df.column(&self.config.date_column).is_err() {
            return Ok(None);
        }
        let dates = parse_date_column(df, &self.config.date_column)?;
        Ok(rows.iter().filter_map(|&i| dates[i]).max())
    }
}

/// Shuffle `0..n` with a seeded RNG and cut off the test share.
///
/// The test count is `ceil(n * test_size)`; both sides must end up non-empty.
pub fn split_indices(n: usize, test_size: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ProcessingError::InvalidConfig(format!(
            "test size must be strictly between 0 and 1, got {}",
            test_size
        )));
    }

    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(ProcessingError::InvalidData(format!(
            "cannot split {} row(s) with test size {}: one side would be empty",
            n, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}
