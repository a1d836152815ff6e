//! Basic cleaning of the raw analytics table.
//!
//! Three steps, in order:
//! - drop columns that contain no values at all
//! - remove duplicate rows (first occurrence kept, order preserved)
//! - coerce the known numeric columns, turning unparseable cells into nulls

use crate::config::PreprocessConfig;
use crate::error::{ProcessingError, Result};
use polars::prelude::*;
use tracing::{debug, info};

/// Data cleaner for the basic cleaning pass.
pub struct DataCleaner<'a> {
    config: &'a PreprocessConfig,
}

impl<'a> DataCleaner<'a> {
    pub fn new(config: &'a PreprocessConfig) -> Self {
        Self { config }
    }

    /// Clean a dataset, returning it together with a log of the actions taken.
    pub fn clean(&self, df: DataFrame) -> Result<(DataFrame, Vec<String>)> {
        let mut actions = Vec::new();
        let mut df = df;

        info!("Performing basic data cleaning...");

        // 1. Drop fully empty columns
        let empty_cols: Vec<PlSmallStr> = if df.height() == 0 {
            Vec::new()
        } else {
            df.get_columns()
                .iter()
                .filter(|col| col.null_count() == df.height())
                .map(|col| col.name().clone())
                .collect()
        };
        if !empty_cols.is_empty() {
            actions.push(format!(
                "Removed {} empty column(s): {:?}",
                empty_cols.len(),
                empty_cols
            ));
            df = df.drop_many(empty_cols);
        }

        // 2. Remove duplicate rows
        if self.config.remove_duplicates {
            let before = df.height();
            df = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
            let removed = before - df.height();

            if removed > 0 {
                let pct = (removed as f64 / before as f64) * 100.0;
                actions.push(format!("Removed {} duplicate rows ({:.1}%)", removed, pct));
                debug!("Removed {} duplicate rows", removed);
            } else {
                actions.push("No duplicate rows found".to_string());
                debug!("No duplicate rows found");
            }
        }

        // 3. Coerce numeric columns
        for name in &self.config.numeric_columns {
            let Ok(col) = df.column(name) else {
                continue;
            };
            if col.dtype() == &DataType::Float64 {
                continue;
            }

            let before_nulls = col.null_count();
            let coerced = col
                .as_materialized_series()
                .cast(&DataType::Float64)
                .map_err(|source| ProcessingError::Coercion {
                    column: name.clone(),
                    source,
                })?;
            let invalid = coerced.null_count().saturating_sub(before_nulls);
            df.with_column(coerced)?;

            if invalid > 0 {
                actions.push(format!(
                    "Coerced '{}' to numeric ({} unparseable value(s) set to null)",
                    name, invalid
                ));
            }
        }

        info!("Cleaning complete: {} rows x {} columns", df.height(), df.width());
        Ok((df, actions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner_config() -> PreprocessConfig {
        PreprocessConfig::default()
    }

    #[test]
    fn test_drops_empty_columns() {
        let df = df![
            "views" => [Some(1.0), Some(2.0)],
            "notes" => [None::<&str>, None],
        ]
        .unwrap();

        let config = cleaner_config();
        let (cleaned, actions) = DataCleaner::new(&config).clean(df).unwrap();
        assert_eq!(cleaned.width(), 1);
        assert!(cleaned.column("notes").is_err());
        assert!(actions.iter().any(|a| a.contains("empty column")));
    }

    #[test]
    fn test_removes_duplicates_keeping_order() {
        let df = df![
            "views" => [3.0, 1.0, 3.0, 2.0],
            "category" => ["a", "b", "a", "c"],
        ]
        .unwrap();

        let config = cleaner_config();
        let (cleaned, _) = DataCleaner::new(&config).clean(df).unwrap();
        let views: Vec<Option<f64>> = cleaned
            .column("views")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(views, vec![Some(3.0), Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_coerces_numeric_strings() {
        let df = df![
            "likes" => ["10", "abc", "30"],
        ]
        .unwrap();

        let config = cleaner_config();
        let (cleaned, actions) = DataCleaner::new(&config).clean(df).unwrap();
        let likes = cleaned.column("likes").unwrap();
        assert_eq!(likes.dtype(), &DataType::Float64);
        assert_eq!(likes.null_count(), 1);
        assert!(actions.iter().any(|a| a.contains("unparseable")));
    }
}
