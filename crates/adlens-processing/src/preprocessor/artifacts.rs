use super::scaler::StandardScaler;
use crate::error::{ProcessingError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A numeric input column and the median used to fill its gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericFeature {
    pub name: String,
    pub median: f64,
}

/// A categorical input column, its fill value and its sorted vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalFeature {
    pub name: String,
    pub mode: String,
    pub categories: Vec<String>,
}

impl CategoricalFeature {
    /// Name of the one-hot column for `value`.
    pub fn encoded_name(&self, value: &str) -> String {
        format!("{}_{}", self.name, value)
    }

    pub fn encoded_names(&self) -> impl Iterator<Item = String> + '_ {
        self.categories.iter().map(|c| self.encoded_name(c))
    }
}

/// Fitted preprocessing state, persisted next to the model.
///
/// `feature_columns` lists numeric columns first, then the one-hot columns
/// of each categorical feature in vocabulary order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifacts {
    pub target_column: String,
    #[serde(default)]
    pub dropped_columns: Vec<String>,
    pub numeric: Vec<NumericFeature>,
    pub categorical: Vec<CategoricalFeature>,
    pub scaler: StandardScaler,
    pub feature_columns: Vec<String>,
    /// Latest date seen in the training batch.
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

impl Artifacts {
    pub fn width(&self) -> usize {
        self.feature_columns.len()
    }

    /// Check that the parts agree on the feature width.
    pub fn validate(&self) -> Result<()> {
        let expected = self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>();

        if expected != self.width() {
            return Err(ProcessingError::InvalidArtifacts(format!(
                "{} feature columns but imputers and encoder describe {}",
                self.width(),
                expected
            )));
        }

        if self.scaler.means.len() != self.width() || self.scaler.scales.len() != self.width() {
            return Err(ProcessingError::InvalidArtifacts(format!(
                "scaler has {} means and {} scales for {} feature columns",
                self.scaler.means.len(),
                self.scaler.scales.len(),
                self.width()
            )));
        }

        if let Some(pos) = self.scaler.scales.iter().position(|s| *s == 0.0 || !s.is_finite()) {
            return Err(ProcessingError::InvalidArtifacts(format!(
                "scale for '{}' must be a non-zero finite number",
                self.feature_columns[pos]
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_artifacts() -> Artifacts {
        Artifacts {
            target_column: "ad_revenue_usd".to_string(),
            dropped_columns: vec!["video_id".to_string(), "date".to_string()],
            numeric: vec![NumericFeature {
                name: "views".to_string(),
                median: 100.0,
            }],
            categorical: vec![CategoricalFeature {
                name: "device".to_string(),
                mode: "Mobile".to_string(),
                categories: vec!["Desktop".to_string(), "Mobile".to_string()],
            }],
            scaler: StandardScaler {
                means: vec![0.0; 3],
                scales: vec![1.0; 3],
            },
            feature_columns: vec![
                "views".to_string(),
                "device_Desktop".to_string(),
                "device_Mobile".to_string(),
            ],
            reference_date: None,
        }
    }

    #[test]
    fn test_valid_artifacts() {
        assert!(sample_artifacts().validate().is_ok());
    }

    #[test]
    fn test_width_mismatch() {
        let mut artifacts = sample_artifacts();
        artifacts.feature_columns.pop();
        assert!(matches!(
            artifacts.validate(),
            Err(ProcessingError::InvalidArtifacts(_))
        ));
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut artifacts = sample_artifacts();
        artifacts.scaler.scales[1] = 0.0;
        let err = artifacts.validate().unwrap_err();
        assert!(err.to_string().contains("device_Desktop"));
    }

    #[test]
    fn test_encoded_names() {
        let artifacts = sample_artifacts();
        let names: Vec<String> = artifacts.categorical[0].encoded_names().collect();
        assert_eq!(names, vec!["device_Desktop", "device_Mobile"]);
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{
            "target_column": "ad_revenue_usd",
            "numeric": [],
            "categorical": [],
            "scaler": {"means": [], "scales": []},
            "feature_columns": []
        }"#;
        let artifacts: Artifacts = serde_json::from_str(json).unwrap();
        assert!(artifacts.dropped_columns.is_empty());
        assert_eq!(artifacts.reference_date, None);
    }
}
