//! Data preparation for YouTube ad-revenue models.
//!
//! # Overview
//!
//! - **Loading**: CSV reading with fallbacks for slightly malformed exports
//! - **Cleaning**: empty-column removal, deduplication, numeric coercion
//! - **Feature engineering**: engagement, watch time per view, video age and
//!   length-to-watch ratio, for whole tables or single records
//! - **Preprocessing**: median/mode imputation, one-hot encoding and
//!   standardization, fitted once and persisted as [`Artifacts`]
//! - **Feature schema**: inference-time alignment of a single record against
//!   the fitted [`Artifacts`]
//! - **EDA**: describe-style statistics, missing shares and correlations
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use adlens_processing::{prepare_frame, FeatureEngineer, PreprocessConfig, Preprocessor};
//!
//! let config = PreprocessConfig::default();
//! let prepared = prepare_frame("data/youtube.csv", &config, &FeatureEngineer::default())?;
//! let data = Preprocessor::new(&config).fit(&prepared.frame)?;
//!
//! println!("{} features", data.feature_columns().len());
//! ```

pub mod cleaner;
pub mod config;
pub mod eda;
pub mod error;
pub mod features;
pub mod loader;
pub mod preprocessor;
pub mod record;
pub mod schema;
pub mod utils;

pub use cleaner::DataCleaner;
pub use config::{ConfigValidationError, PreprocessConfig, PreprocessConfigBuilder};
pub use eda::{ColumnStats, CorrelationMatrix, EdaSummary, MissingShare};
pub use error::{ProcessingError, Result as ProcessingResult};
pub use features::{AgeReference, FeatureEngineer};
pub use loader::load_csv;
pub use preprocessor::{
    Artifacts, CategoricalFeature, NumericFeature, PreparedData, Preprocessor, StandardScaler,
};
pub use record::{EngineeredRecord, VideoRecord, columns};
pub use schema::{AlignMode, FeatureSchema};

use polars::prelude::DataFrame;
use std::path::Path;

/// A cleaned and engineered table, with the cleaning log.
#[derive(Debug, Clone)]
pub struct PreparedFrame {
    pub frame: DataFrame,
    pub initial_shape: (usize, usize),
    pub cleaning_actions: Vec<String>,
}

/// Load, clean and engineer a CSV file.
pub fn prepare_frame(
    path: impl AsRef<Path>,
    config: &PreprocessConfig,
    engineer: &FeatureEngineer,
) -> ProcessingResult<PreparedFrame> {
    let raw = load_csv(path)?;
    let initial_shape = raw.shape();
    let (cleaned, cleaning_actions) = DataCleaner::new(config).clean(raw)?;
    let frame = engineer.engineer_frame(cleaned)?;

    Ok(PreparedFrame {
        frame,
        initial_shape,
        cleaning_actions,
    })
}

static_assertions::assert_impl_all!(FeatureSchema: Send, Sync);
static_assertions::assert_impl_all!(Artifacts: Send, Sync);
