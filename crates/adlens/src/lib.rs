//! adlens: YouTube ad-revenue estimation.
//!
//! This crate ties the workspace together:
//!
//! - [`AppConfig`]: model path, cache file, API key and region, resolved
//!   once from the environment and command-line flags
//! - [`run_training`]: CSV to saved [`ModelBundle`](adlens_learning::ModelBundle)
//! - [`PredictionAssembler`]: manual or fetched input to a revenue estimate
//! - [`AppError`]: every failure sorted into configuration, input, upstream,
//!   data or prediction errors
//!
//! The `adlens` binary exposes these as the `train`, `predict` and `fetch`
//! commands.

pub mod assembler;
pub mod config;
pub mod error;
pub mod train;

pub use assembler::{
    DEFAULT_RETENTION, ManualInput, Prediction, PredictionAssembler, VideoPrediction,
    feature_row_from_video, validate_retention,
};
pub use config::{AppConfig, AppConfigBuilder, ConfigValidationError};
pub use error::{AppError, ErrorCategory, Result};
pub use train::{TrainOptions, TrainOutcome, run_training};

use adlens_metadata::{MetadataCache, YouTubeConfig, YouTubeFetcher};

/// Fetcher backed by the configured cache file.
///
/// # Errors
///
/// Returns [`AppError::Config`] when no API key is configured.
pub fn fetcher_from_config(config: &AppConfig) -> Result<YouTubeFetcher> {
    let youtube = YouTubeConfig::builder()
        .api_key_opt(config.api_key.clone())
        .region(config.region.clone())
        .build()?;
    Ok(YouTubeFetcher::new(
        youtube,
        MetadataCache::file(config.cache_file.clone()),
    )?)
}
