//! End-to-end training workflow: CSV in, saved bundle out.

use crate::error::Result;
use adlens_learning::{
    BundleMetadata, ModelBundle, ModelKind, ModelResult, ModelTrainer, ProgressUpdate,
    RegressionMetrics, TrainerConfig,
};
use adlens_processing::{
    EdaSummary, FeatureEngineer, PreprocessConfig, Preprocessor, prepare_frame,
};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Inputs of one training run.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub data: PathBuf,
    pub model_out: PathBuf,
    /// Directory for `eda_report.json` and `correlation_matrix.csv`.
    pub report_dir: Option<PathBuf>,
    pub test_size: Option<f64>,
    pub seed: Option<u64>,
    /// Estimator names; every estimator when empty.
    pub models: Vec<String>,
}

impl TrainOptions {
    pub fn new(data: impl Into<PathBuf>, model_out: impl Into<PathBuf>) -> Self {
        Self {
            data: data.into(),
            model_out: model_out.into(),
            report_dir: None,
            test_size: None,
            seed: None,
            models: Vec::new(),
        }
    }
}

/// What a training run produced.
#[derive(Debug, Clone, Serialize)]
pub struct TrainOutcome {
    pub initial_shape: (usize, usize),
    pub cleaning_actions: Vec<String>,
    pub eda: EdaSummary,
    pub report_files: Vec<PathBuf>,
    pub feature_columns: Vec<String>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub results: Vec<ModelResult>,
    pub best_model: ModelKind,
    pub best_metrics: Option<RegressionMetrics>,
    pub model_path: PathBuf,
}

fn build_configs(options: &TrainOptions) -> Result<(PreprocessConfig, TrainerConfig)> {
    let mut preprocess = PreprocessConfig::builder();
    let mut trainer = TrainerConfig::builder();
    if let Some(test_size) = options.test_size {
        preprocess = preprocess.test_size(test_size);
    }
    if let Some(seed) = options.seed {
        preprocess = preprocess.random_seed(seed);
        trainer = trainer.random_seed(seed);
    }
    if !options.models.is_empty() {
        trainer = trainer.model_names(&options.models)?;
    }
    Ok((preprocess.build()?, trainer.build()?))
}

/// Run the full training workflow.
///
/// Configuration is validated before the CSV is read, so an unknown
/// estimator name fails fast. `on_progress` is called after each
/// estimator is evaluated.
pub fn run_training<F>(options: &TrainOptions, on_progress: F) -> Result<TrainOutcome>
where
    F: Fn(ProgressUpdate) + Send + Sync + 'static,
{
    let (preprocess_config, trainer_config) = build_configs(options)?;

    info!("Loading {}", options.data.display());
    let prepared = prepare_frame(&options.data, &preprocess_config, &FeatureEngineer::default())?;
    for action in &prepared.cleaning_actions {
        info!("Cleaning: {}", action);
    }

    let eda = EdaSummary::from_frame(&prepared.frame, &preprocess_config.target_column)?;
    let report_files = match &options.report_dir {
        Some(dir) => eda.write_reports(dir)?,
        None => Vec::new(),
    };

    let data = Preprocessor::new(&preprocess_config).fit(&prepared.frame)?;
    let train_rows = data.x_train.nrows();
    let test_rows = data.x_test.nrows();

    let trainer = ModelTrainer::builder()
        .config(trainer_config)
        .on_progress(on_progress)
        .build();
    let report = trainer.train(&data)?;
    let best_metrics = report.best_result().map(|r| r.metrics);

    let bundle = ModelBundle::new(report.best_model, data.artifacts)?.with_metadata(
        BundleMetadata {
            created_at: Some(Utc::now()),
            metrics: best_metrics,
            training_rows: Some(train_rows),
        },
    );
    bundle.save(&options.model_out)?;

    Ok(TrainOutcome {
        initial_shape: prepared.initial_shape,
        cleaning_actions: prepared.cleaning_actions,
        eda,
        report_files,
        feature_columns: bundle.feature_columns().to_vec(),
        train_rows,
        test_rows,
        results: report.results,
        best_model: report.best_kind,
        best_metrics,
        model_path: options.model_out.clone(),
    })
}
