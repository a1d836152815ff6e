//! Training and bundle persistence against a small analytics CSV.

use adlens_learning::{
    BundleMetadata, LearningError, Model, ModelBundle, ModelKind, ModelTrainer, TrainerConfig,
};
use adlens_processing::{
    AlignMode, FeatureEngineer, FeatureSchema, PreparedData, PreprocessConfig, Preprocessor,
    VideoRecord, prepare_frame,
};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use tempfile::tempdir;

// ============================================================================
// Helper Functions
// ============================================================================

fn prepared() -> PreparedData {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/channel_sample.csv");
    let config = PreprocessConfig::default();
    let frame = prepare_frame(path, &config, &FeatureEngineer::default()).unwrap();
    Preprocessor::new(&config).fit(&frame.frame).unwrap()
}

fn small_config() -> TrainerConfig {
    TrainerConfig::builder()
        .n_estimators(10)
        .boosting_rounds(20)
        .build()
        .unwrap()
}

fn sample_record() -> VideoRecord {
    VideoRecord {
        date: NaiveDate::from_ymd_opt(2024, 2, 15),
        views: Some(1500.0),
        likes: Some(60.0),
        comments: Some(15.0),
        watch_time_minutes: Some(3000.0),
        video_length_minutes: Some(8.0),
        subscribers: Some(4000.0),
        category: Some("Tech".to_string()),
        device: Some("Mobile".to_string()),
        country: Some("US".to_string()),
        ..Default::default()
    }
}

// ============================================================================
// Training
// ============================================================================

#[test]
fn test_trains_every_model_and_picks_lowest_rmse() {
    let data = prepared();
    let report = ModelTrainer::new(small_config()).train(&data).unwrap();

    let kinds: Vec<ModelKind> = report.results.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, ModelKind::ALL.to_vec());

    let lowest = report
        .results
        .iter()
        .map(|r| r.metrics.rmse)
        .fold(f64::INFINITY, f64::min);
    let best = report.best_result().unwrap();
    assert_eq!(best.metrics.rmse, lowest);
    assert_eq!(report.best_model.n_features(), data.feature_columns().len());
}

// ============================================================================
// Bundle Persistence
// ============================================================================

#[test]
fn test_bundle_roundtrip_predicts_the_same() {
    let data = prepared();
    let config = TrainerConfig::builder()
        .models([ModelKind::Ridge])
        .build()
        .unwrap();
    let report = ModelTrainer::new(config).train(&data).unwrap();

    let bundle = ModelBundle::new(report.best_model, data.artifacts.clone())
        .unwrap()
        .with_metadata(BundleMetadata {
            training_rows: Some(data.x_train.nrows()),
            ..Default::default()
        });

    let dir = tempdir().unwrap();
    let path = dir.path().join("models/best_model.json");
    bundle.save(&path).unwrap();
    let loaded = ModelBundle::load(&path).unwrap();

    assert_eq!(loaded.feature_columns(), bundle.feature_columns());
    assert_eq!(loaded.model.kind(), ModelKind::Ridge);
    assert_eq!(loaded.metadata.training_rows, Some(data.x_train.nrows()));

    let engineered = FeatureEngineer::default().engineer_record(&sample_record());
    let schema = FeatureSchema::from_artifacts(&loaded.artifacts).unwrap();
    let row = schema.align(&engineered, AlignMode::Standardized);

    let before = bundle.predict(&row).unwrap();
    let after = loaded.predict(&row).unwrap();
    assert!((before - after).abs() < 1e-9 * before.abs().max(1.0));
}

#[test]
fn test_bundle_rejects_width_mismatch() {
    let data = prepared();
    let model = Model::Ridge(adlens_learning::linear::LinearModel {
        coefficients: vec![1.0; data.feature_columns().len() + 1],
        intercept: 0.0,
    });

    let err = ModelBundle::new(model, data.artifacts).unwrap_err();
    assert!(matches!(err, LearningError::InvalidBundle(_)));
}

#[test]
fn test_load_rejects_malformed_forest_trees() {
    let data = prepared();
    let config = TrainerConfig::builder()
        .models([ModelKind::RandomForest])
        .n_estimators(2)
        .build()
        .unwrap();
    let report = ModelTrainer::new(config).train(&data).unwrap();
    let bundle = ModelBundle::new(report.best_model, data.artifacts.clone()).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("best_model.json");
    bundle.save(&path).unwrap();
    assert!(ModelBundle::load(&path).is_ok());

    let original: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    let edits = [
        serde_json::json!([
            {"type": "split", "feature": 999, "threshold": 0.5, "left": 1, "right": 2},
            {"type": "leaf", "value": 1.0},
            {"type": "leaf", "value": 2.0}
        ]),
        serde_json::json!([
            {"type": "split", "feature": 0, "threshold": 0.5, "left": 1, "right": 9},
            {"type": "leaf", "value": 1.0}
        ]),
        serde_json::json!([
            {"type": "split", "feature": 0, "threshold": 0.5, "left": 1, "right": 2},
            {"type": "split", "feature": 0, "threshold": 0.5, "left": 0, "right": 2},
            {"type": "leaf", "value": 1.0}
        ]),
        serde_json::json!([]),
    ];

    for nodes in edits {
        let mut edited = original.clone();
        edited["model"]["trees"][0]["nodes"] = nodes;
        std::fs::write(&path, serde_json::to_string(&edited).unwrap()).unwrap();

        let err = ModelBundle::load(&path).unwrap_err();
        assert!(matches!(err, LearningError::InvalidBundle(_)), "{}", err);
    }

    let mut edited = original;
    edited["model"]["trees"] = serde_json::json!([]);
    std::fs::write(&path, serde_json::to_string(&edited).unwrap()).unwrap();
    let err = ModelBundle::load(&path).unwrap_err();
    assert!(err.to_string().contains("no trees"));
}

#[test]
fn test_boosted_bundle_roundtrip() {
    let data = prepared();
    let config = TrainerConfig::builder()
        .models([ModelKind::XGBoost])
        .boosting_rounds(10)
        .build()
        .unwrap();
    let report = ModelTrainer::new(config).train(&data).unwrap();
    let bundle = ModelBundle::new(report.best_model, data.artifacts.clone()).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("best_model.json");
    bundle.save(&path).unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["model"]["kind"], "XGBoost");

    let loaded = ModelBundle::load(&path).unwrap();
    assert_eq!(loaded.model.kind(), ModelKind::XGBoost);

    let engineered = FeatureEngineer::default().engineer_record(&sample_record());
    let schema = FeatureSchema::from_artifacts(&loaded.artifacts).unwrap();
    let row = schema.align(&engineered, AlignMode::Standardized);

    let before = bundle.predict(&row).unwrap();
    let after = loaded.predict(&row).unwrap();
    assert!((before - after).abs() < 1e-9 * before.abs().max(1.0));
}
