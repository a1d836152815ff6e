//! End-to-end tests of loading, cleaning, feature engineering and fitting
//! against small CSV fixtures.

use adlens_processing::utils::column_f64;
use adlens_processing::{
    AgeReference, AlignMode, EdaSummary, EngineeredRecord, FeatureEngineer, FeatureSchema,
    PreprocessConfig, Preprocessor, VideoRecord, prepare_frame,
};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn close(a: Option<f64>, b: f64) -> bool {
    a.is_some_and(|a| (a - b).abs() < 1e-12)
}

// ============================================================================
// Feature Engineering
// ============================================================================

#[test]
fn test_zero_views_row_keeps_row_count() {
    let config = PreprocessConfig::default();
    let prepared = prepare_frame(fixture("three_rows.csv"), &config, &FeatureEngineer::default())
        .unwrap();

    assert_eq!(prepared.initial_shape.0, 3);
    assert_eq!(prepared.frame.height(), 3);

    let engagement = column_f64(&prepared.frame, "engagement").unwrap();
    assert!(close(engagement[0], 0.07));
    assert_eq!(engagement[1], None);
    assert!(close(engagement[2], 0.016));

    let per_view = column_f64(&prepared.frame, "watch_time_per_view").unwrap();
    assert_eq!(per_view[1], None);
    assert!(per_view.iter().all(|v| v.is_none_or(f64::is_finite)));
}

#[test]
fn test_video_age_against_batch_max() {
    let config = PreprocessConfig::default();
    let prepared = prepare_frame(fixture("three_rows.csv"), &config, &FeatureEngineer::default())
        .unwrap();

    let ages = column_f64(&prepared.frame, "video_age_days").unwrap();
    assert_eq!(ages, vec![Some(9.0), Some(5.0), Some(0.0)]);
}

#[test]
fn test_video_age_against_fixed_reference() {
    let config = PreprocessConfig::default();
    let reference = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    let engineer = FeatureEngineer::new(AgeReference::Fixed(reference));
    let prepared = prepare_frame(fixture("three_rows.csv"), &config, &engineer).unwrap();

    let ages = column_f64(&prepared.frame, "video_age_days").unwrap();
    assert_eq!(ages, vec![Some(30.0), Some(26.0), Some(21.0)]);
}

#[test]
fn test_unparseable_date_is_reported_with_row() {
    let config = PreprocessConfig::default();
    let err = prepare_frame(fixture("bad_date.csv"), &config, &FeatureEngineer::default())
        .unwrap_err();

    assert_eq!(err.error_code(), "INVALID_DATE");
    assert!(err.to_string().contains("Row 2"));
    assert!(err.to_string().contains("someday"));
}

#[test]
fn test_table_and_record_paths_agree() {
    let config = PreprocessConfig::default();
    let prepared = prepare_frame(fixture("three_rows.csv"), &config, &FeatureEngineer::default())
        .unwrap();
    let table = column_f64(&prepared.frame, "length_to_watch_ratio").unwrap();

    let record = VideoRecord {
        views: Some(1000.0),
        likes: Some(50.0),
        comments: Some(20.0),
        watch_time_minutes: Some(3000.0),
        video_length_minutes: Some(10.0),
        ..Default::default()
    };
    let single = FeatureEngineer::default().engineer_record(&record);
    assert_eq!(single.length_to_watch_ratio, table[0]);
}

// ============================================================================
// Cleaning
// ============================================================================

#[test]
fn test_messy_fixture_cleaning() {
    let config = PreprocessConfig::default();
    let prepared =
        prepare_frame(fixture("messy.csv"), &config, &FeatureEngineer::default()).unwrap();

    // One duplicate removed, empty notes column dropped
    assert_eq!(prepared.frame.height(), 5);
    assert!(prepared.frame.column("notes").is_err());
    assert!(
        prepared
            .cleaning_actions
            .iter()
            .any(|a| a.contains("duplicate"))
    );

    // "n/a" coerced to missing
    let views = column_f64(&prepared.frame, "views").unwrap();
    assert_eq!(views.iter().filter(|v| v.is_none()).count(), 1);
}

// ============================================================================
// Preprocessing + Schema
// ============================================================================

#[test]
fn test_fit_then_align_matches_feature_columns() {
    let config = PreprocessConfig::default();
    let prepared =
        prepare_frame(fixture("messy.csv"), &config, &FeatureEngineer::default()).unwrap();
    let data = Preprocessor::new(&config).fit(&prepared.frame).unwrap();

    // v003 has no target and is dropped: 4 rows, ceil(0.8) = 1 test row
    assert_eq!(data.x_train.nrows() + data.x_test.nrows(), 4);
    assert_eq!(data.x_test.nrows(), 1);

    let columns = data.feature_columns().to_vec();
    assert!(!columns.contains(&"video_id".to_string()));
    assert!(!columns.contains(&"date".to_string()));
    assert!(!columns.contains(&"ad_revenue_usd".to_string()));
    assert!(columns.contains(&"engagement".to_string()));
    assert!(columns.contains(&"device_TV".to_string()));

    let numeric_count = data.artifacts.numeric.len();
    assert!(
        columns[numeric_count..]
            .iter()
            .all(|c| c.starts_with("category_") || c.starts_with("device_") || c.starts_with("country_"))
    );
    assert_eq!(
        data.artifacts.reference_date,
        NaiveDate::from_ymd_opt(2024, 2, 7)
    );

    let schema = FeatureSchema::from_artifacts(&data.artifacts).unwrap();
    let row = EngineeredRecord {
        raw: VideoRecord {
            views: Some(1200.0),
            category: Some("Cooking".to_string()),
            device: Some("TV".to_string()),
            country: Some("US".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    for mode in [AlignMode::Raw, AlignMode::Standardized] {
        let vector = schema.align(&row, mode);
        assert_eq!(vector.len(), columns.len());
        assert!(vector.iter().all(|v| v.is_finite()));
    }

    let raw = schema.align(&row, AlignMode::Raw);
    let device_tv = columns.iter().position(|c| c == "device_TV").unwrap();
    assert_eq!(raw[device_tv], 1.0);
    let category_sum: f64 = columns
        .iter()
        .zip(&raw)
        .filter(|(c, _)| c.starts_with("category_"))
        .map(|(_, v)| v)
        .sum();
    assert_eq!(category_sum, 0.0);
}

#[test]
fn test_artifacts_round_trip_through_json() {
    let config = PreprocessConfig::default();
    let prepared = prepare_frame(fixture("three_rows.csv"), &config, &FeatureEngineer::default())
        .unwrap();
    let data = Preprocessor::new(&config).fit(&prepared.frame).unwrap();

    let json = serde_json::to_string(&data.artifacts).unwrap();
    let restored: adlens_processing::Artifacts = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.feature_columns, data.artifacts.feature_columns);
    assert_eq!(restored.categorical, data.artifacts.categorical);
    assert_eq!(restored.reference_date, data.artifacts.reference_date);
    assert!(FeatureSchema::from_artifacts(&restored).is_ok());
}

#[test]
fn test_eda_summary_of_engineered_frame() {
    let config = PreprocessConfig::default();
    let prepared = prepare_frame(fixture("three_rows.csv"), &config, &FeatureEngineer::default())
        .unwrap();
    let summary = EdaSummary::from_frame(&prepared.frame, &config.target_column).unwrap();

    assert_eq!(summary.rows, 3);
    let engagement = summary
        .missing
        .iter()
        .find(|m| m.column == "engagement")
        .unwrap();
    assert!((engagement.percent - 100.0 / 3.0).abs() < 1e-9);
    assert!(summary.correlation.is_some());
}
