//! Prediction assembly: raw input to a single revenue estimate.
//!
//! [`PredictionAssembler`] owns a loaded [`ModelBundle`] and the
//! [`FeatureSchema`] derived from its artifacts. Each prediction runs the
//! same three steps the training pipeline ran:
//!
//! 1. feature engineering of one [`VideoRecord`]
//! 2. alignment against the persisted `feature_columns`
//! 3. the estimator's `predict`
//!
//! Inputs come from two places:
//!
//! - **Manual entry** ([`ManualInput`]): watch time is
//!   `video_length_minutes × retention_rate`
//! - **Fetched video** ([`feature_row_from_video`]): watch time is
//!   `views × video_length_minutes × retention_rate`, or `views × 0.02` when
//!   the duration is unknown or zero
//!
//! # Example
//!
//! ```rust,ignore
//! use adlens::{ManualInput, PredictionAssembler};
//!
//! let assembler = PredictionAssembler::load("models/best_model.json")?;
//! let estimate = assembler.predict_manual(&input)?;
//! println!("Estimated revenue: ${:.2}", estimate.revenue_usd);
//! ```
//!
//! # Video age
//!
//! By default a single row is its own batch, so `video_age_days` is 0.
//! [`with_training_cutoff`](PredictionAssembler::with_training_cutoff)
//! measures age against the latest date seen in training instead.

use crate::error::{AppError, Result};
use adlens_learning::ModelBundle;
use adlens_metadata::{CategoryMap, VideoMetadata, YouTubeFetcher, extract_video_id};
use adlens_processing::utils::parse_calendar_date;
use adlens_processing::{AgeReference, AlignMode, FeatureEngineer, FeatureSchema, VideoRecord};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Default share of a video watched by the average viewer.
pub const DEFAULT_RETENTION: f64 = 0.30;

/// Accepted retention range, inclusive.
pub const RETENTION_RANGE: (f64, f64) = (0.05, 0.9);

/// Watch minutes per view assumed when a video's duration is unknown.
pub const FALLBACK_MINUTES_PER_VIEW: f64 = 0.02;

pub const FETCHED_DEVICE: &str = "Mobile";
pub const FETCHED_COUNTRY: &str = "US";
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Check a retention rate against [`RETENTION_RANGE`].
pub fn validate_retention(retention: f64) -> Result<f64> {
    let (low, high) = RETENTION_RANGE;
    if !retention.is_finite() || retention < low || retention > high {
        return Err(AppError::InvalidInput(format!(
            "retention rate must be between {} and {}, got {}",
            low, high, retention
        )));
    }
    Ok(retention)
}

/// Fields entered by hand for a video that may not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManualInput {
    pub views: f64,
    pub likes: f64,
    pub comments: f64,
    pub video_length_minutes: f64,
    pub subscribers: f64,
    pub category: String,
    pub device: String,
    pub country: String,
    pub retention_rate: f64,
    /// Publication date; today when absent.
    pub date: Option<NaiveDate>,
}

impl Default for ManualInput {
    fn default() -> Self {
        Self {
            views: 0.0,
            likes: 0.0,
            comments: 0.0,
            video_length_minutes: 0.0,
            subscribers: 0.0,
            category: String::new(),
            device: String::new(),
            country: String::new(),
            retention_rate: DEFAULT_RETENTION,
            date: None,
        }
    }
}

impl ManualInput {
    /// Reject negative or non-finite counts, blank categorical fields and
    /// an out-of-range retention rate.
    pub fn validate(&self) -> Result<()> {
        let numbers = [
            ("views", self.views),
            ("likes", self.likes),
            ("comments", self.comments),
            ("video length", self.video_length_minutes),
            ("subscribers", self.subscribers),
        ];
        for (field, value) in numbers {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::InvalidInput(format!(
                    "{} must be a non-negative number, got {}",
                    field, value
                )));
            }
        }

        let labels = [
            ("category", &self.category),
            ("device", &self.device),
            ("country", &self.country),
        ];
        for (field, value) in labels {
            if value.trim().is_empty() {
                return Err(AppError::InvalidInput(format!("{} must not be empty", field)));
            }
        }

        validate_retention(self.retention_rate)?;
        Ok(())
    }

    pub fn watch_time_minutes(&self) -> f64 {
        self.video_length_minutes * self.retention_rate
    }

    pub fn to_record(&self, today: NaiveDate) -> VideoRecord {
        VideoRecord {
            date: Some(self.date.unwrap_or(today)),
            views: Some(self.views),
            likes: Some(self.likes),
            comments: Some(self.comments),
            watch_time_minutes: Some(self.watch_time_minutes()),
            video_length_minutes: Some(self.video_length_minutes),
            subscribers: Some(self.subscribers),
            category: Some(self.category.trim().to_string()),
            device: Some(self.device.trim().to_string()),
            country: Some(self.country.trim().to_string()),
            ..Default::default()
        }
    }
}

/// Build a record from fetched public metadata.
pub fn feature_row_from_video(
    meta: &VideoMetadata,
    retention: f64,
    categories: &CategoryMap,
    subscribers: u64,
    today: NaiveDate,
) -> VideoRecord {
    let views = meta.view_count.unwrap_or(0) as f64;
    // Live streams and premieres report a zero duration
    let length = meta.duration_minutes.filter(|minutes| *minutes > 0.0);
    let watch_time = match length {
        Some(length) => views * length * retention,
        None => views * FALLBACK_MINUTES_PER_VIEW,
    };

    let category = match meta.category_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => categories
            .get(id)
            .cloned()
            .unwrap_or_else(|| format!("cat_{}", id)),
        None => UNKNOWN_CATEGORY.to_string(),
    };

    let date = meta
        .published_at
        .as_deref()
        .and_then(parse_calendar_date)
        .unwrap_or(today);

    VideoRecord {
        video_id: Some(meta.video_id.clone()),
        date: Some(date),
        views: Some(views),
        likes: Some(meta.like_count.unwrap_or(0) as f64),
        comments: Some(meta.comment_count.unwrap_or(0) as f64),
        watch_time_minutes: Some(watch_time),
        video_length_minutes: Some(length.unwrap_or(0.0)),
        subscribers: Some(subscribers as f64),
        category: Some(category),
        device: Some(FETCHED_DEVICE.to_string()),
        country: Some(FETCHED_COUNTRY.to_string()),
        ad_revenue_usd: None,
    }
}

/// A revenue estimate and the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub revenue_usd: f64,
    pub record: VideoRecord,
    pub features: Vec<f64>,
}

/// A fetched-video estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoPrediction {
    pub metadata: VideoMetadata,
    pub subscribers: u64,
    pub category: Option<String>,
    pub retention_rate: f64,
    #[serde(flatten)]
    pub prediction: Prediction,
}

/// Turns raw inputs into estimates with one loaded bundle.
#[derive(Debug, Clone)]
pub struct PredictionAssembler {
    bundle: ModelBundle,
    schema: FeatureSchema,
    mode: AlignMode,
    age_reference: AgeReference,
}

impl PredictionAssembler {
    pub fn new(bundle: ModelBundle) -> Result<Self> {
        let schema = FeatureSchema::from_artifacts(&bundle.artifacts)
            .map_err(|e| AppError::Data(e.to_string()))?;
        Ok(Self {
            bundle,
            schema,
            mode: AlignMode::default(),
            age_reference: AgeReference::default(),
        })
    }

    /// Load the bundle at `path`.
    ///
    /// # Errors
    ///
    /// - [`AppError::ModelNotFound`] if there is no file at `path`
    /// - [`AppError::Data`] if the bundle is malformed
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(ModelBundle::load(path)?)
    }

    #[must_use]
    pub fn with_mode(mut self, mode: AlignMode) -> Self {
        self.mode = mode;
        self
    }

    /// Measure video age against the training batch's latest date. Bundles
    /// without a recorded date keep the per-row default.
    #[must_use]
    pub fn with_training_cutoff(mut self) -> Self {
        match self.bundle.artifacts.reference_date {
            Some(date) => self.age_reference = AgeReference::Fixed(date),
            None => warn!("Bundle has no training reference date; video age stays per-row"),
        }
        self
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn feature_columns(&self) -> &[String] {
        self.schema.columns()
    }

    /// Engineer, align and predict one record.
    pub fn predict_record(&self, record: VideoRecord) -> Result<Prediction> {
        let engineered = FeatureEngineer::new(self.age_reference).engineer_record(&record);
        let features = self.schema.align(&engineered, self.mode);
        debug!("Aligned {} features", features.len());

        let revenue_usd = self
            .bundle
            .predict(&features)
            .map_err(|e| AppError::prediction(e, self.feature_columns()))?;

        Ok(Prediction {
            revenue_usd,
            record,
            features,
        })
    }

    /// Validate manual input, then predict it.
    pub fn predict_manual(&self, input: &ManualInput) -> Result<Prediction> {
        input.validate()?;
        self.predict_record(input.to_record(today()))
    }

    /// Fetch a video by URL or id and predict its revenue.
    ///
    /// The id and retention rate are checked before any request. Channel
    /// and category lookups are best effort: on failure the estimate uses
    /// zero subscribers and the `cat_<id>` fallback.
    pub fn predict_video(
        &self,
        fetcher: &YouTubeFetcher,
        url_or_id: &str,
        retention: f64,
        region: Option<&str>,
    ) -> Result<VideoPrediction> {
        let retention = validate_retention(retention)?;
        let video_id = extract_video_id(url_or_id).ok_or_else(|| {
            AppError::InvalidInput(format!("could not find a video id in '{}'", url_or_id.trim()))
        })?;

        let metadata = fetcher
            .fetch_video(&video_id)?
            .ok_or_else(|| AppError::InvalidInput(format!("video '{}' not found", video_id)))?;
        info!(
            "Fetched '{}' ({} views)",
            metadata.title.as_deref().unwrap_or(video_id.as_str()),
            metadata.view_count.unwrap_or(0)
        );

        let subscribers = match metadata.channel_id.as_deref() {
            Some(channel) => match fetcher.fetch_channel_subscribers(channel) {
                Ok(count) => count.unwrap_or(0),
                Err(e) => {
                    warn!("Channel lookup failed, assuming 0 subscribers: {}", e);
                    0
                }
            },
            None => 0,
        };

        let categories = fetcher.fetch_category_map(region).unwrap_or_else(|e| {
            warn!("Category lookup failed, using raw ids: {}", e);
            CategoryMap::new()
        });

        let record = feature_row_from_video(&metadata, retention, &categories, subscribers, today());
        let category = record.category.clone();
        let prediction = self.predict_record(record)?;

        Ok(VideoPrediction {
            metadata,
            subscribers,
            category,
            retention_rate: retention,
            prediction,
        })
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
