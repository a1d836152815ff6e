//! Single-row views of a video: the raw analytics record and its engineered form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column names of the analytics CSV and the derived features.
pub mod columns {
    pub const VIDEO_ID: &str = "video_id";
    pub const DATE: &str = "date";
    pub const VIEWS: &str = "views";
    pub const LIKES: &str = "likes";
    pub const COMMENTS: &str = "comments";
    pub const WATCH_TIME: &str = "watch_time_minutes";
    pub const VIDEO_LENGTH: &str = "video_length_minutes";
    pub const SUBSCRIBERS: &str = "subscribers";
    pub const AD_REVENUE: &str = "ad_revenue_usd";
    pub const CATEGORY: &str = "category";
    pub const DEVICE: &str = "device";
    pub const COUNTRY: &str = "country";

    pub const ENGAGEMENT: &str = "engagement";
    pub const WATCH_TIME_PER_VIEW: &str = "watch_time_per_view";
    pub const VIDEO_AGE_DAYS: &str = "video_age_days";
    pub const LENGTH_TO_WATCH_RATIO: &str = "length_to_watch_ratio";

    /// Columns coerced to numbers during cleaning.
    pub const RAW_NUMERIC: [&str; 7] = [
        VIEWS,
        LIKES,
        COMMENTS,
        WATCH_TIME,
        VIDEO_LENGTH,
        SUBSCRIBERS,
        AD_REVENUE,
    ];

    pub const CATEGORICAL: [&str; 3] = [CATEGORY, DEVICE, COUNTRY];
}

/// One video as it appears in the analytics table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub views: Option<f64>,
    pub likes: Option<f64>,
    pub comments: Option<f64>,
    pub watch_time_minutes: Option<f64>,
    pub video_length_minutes: Option<f64>,
    pub subscribers: Option<f64>,
    pub category: Option<String>,
    pub device: Option<String>,
    pub country: Option<String>,
    /// Only present in training data.
    pub ad_revenue_usd: Option<f64>,
}

/// A [`VideoRecord`] with the derived feature columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineeredRecord {
    #[serde(flatten)]
    pub raw: VideoRecord,
    pub engagement: Option<f64>,
    pub watch_time_per_view: Option<f64>,
    pub video_age_days: Option<f64>,
    pub length_to_watch_ratio: Option<f64>,
}

impl EngineeredRecord {
    /// Numeric feature values by column name. The target is not a feature.
    pub fn numeric_fields(&self) -> [(&'static str, Option<f64>); 10] {
        let raw = &self.raw;
        [
            (columns::VIEWS, raw.views),
            (columns::LIKES, raw.likes),
            (columns::COMMENTS, raw.comments),
            (columns::WATCH_TIME, raw.watch_time_minutes),
            (columns::VIDEO_LENGTH, raw.video_length_minutes),
            (columns::SUBSCRIBERS, raw.subscribers),
            (columns::ENGAGEMENT, self.engagement),
            (columns::WATCH_TIME_PER_VIEW, self.watch_time_per_view),
            (columns::VIDEO_AGE_DAYS, self.video_age_days),
            (columns::LENGTH_TO_WATCH_RATIO, self.length_to_watch_ratio),
        ]
    }

    /// Categorical values by column name.
    pub fn categorical_fields(&self) -> [(&'static str, Option<&str>); 3] {
        let raw = &self.raw;
        [
            (columns::CATEGORY, raw.category.as_deref()),
            (columns::DEVICE, raw.device.as_deref()),
            (columns::COUNTRY, raw.country.as_deref()),
        ]
    }

    pub fn numeric(&self, name: &str) -> Option<f64> {
        self.numeric_fields()
            .into_iter()
            .find(|(field, _)| *field == name)
            .and_then(|(_, value)| value)
    }
}
