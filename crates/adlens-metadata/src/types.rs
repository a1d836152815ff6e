//! Normalized metadata records and the raw API response shapes.

use crate::duration::parse_iso_duration_minutes;
use crate::error::{MetadataError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Public metadata of one video, flattened from the API response.
///
/// Field names match the cache file so entries written by earlier tooling
/// stay readable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
    #[serde(rename = "categoryId")]
    pub category_id: Option<String>,
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
    #[serde(rename = "viewCount")]
    pub view_count: Option<u64>,
    #[serde(rename = "likeCount")]
    pub like_count: Option<u64>,
    #[serde(rename = "commentCount")]
    pub comment_count: Option<u64>,
    /// `None` when the duration is missing or unparseable.
    pub duration_minutes: Option<f64>,
}

/// Cached channel statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    #[serde(rename = "subscriberCount")]
    pub subscriber_count: Option<u64>,
}

/// Category id to display name for one region.
pub type CategoryMap = BTreeMap<String, String>;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoItem {
    #[serde(default)]
    pub snippet: VideoSnippet,
    #[serde(default)]
    pub statistics: VideoStatistics,
    #[serde(default)]
    pub content_details: ContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoSnippet {
    pub title: Option<String>,
    pub published_at: Option<String>,
    pub category_id: Option<String>,
    pub channel_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoStatistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub comment_count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ContentDetails {
    pub duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChannelItem {
    #[serde(default)]
    pub statistics: ChannelStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChannelStatistics {
    pub subscriber_count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CategoryItem {
    pub id: Option<String>,
    #[serde(default)]
    pub snippet: CategorySnippet,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CategorySnippet {
    pub title: Option<String>,
}

/// Counts arrive as decimal strings.
pub(crate) fn parse_count(field: &str, value: Option<&str>) -> Result<Option<u64>> {
    value
        .map(|v| {
            v.trim().parse::<u64>().map_err(|_| {
                MetadataError::InvalidResponse(format!("{} is not a count: '{}'", field, v))
            })
        })
        .transpose()
}

impl VideoItem {
    pub(crate) fn into_metadata(self, video_id: &str) -> Result<VideoMetadata> {
        Ok(VideoMetadata {
            video_id: video_id.to_string(),
            title: self.snippet.title,
            published_at: self.snippet.published_at,
            category_id: self.snippet.category_id,
            channel_id: self.snippet.channel_id,
            view_count: parse_count("viewCount", self.statistics.view_count.as_deref())?,
            like_count: parse_count("likeCount", self.statistics.like_count.as_deref())?,
            comment_count: parse_count("commentCount", self.statistics.comment_count.as_deref())?,
            duration_minutes: self
                .content_details
                .duration
                .as_deref()
                .and_then(parse_iso_duration_minutes),
        })
    }
}
