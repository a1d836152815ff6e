//! Cached client for the YouTube Data API v3.
//!
//! Every lookup checks the cache first and writes network results back
//! immediately. Network or HTTP failures are returned as-is; nothing is
//! retried.
//!
//! # Example
//!
//! ```rust,ignore
//! use adlens_metadata::{MetadataCache, YouTubeConfig, YouTubeFetcher};
//!
//! let config = YouTubeConfig::builder().api_key(key).region("US").build()?;
//! let fetcher = YouTubeFetcher::new(config, MetadataCache::file("data/yt_cache.json"))?;
//!
//! if let Some(video) = fetcher.fetch_video("dQw4w9WgXcQ")? {
//!     println!("{:?} views", video.view_count);
//! }
//! ```

use crate::cache::{MetadataCache, categories_key, channel_key, video_key};
use crate::error::{MetadataError, Result};
use crate::transport::{DEFAULT_TIMEOUT_SECS, ReqwestTransport, Transport};
use crate::types::{
    CategoryItem, CategoryMap, ChannelItem, ChannelStats, ListResponse, VideoItem, VideoMetadata,
    parse_count,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Default region for the category map.
pub const DEFAULT_REGION: &str = "US";

/// Connection settings for [`YouTubeFetcher`].
#[derive(Clone)]
pub struct YouTubeConfig {
    pub api_key: String,
    pub base_url: String,
    pub region: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for YouTubeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTubeConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("region", &self.region)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl YouTubeConfig {
    pub fn builder() -> YouTubeConfigBuilder {
        YouTubeConfigBuilder::default()
    }
}

/// Builder for [`YouTubeConfig`].
#[derive(Default)]
pub struct YouTubeConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    region: Option<String>,
    timeout_secs: Option<u64>,
}

impl YouTubeConfigBuilder {
    /// Set the API key. Empty or whitespace-only keys count as missing.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the API key if one is available.
    pub fn api_key_opt(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    /// Set a custom base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the region used for category names.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the request timeout in seconds.
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// - [`MetadataError::MissingApiKey`] if no non-empty key was set
    /// - [`MetadataError::InvalidConfig`] for a zero timeout or empty region
    pub fn build(self) -> Result<YouTubeConfig> {
        let api_key = self
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(MetadataError::MissingApiKey)?;

        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(MetadataError::InvalidConfig(
                "timeout_secs must be at least 1".to_string(),
            ));
        }

        let region = self.region.unwrap_or_else(|| DEFAULT_REGION.to_string());
        if region.trim().is_empty() {
            return Err(MetadataError::InvalidConfig(
                "region must not be empty".to_string(),
            ));
        }

        Ok(YouTubeConfig {
            api_key,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            region,
            timeout_secs,
        })
    }
}

/// Fetches video, channel and category metadata through a cache.
pub struct YouTubeFetcher {
    config: YouTubeConfig,
    transport: Box<dyn Transport>,
    cache: MetadataCache,
}

impl YouTubeFetcher {
    /// Fetcher with the blocking `reqwest` transport.
    pub fn new(config: YouTubeConfig, cache: MetadataCache) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout_secs)?;
        Ok(Self::with_transport(config, transport, cache))
    }

    pub fn with_transport(
        config: YouTubeConfig,
        transport: impl Transport + 'static,
        cache: MetadataCache,
    ) -> Self {
        Self {
            config,
            transport: Box::new(transport),
            cache,
        }
    }

    pub fn config(&self) -> &YouTubeConfig {
        &self.config
    }

    /// Snippet, statistics and duration of one video; `None` if the API
    /// returns no item for the id.
    pub fn fetch_video(&self, video_id: &str) -> Result<Option<VideoMetadata>> {
        let key = video_key(video_id);
        if let Some(data) = self.cache.get_fresh(&key)? {
            return Ok(Some(decode_cached(&key, data)?));
        }

        let response: ListResponse<VideoItem> = self.request(
            "videos",
            &[("part", "snippet,contentDetails,statistics"), ("id", video_id)],
        )?;
        let Some(item) = response.items.into_iter().next() else {
            info!("No video found for id {}", video_id);
            return Ok(None);
        };

        let meta = item.into_metadata(video_id)?;
        self.cache.store(&key, serde_json::to_value(&meta)?)?;
        Ok(Some(meta))
    }

    /// Subscriber count of a channel; `None` if the channel is unknown or
    /// hides its count.
    pub fn fetch_channel_subscribers(&self, channel_id: &str) -> Result<Option<u64>> {
        let key = channel_key(channel_id);
        if let Some(data) = self.cache.get_fresh(&key)? {
            let stats: ChannelStats = decode_cached(&key, data)?;
            return Ok(stats.subscriber_count);
        }

        let response: ListResponse<ChannelItem> =
            self.request("channels", &[("part", "statistics"), ("id", channel_id)])?;
        let Some(item) = response.items.into_iter().next() else {
            info!("No channel found for id {}", channel_id);
            return Ok(None);
        };

        let stats = ChannelStats {
            subscriber_count: parse_count(
                "subscriberCount",
                item.statistics.subscriber_count.as_deref(),
            )?,
        };
        self.cache.store(&key, serde_json::to_value(&stats)?)?;
        Ok(stats.subscriber_count)
    }

    /// Category id to name for `region`, or the configured region when
    /// `None`.
    pub fn fetch_category_map(&self, region: Option<&str>) -> Result<CategoryMap> {
        let region = region.unwrap_or(self.config.region.as_str());
        let key = categories_key(region);
        if let Some(data) = self.cache.get_fresh(&key)? {
            return decode_cached(&key, data);
        }

        let response: ListResponse<CategoryItem> = self.request(
            "videoCategories",
            &[("part", "snippet"), ("regionCode", region)],
        )?;
        let map: CategoryMap = response
            .items
            .into_iter()
            .filter_map(|item| Some((item.id?, item.snippet.title?)))
            .filter(|(id, title)| !id.is_empty() && !title.is_empty())
            .collect();

        self.cache.store(&key, serde_json::to_value(&map)?)?;
        Ok(map)
    }

    fn request<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.config.base_url, endpoint);
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("key", self.config.api_key.as_str()));

        debug!("GET {}", url);
        let body = self.transport.get_json(&url, &query)?;
        serde_json::from_value(body)
            .map_err(|e| MetadataError::InvalidResponse(format!("{}: {}", endpoint, e)))
    }
}

fn decode_cached<T: DeserializeOwned>(key: &str, data: Value) -> Result<T> {
    serde_json::from_value(data)
        .map_err(|e| MetadataError::Cache(format!("entry {} is malformed: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            YouTubeConfig::builder().build(),
            Err(MetadataError::MissingApiKey)
        ));
        assert!(matches!(
            YouTubeConfig::builder().api_key("   ").build(),
            Err(MetadataError::MissingApiKey)
        ));
    }

    #[test]
    fn test_config_defaults() {
        let config = YouTubeConfig::builder()
            .api_key("k")
            .base_url("http://localhost:8080/")
            .build()
            .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.region, "US");
        assert_eq!(config.timeout_secs, 10);
        assert!(!format!("{:?}", config).contains("\"k\""));
    }
}
