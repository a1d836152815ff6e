//! adlens-metadata: public video metadata for revenue estimates.
//!
//! - [`extract_video_id`] accepts watch, short, embed and legacy URLs or a
//!   bare 11-character id
//! - [`YouTubeFetcher`] looks up video statistics, channel subscribers and
//!   category names, consulting a [`MetadataCache`] first
//! - [`Transport`] is the HTTP seam; [`ReqwestTransport`] is the blocking
//!   production implementation

pub mod cache;
pub mod duration;
pub mod error;
pub mod fetcher;
pub mod transport;
pub mod types;
pub mod video_id;

pub use cache::{
    CacheBackend, CacheEntry, Clock, JsonFileBackend, MemoryBackend, MetadataCache, SystemClock,
    TtlPolicy,
};
pub use duration::parse_iso_duration_minutes;
pub use error::{MetadataError, Result};
pub use fetcher::{YouTubeConfig, YouTubeConfigBuilder, YouTubeFetcher};
pub use transport::{ReqwestTransport, Transport};
pub use types::{CategoryMap, ChannelStats, VideoMetadata};
pub use video_id::extract_video_id;

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(YouTubeFetcher: Send, Sync);
    static_assertions::assert_impl_all!(MetadataCache: Send, Sync);
}
