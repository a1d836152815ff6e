//! Fetcher behaviour against a counting fake transport.

use adlens_metadata::{
    Clock, MetadataCache, MetadataError, Result, Transport, YouTubeConfig, YouTubeFetcher,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tempfile::tempdir;

// ============================================================================
// Fakes
// ============================================================================

/// Serves canned bodies per endpoint and counts requests.
#[derive(Clone, Default)]
struct FakeTransport {
    responses: Arc<Mutex<HashMap<String, Value>>>,
    calls: Arc<AtomicUsize>,
    queries: Arc<Mutex<Vec<Vec<(String, String)>>>>,
}

impl FakeTransport {
    fn respond(&self, endpoint: &str, body: Value) {
        self.responses.lock().insert(endpoint.to_string(), body);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for FakeTransport {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().push(
            query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );

        let endpoint = url.rsplit('/').next().unwrap_or_default();
        match self.responses.lock().get(endpoint) {
            Some(body) => Ok(body.clone()),
            None => Err(MetadataError::Http {
                status: 500,
                message: "backend error".to_string(),
            }),
        }
    }
}

struct ManualClock(AtomicU64);

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.0.load(Ordering::SeqCst) as f64
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn config() -> YouTubeConfig {
    YouTubeConfig::builder()
        .api_key("test-key")
        .base_url("https://api.test/youtube/v3")
        .build()
        .unwrap()
}

fn video_body() -> Value {
    json!({
        "items": [{
            "snippet": {
                "title": "Quarterly update",
                "publishedAt": "2024-03-01T12:00:00Z",
                "categoryId": "28",
                "channelId": "UC_channel"
            },
            "statistics": {"viewCount": "1000", "likeCount": "50", "commentCount": "20"},
            "contentDetails": {"duration": "PT10M"}
        }]
    })
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_cache_round_trip_within_and_after_ttl() {
    let transport = FakeTransport::default();
    transport.respond("videos", video_body());
    let clock = Arc::new(ManualClock(AtomicU64::new(1_700_000_000)));
    let cache = MetadataCache::in_memory().with_clock(clock.clone());
    let fetcher = YouTubeFetcher::with_transport(config(), transport.clone(), cache);

    let first = fetcher.fetch_video("abcdefghijk").unwrap().unwrap();
    assert_eq!(first.view_count, Some(1000));
    assert_eq!(first.duration_minutes, Some(10.0));
    assert_eq!(transport.calls(), 1);

    // Within 24 hours: served from cache
    clock.0.fetch_add(3_600, Ordering::SeqCst);
    let second = fetcher.fetch_video("abcdefghijk").unwrap().unwrap();
    assert_eq!(second, first);
    assert_eq!(transport.calls(), 1);

    // After 24 hours: refetched
    clock.0.fetch_add(86_400, Ordering::SeqCst);
    fetcher.fetch_video("abcdefghijk").unwrap();
    assert_eq!(transport.calls(), 2);
}

#[test]
fn test_request_carries_key_and_parts() {
    let transport = FakeTransport::default();
    transport.respond("videos", video_body());
    let fetcher =
        YouTubeFetcher::with_transport(config(), transport.clone(), MetadataCache::in_memory());

    fetcher.fetch_video("abcdefghijk").unwrap();
    let queries = transport.queries.lock();
    let query: HashMap<_, _> = queries[0].iter().cloned().collect();
    assert_eq!(query["part"], "snippet,contentDetails,statistics");
    assert_eq!(query["id"], "abcdefghijk");
    assert_eq!(query["key"], "test-key");
}

#[test]
fn test_empty_items_is_not_found() {
    let transport = FakeTransport::default();
    transport.respond("videos", json!({"items": []}));
    transport.respond("channels", json!({"kind": "youtube#channelListResponse"}));
    let fetcher =
        YouTubeFetcher::with_transport(config(), transport.clone(), MetadataCache::in_memory());

    assert_eq!(fetcher.fetch_video("abcdefghijk").unwrap(), None);
    assert_eq!(fetcher.fetch_channel_subscribers("UC_none").unwrap(), None);

    // Not-found results are not cached
    fetcher.fetch_video("abcdefghijk").unwrap();
    assert_eq!(transport.calls(), 3);
}

#[test]
fn test_upstream_failure_is_an_error() {
    let transport = FakeTransport::default();
    let fetcher = YouTubeFetcher::with_transport(config(), transport, MetadataCache::in_memory());

    let err = fetcher.fetch_video("abcdefghijk").unwrap_err();
    assert!(err.is_upstream());
    assert_eq!(err.error_code(), "HTTP_ERROR");
}

#[test]
fn test_channel_and_categories() {
    let transport = FakeTransport::default();
    transport.respond(
        "channels",
        json!({"items": [{"statistics": {"subscriberCount": "125000"}}]}),
    );
    transport.respond(
        "videoCategories",
        json!({"items": [
            {"id": "10", "snippet": {"title": "Music"}},
            {"id": "28", "snippet": {"title": "Science & Technology"}},
            {"id": "99"}
        ]}),
    );
    let fetcher =
        YouTubeFetcher::with_transport(config(), transport.clone(), MetadataCache::in_memory());

    assert_eq!(
        fetcher.fetch_channel_subscribers("UC_channel").unwrap(),
        Some(125_000)
    );
    let categories = fetcher.fetch_category_map(None).unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories["28"], "Science & Technology");

    // Both are cached now
    fetcher.fetch_channel_subscribers("UC_channel").unwrap();
    fetcher.fetch_category_map(Some("US")).unwrap();
    assert_eq!(transport.calls(), 2);

    // A different region is a different key
    fetcher.fetch_category_map(Some("IN")).unwrap();
    assert_eq!(transport.calls(), 3);
}

#[test]
fn test_file_cache_survives_new_fetcher() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("yt_cache.json");
    let transport = FakeTransport::default();
    transport.respond("videos", video_body());

    let fetcher = YouTubeFetcher::with_transport(
        config(),
        transport.clone(),
        MetadataCache::file(&path),
    );
    fetcher.fetch_video("abcdefghijk").unwrap();

    let reopened = YouTubeFetcher::with_transport(
        config(),
        transport.clone(),
        MetadataCache::file(&path),
    );
    let cached = reopened.fetch_video("abcdefghijk").unwrap().unwrap();
    assert_eq!(cached.title.as_deref(), Some("Quarterly update"));
    assert_eq!(transport.calls(), 1);

    let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(raw["video:abcdefghijk"]["_fetched_at"].is_number());
    assert_eq!(raw["video:abcdefghijk"]["data"]["viewCount"], 1000);
}
