//! HTTP seam between the fetcher and the network.

use crate::error::{MetadataError, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Issues one GET request and returns the decoded JSON body.
///
/// Implementations must treat any non-success status as an error and must
/// not retry.
pub trait Transport: Send + Sync {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value>;
}

/// Blocking `reqwest` transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| MetadataError::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let response = self.client.get(url).query(query).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(MetadataError::Http {
                status: status.as_u16(),
                message: api_error_message(&body).unwrap_or(body),
            });
        }

        response
            .json::<Value>()
            .map_err(|e| MetadataError::InvalidResponse(e.without_url().to_string()))
    }
}

/// The `error.message` field of an API error body, if present.
fn api_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string)
}
