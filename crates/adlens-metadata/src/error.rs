//! Error types for the adlens-metadata crate.

use thiserror::Error;

/// Errors from video-id parsing, the metadata API and the cache.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MetadataError {
    /// No API key was configured.
    #[error("YouTube API key not provided. Set YT_API_KEY or pass --api-key.")]
    MissingApiKey,

    /// The input is neither a recognized video URL nor a bare video id.
    #[error("Could not extract a video id from '{0}'")]
    InvalidVideoId(String),

    /// The request could not be sent or the response could not be read.
    #[error("Network error: {0}")]
    Network(String),

    /// The API answered with a non-success status.
    #[error("YouTube API error {status}: {message}")]
    Http {
        status: u16,
        message: String,
    },

    /// The API answered with a body that does not have the expected shape.
    #[error("Unexpected API response: {0}")]
    InvalidResponse(String),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The cache file could not be read or written.
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MetadataError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "MISSING_API_KEY",
            Self::InvalidVideoId(_) => "INVALID_VIDEO_ID",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Http { .. } => "HTTP_ERROR",
            Self::InvalidResponse(_) => "INVALID_RESPONSE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// Failures on the remote side or on the way to it.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Http { .. } | Self::InvalidResponse(_)
        )
    }
}

impl From<reqwest::Error> for MetadataError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key
        Self::Network(err.without_url().to_string())
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(MetadataError::MissingApiKey.error_code(), "MISSING_API_KEY");
        let http = MetadataError::Http {
            status: 403,
            message: "quotaExceeded".to_string(),
        };
        assert_eq!(http.error_code(), "HTTP_ERROR");
        assert!(http.is_upstream());
        assert_eq!(http.to_string(), "YouTube API error 403: quotaExceeded");
        assert!(!MetadataError::InvalidVideoId("x".to_string()).is_upstream());
    }
}
