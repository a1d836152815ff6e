//! Application configuration, resolved once at startup.
//!
//! Values come from the environment (a `.env` file is honored by the
//! binary) and are overridden by command-line flags:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `MODEL_PATH` | `models/best_model.json` |
//! | `YT_CACHE_FILE` | `data/yt_cache.json` |
//! | `YT_API_KEY` | none |
//! | `YT_REGION` | `US` |

use serde::Serialize;
use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "models/best_model.json";
pub const DEFAULT_CACHE_FILE: &str = "data/yt_cache.json";
pub const DEFAULT_REGION: &str = "US";

pub const ENV_MODEL_PATH: &str = "MODEL_PATH";
pub const ENV_CACHE_FILE: &str = "YT_CACHE_FILE";
pub const ENV_API_KEY: &str = "YT_API_KEY";
pub const ENV_REGION: &str = "YT_REGION";

/// Paths and credentials shared by the commands.
#[derive(Clone, PartialEq, Serialize)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub cache_file: PathBuf,
    #[serde(skip)]
    pub api_key: Option<String>,
    pub region: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("model_path", &self.model_path)
            .field("cache_file", &self.cache_file)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            api_key: None,
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl AppConfig {
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Configuration from the process environment alone.
    pub fn from_env() -> Result<Self, ConfigValidationError> {
        AppConfigBuilder::from_env().build()
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.model_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyPath(ENV_MODEL_PATH));
        }
        if self.cache_file.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyPath(ENV_CACHE_FILE));
        }

        let region = self.region.as_str();
        if region.len() != 2 || !region.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigValidationError::InvalidRegion(self.region.clone()));
        }
        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("{0} must not be empty")]
    EmptyPath(&'static str),

    #[error("Invalid region code '{0}' (expected two letters, e.g. US)")]
    InvalidRegion(String),
}

/// Builder for [`AppConfig`].
#[derive(Debug, Default, Clone)]
pub struct AppConfigBuilder {
    model_path: Option<PathBuf>,
    cache_file: Option<PathBuf>,
    api_key: Option<String>,
    region: Option<String>,
}

impl AppConfigBuilder {
    /// Prefill from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Prefill from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            model_path: get(ENV_MODEL_PATH).map(PathBuf::from),
            cache_file: get(ENV_CACHE_FILE).map(PathBuf::from),
            api_key: get(ENV_API_KEY),
            region: get(ENV_REGION),
        }
    }

    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    pub fn cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = Some(path.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Build and validate. The region is upper-cased.
    pub fn build(self) -> Result<AppConfig, ConfigValidationError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            model_path: self.model_path.unwrap_or(defaults.model_path),
            cache_file: self.cache_file.unwrap_or(defaults.cache_file),
            api_key: self.api_key,
            region: self
                .region
                .map(|r| r.trim().to_uppercase())
                .unwrap_or(defaults.region),
        };
        config.validate()?;
        Ok(config)
    }
}
