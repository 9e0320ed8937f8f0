//! Editor configuration.
//!
//! Configuration is loaded from environment variables with sensible
//! defaults, so the editor can start with nothing but an API URL.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EditorError, EditorResult};

/// Configuration for an editor process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Base URL of the pipeline service.
    #[serde(default)]
    pub api_url: String,

    /// Bearer token for the pipeline service, if any.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Seconds between auto-save cycles. Zero disables auto-save.
    #[serde(default = "default_autosave_secs")]
    pub autosave_secs: u64,

    /// URL of the local flow cache, e.g. `memory://local`.
    #[serde(default = "default_cache_url")]
    pub cache_url: String,

    /// Log level filter.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Timeout for individual HTTP requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_token: None,
            autosave_secs: default_autosave_secs(),
            cache_url: default_cache_url(),
            log_level: default_log_level(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl EditorConfig {
    /// Load configuration from environment variables.
    pub fn load() -> EditorResult<Self> {
        let mut config = Self::default();

        if let Ok(url) = env::var("FLOWDECK_API_URL") {
            config.api_url = url;
        }

        if let Ok(token) = env::var("FLOWDECK_API_TOKEN") {
            if !token.is_empty() {
                config.api_token = Some(token);
            }
        }

        if let Ok(secs) = env::var("FLOWDECK_AUTOSAVE_SECS") {
            match secs.parse() {
                Ok(value) => config.autosave_secs = value,
                Err(_) => warn!("Invalid FLOWDECK_AUTOSAVE_SECS value: {}", secs),
            }
        }

        if let Ok(url) = env::var("FLOWDECK_CACHE_URL") {
            config.cache_url = url;
        }

        if let Ok(level) = env::var("FLOWDECK_LOG_LEVEL") {
            config.log_level = level;
        }

        if let Ok(secs) = env::var("FLOWDECK_REQUEST_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(value) => config.request_timeout_secs = value,
                Err(_) => warn!("Invalid FLOWDECK_REQUEST_TIMEOUT_SECS value: {}", secs),
            }
        }

        if config.api_url.is_empty() {
            return Err(EditorError::Config(
                "FLOWDECK_API_URL must be set".to_string(),
            ));
        }

        if config.api_token.is_none() {
            warn!("No API token configured, requests will be anonymous");
        }

        info!("Loaded editor configuration");
        Ok(config)
    }

    /// Auto-save period, or `None` when auto-save is disabled.
    pub fn autosave_period(&self) -> Option<Duration> {
        if self.autosave_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.autosave_secs))
        }
    }

    /// Timeout applied to individual HTTP requests.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_autosave_secs() -> u64 {
    10
}

fn default_cache_url() -> String {
    "memory://local".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}
