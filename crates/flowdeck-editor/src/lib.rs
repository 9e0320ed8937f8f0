//! Flowdeck Editor - Editing sessions for Flowdeck pipelines
//!
//! This crate ties the graph model, the local cache and the pipeline
//! service client together into an editing session: user actions go in,
//! validation results and saved pipelines come out. Sessions recover
//! unsaved work from the cache and push changes to the service on a
//! background auto-save cadence.

#![forbid(unsafe_code)]

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use flowdeck_client::{HttpPipelineClient, StaticTokenProvider, TokenProvider};
use flowdeck_store::{memory::InMemoryFlowCache, FlowCache};

/// Editor actions
pub mod actions;
/// Editor configuration
pub mod config;
/// Error types
pub mod error;
/// Editing sessions
pub mod session;

mod autosave;

// Re-export key types
pub use actions::EditorAction;
pub use config::EditorConfig;
pub use error::{EditorError, EditorResult};
pub use session::{EditorSession, Notice, SaveStatus, SessionState, Severity};

pub use flowdeck_graph::{FlowDocument, FlowId};

/// Initialize logging for the editor process.
pub fn init_logging(config: &EditorConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Create the flow cache named by the configuration.
pub fn create_flow_cache(config: &EditorConfig) -> EditorResult<Arc<dyn FlowCache>> {
    if config.cache_url.starts_with("memory://") {
        info!("Using in-memory flow cache");
        Ok(Arc::new(InMemoryFlowCache::new()))
    } else {
        Err(EditorError::Config(format!(
            "Unsupported cache URL: {}",
            config.cache_url
        )))
    }
}

/// Open an editing session for a flow using the configured service
/// client and cache.
pub async fn open_session(config: &EditorConfig, flow_id: FlowId) -> EditorResult<EditorSession> {
    let tokens: Arc<dyn TokenProvider> = match &config.api_token {
        Some(token) => Arc::new(StaticTokenProvider::new(token.clone())),
        None => Arc::new(StaticTokenProvider::anonymous()),
    };

    let api = Arc::new(HttpPipelineClient::new(
        config.api_url.clone(),
        tokens,
        config.request_timeout(),
    )?);
    let cache = create_flow_cache(config)?;

    EditorSession::open(flow_id, config, api, cache).await
}
