//! Flowdeck Store
//!
//! Provides abstractions and implementations for the local flow cache.
//! The FlowCache trait defines a contract for persisting flow documents
//! between editing sessions, including unsaved work that never reached
//! the pipeline service.

use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

use flowdeck_graph::{FlowDocument, FlowId};

pub mod memory;

pub use memory::InMemoryFlowCache;

/// Cache key of a flow document. Every backend uses the same scheme so
/// cached work survives a backend swap.
pub fn flow_key(flow_id: &FlowId) -> String {
    format!("flow-{}", flow_id)
}

/// Errors raised by flow cache operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cache backend error: {0}")]
    Backend(#[from] anyhow::Error),

    #[error("Flow not found in cache: {0}")]
    FlowNotFound(FlowId),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether this error is a cache miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::FlowNotFound(_))
    }
}

/// Result type for flow cache operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait defining the contract for flow cache implementations
#[async_trait]
pub trait FlowCache: Send + Sync + Debug {
    /// Persist a flow document, replacing any previous entry for the
    /// same flow
    async fn store_flow(&self, flow_id: &FlowId, document: &FlowDocument) -> StoreResult<()>;

    /// Load the cached document of a flow
    async fn load_flow(&self, flow_id: &FlowId) -> StoreResult<FlowDocument>;

    /// Check whether a flow has a cached document
    async fn flow_exists(&self, flow_id: &FlowId) -> StoreResult<bool>;

    /// Drop the cached document of a flow. Removing a flow that is not
    /// cached is a no-op.
    async fn remove_flow(&self, flow_id: &FlowId) -> StoreResult<()>;

    /// List the ids of all cached flows
    async fn list_flow_ids(&self) -> StoreResult<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_key_format() {
        let key = flow_key(&FlowId::from("42"));
        assert_eq!(key, "flow-42");
    }

    #[test]
    fn test_not_found_helper() {
        let err = StoreError::FlowNotFound(FlowId::from("42"));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Flow not found in cache: 42");

        let err = StoreError::Backend(anyhow::anyhow!("socket closed"));
        assert!(!err.is_not_found());
    }
}
