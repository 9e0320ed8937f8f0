//! In-memory implementation of FlowCache
//!
//! This implementation is primarily intended for testing and development
//! purposes. All cached flows are lost when the instance is dropped.

use crate::{flow_key, FlowCache, StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use flowdeck_graph::{FlowDocument, FlowId};

/// In-memory implementation of FlowCache
///
/// Documents are stored as serialized blobs behind the same key scheme
/// the durable backends use, so the round trip through serialization is
/// exercised even in tests.
#[derive(Debug, Clone)]
pub struct InMemoryFlowCache {
    flows: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryFlowCache {
    /// Create a new in-memory flow cache
    pub fn new() -> Self {
        Self {
            flows: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryFlowCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlowCache for InMemoryFlowCache {
    async fn store_flow(&self, flow_id: &FlowId, document: &FlowDocument) -> StoreResult<()> {
        let key = flow_key(flow_id);
        let data = serde_json::to_vec(document).map_err(StoreError::Serialization)?;

        let mut store = self.flows.write().await;
        store.insert(key, data);
        debug!(%flow_id, "Cached flow document");

        Ok(())
    }

    async fn load_flow(&self, flow_id: &FlowId) -> StoreResult<FlowDocument> {
        let key = flow_key(flow_id);
        let store = self.flows.read().await;

        match store.get(&key) {
            Some(data) => {
                let document = serde_json::from_slice(data).map_err(StoreError::Serialization)?;
                Ok(document)
            }
            None => Err(StoreError::FlowNotFound(flow_id.clone())),
        }
    }

    async fn flow_exists(&self, flow_id: &FlowId) -> StoreResult<bool> {
        let key = flow_key(flow_id);
        let store = self.flows.read().await;

        Ok(store.contains_key(&key))
    }

    async fn remove_flow(&self, flow_id: &FlowId) -> StoreResult<()> {
        let key = flow_key(flow_id);
        let mut store = self.flows.write().await;
        store.remove(&key);
        debug!(%flow_id, "Removed cached flow document");

        Ok(())
    }

    async fn list_flow_ids(&self) -> StoreResult<Vec<String>> {
        let store = self.flows.read().await;
        let prefix = "flow-";

        let flow_ids = store
            .keys()
            .filter_map(|key| key.strip_prefix(prefix).map(|stripped| stripped.to_string()))
            .collect();

        Ok(flow_ids)
    }
}
