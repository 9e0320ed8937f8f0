//! Error types for the editor crate.

use thiserror::Error;

use flowdeck_client::ClientError;
use flowdeck_graph::GraphError;
use flowdeck_store::StoreError;

/// Errors surfaced by an editing session.
#[derive(Error, Debug)]
pub enum EditorError {
    /// A graph operation failed.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// The local cache failed.
    #[error("Cache error: {0}")]
    Store(#[from] StoreError),

    /// Talking to the pipeline service failed.
    #[error("Pipeline service error: {0}")]
    Client(#[from] ClientError),

    /// The editor configuration is unusable.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use flowdeck_graph::NodeId;

    #[test]
    fn test_graph_errors_convert() {
        let err: EditorError = GraphError::NodeNotFound(NodeId::from("n1")).into();
        assert!(matches!(err, EditorError::Graph(_)));
        assert!(err.to_string().contains("n1"));
    }

    #[test]
    fn test_client_errors_convert() {
        let err: EditorError = ClientError::Unauthorized.into();
        assert!(matches!(err, EditorError::Client(_)));
    }
}
