//! Error types for the graph model.

use thiserror::Error;

use crate::edge::EdgeId;
use crate::node::NodeId;

/// Errors produced by document and export operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Node lookup failed
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    /// Edge lookup failed
    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),

    /// A connection referenced a node id missing from the node set
    #[error("Connection endpoint {0} is not part of the graph")]
    EndpointMissing(NodeId),

    /// The pair is already connected in this direction. Endpoints avoid
    /// the field name `source`, which thiserror reserves for the cause.
    #[error("Nodes {from} and {to} are already connected")]
    DuplicateEdge { from: NodeId, to: NodeId },

    /// A node cannot stream into itself
    #[error("Node {0} cannot be connected to itself")]
    SelfLoop(NodeId),

    /// Export requires every node to carry an operator type
    #[error("Node '{label}' ({node_id}) has no operator type")]
    UntypedNode { node_id: NodeId, label: String },
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

impl GraphError {
    /// Get a stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            GraphError::NodeNotFound(_) => "ERR_GRAPH_NODE_NOT_FOUND",
            GraphError::EdgeNotFound(_) => "ERR_GRAPH_EDGE_NOT_FOUND",
            GraphError::EndpointMissing(_) => "ERR_GRAPH_ENDPOINT_MISSING",
            GraphError::DuplicateEdge { .. } => "ERR_GRAPH_DUPLICATE_EDGE",
            GraphError::SelfLoop(_) => "ERR_GRAPH_SELF_LOOP",
            GraphError::UntypedNode { .. } => "ERR_GRAPH_UNTYPED_NODE",
        }
    }

    /// Check if the error is a lookup failure
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GraphError::NodeNotFound(_) | GraphError::EdgeNotFound(_)
        )
    }
}
