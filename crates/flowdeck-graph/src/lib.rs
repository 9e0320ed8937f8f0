//!
//! Flowdeck Graph - Pipeline graph model for the Flowdeck editor
//!
//! This crate holds the pure data model of a pipeline under edit: the
//! flow document aggregate, the operator catalog, structural validation
//! and the conversion to and from the pipeline service payload. It has
//! no IO; persistence and transport live in the sibling crates.

#![forbid(unsafe_code)]

/// Flow document aggregate and its mutations
pub mod document;

/// Stream connections between nodes
pub mod edge;

/// Error types
pub mod error;

/// Conversion to and from the pipeline service payload
pub mod export;

/// Per-node form data
pub mod form;

/// Incremental adjacency index
pub mod index;

/// Canvas nodes
pub mod node;

/// Operator catalog and field declarations
pub mod operator;

/// Search and debug overlay state
pub mod overlay;

/// Structural validation rules
pub mod validate;

// Re-export key types
pub use document::{FlowDocument, FlowId};
pub use edge::{EdgeId, FlowEdge};
pub use error::{GraphError, GraphResult};
pub use export::{build_payload, PipelinePayload, TaskSpec};
pub use form::NodeFormData;
pub use index::DependencyIndex;
pub use node::{Dimensions, FlowNode, NodeId, NodeMeta, NodeStatus, Position};
pub use operator::{FieldKind, FieldSpec, ModuleKind, OperatorKind, OperatorSpec};
pub use overlay::{DebugChip, DebugState, SearchState};
pub use validate::{validate_document, ValidationIssue, ValidationReport};
