//! Node types for the pipeline graph.
//!
//! A node is one operator instance placed on the canvas. A freshly dropped
//! node may start without an operator type (a placeholder) and gains its
//! kind, palette metadata and form blueprint once the user picks one.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use uuid::Uuid;

use crate::operator::{ModuleKind, OperatorKind};

/// Value object: Node ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    /// Generate a fresh random node id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the string representation of the id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Canvas position of a node, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Position shifted by the given amount, used when cloning nodes
    pub fn offset_by(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Rendered size of a node on the canvas, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        // Default card size used by the canvas
        Self {
            width: 160.0,
            height: 48.0,
        }
    }
}

/// Node status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Node exists but is not fully configured yet
    #[default]
    Pending,

    /// Operator type chosen and the node passed validation
    Configured,

    /// Node was part of a successfully persisted pipeline
    Saved,

    /// Node currently has validation errors
    Invalid,
}

/// Display metadata carried by a node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMeta {
    /// Human readable label shown on the canvas
    pub label: String,

    /// Palette module the node was dropped from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleKind>,

    /// Accent color, as a CSS color string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Icon name for the canvas renderer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Marker set by the service once the task has been optimized
    #[serde(default, rename = "fullyOptimized")]
    pub fully_optimized: bool,
}

/// One operator instance placed on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    /// Unique identifier
    pub id: NodeId,

    /// Operator kind; None until the user picks one
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<OperatorKind>,

    /// Display metadata
    #[serde(default)]
    pub meta: NodeMeta,

    /// Canvas position
    #[serde(default)]
    pub position: Position,

    /// Rendered size
    #[serde(default)]
    pub dimensions: Dimensions,

    /// Current status
    #[serde(default)]
    pub status: NodeStatus,
}

impl FlowNode {
    /// Create a node for the given operator kind, seeded with the
    /// operator's palette metadata.
    pub fn from_operator(kind: OperatorKind, position: Position) -> Self {
        let spec = kind.spec();
        Self {
            id: NodeId::generate(),
            kind: Some(kind),
            meta: NodeMeta {
                label: spec.label.to_string(),
                module: Some(spec.module),
                color: Some(spec.module.color().to_string()),
                icon: Some(spec.icon.to_string()),
                fully_optimized: false,
            },
            position,
            dimensions: Dimensions::default(),
            status: NodeStatus::Pending,
        }
    }

    /// Create a placeholder node with no operator type yet
    pub fn placeholder(position: Position) -> Self {
        Self {
            id: NodeId::generate(),
            kind: None,
            meta: NodeMeta {
                label: "New task".to_string(),
                ..NodeMeta::default()
            },
            position,
            dimensions: Dimensions::default(),
            status: NodeStatus::Pending,
        }
    }

    /// Whether the node still has no operator type
    pub fn is_untyped(&self) -> bool {
        self.kind.is_none()
    }

    /// Assign an operator kind to a placeholder, refreshing the palette
    /// metadata but keeping any user-chosen label.
    pub fn assign_kind(&mut self, kind: OperatorKind) {
        let spec = kind.spec();
        if self.meta.label.is_empty() || self.meta.label == "New task" {
            self.meta.label = spec.label.to_string();
        }
        self.meta.module = Some(spec.module);
        self.meta.color = Some(spec.module.color().to_string());
        self.meta.icon = Some(spec.icon.to_string());
        self.kind = Some(kind);
    }

    /// Recompute the status from the latest validation and save outcome.
    ///
    /// A node with errors is Invalid regardless of its previous status and
    /// returns to a regular status once the errors clear.
    pub fn refresh_status(&mut self, has_errors: bool, saved: bool) {
        self.status = if has_errors {
            NodeStatus::Invalid
        } else if saved {
            NodeStatus::Saved
        } else if self.kind.is_some() {
            NodeStatus::Configured
        } else {
            NodeStatus::Pending
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_node_carries_palette_metadata() {
        let node = FlowNode::from_operator(OperatorKind::Reader, Position::new(100.0, 40.0));

        assert_eq!(node.kind, Some(OperatorKind::Reader));
        assert_eq!(node.meta.label, "Reader");
        assert!(node.meta.module.is_some());
        assert!(node.meta.color.is_some());
        assert_eq!(node.status, NodeStatus::Pending);
        assert!(!node.is_untyped());
    }

    #[test]
    fn test_placeholder_has_no_kind() {
        let node = FlowNode::placeholder(Position::default());

        assert!(node.is_untyped());
        assert_eq!(node.meta.label, "New task");
        assert_eq!(node.meta.module, None);
    }

    #[test]
    fn test_assign_kind_keeps_user_label() {
        let mut node = FlowNode::placeholder(Position::default());
        node.meta.label = "daily orders".to_string();

        node.assign_kind(OperatorKind::Sql);

        assert_eq!(node.kind, Some(OperatorKind::Sql));
        assert_eq!(node.meta.label, "daily orders");
        assert!(node.meta.icon.is_some());
    }

    #[test]
    fn test_assign_kind_replaces_default_label() {
        let mut node = FlowNode::placeholder(Position::default());

        node.assign_kind(OperatorKind::Writer);

        assert_eq!(node.meta.label, "Writer");
    }

    #[test]
    fn test_status_refresh_cycle() {
        let mut node = FlowNode::from_operator(OperatorKind::Filter, Position::default());

        node.refresh_status(true, false);
        assert_eq!(node.status, NodeStatus::Invalid);

        // Errors cleared, not yet saved
        node.refresh_status(false, false);
        assert_eq!(node.status, NodeStatus::Configured);

        node.refresh_status(false, true);
        assert_eq!(node.status, NodeStatus::Saved);
    }

    #[test]
    fn test_untyped_node_returns_to_pending() {
        let mut node = FlowNode::placeholder(Position::default());

        node.refresh_status(true, false);
        assert_eq!(node.status, NodeStatus::Invalid);

        node.refresh_status(false, false);
        assert_eq!(node.status, NodeStatus::Pending);
    }

    #[test]
    fn test_node_serializes_with_camel_case_wire_names() {
        let node = FlowNode::from_operator(OperatorKind::Reader, Position::new(1.0, 2.0));
        let value = serde_json::to_value(&node).unwrap();

        assert_eq!(value["type"], "reader");
        assert_eq!(value["meta"]["fullyOptimized"], false);
        assert_eq!(value["position"]["x"], 1.0);

        let back: FlowNode = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
    }
}
