//! Editor actions.
//!
//! Every user gesture in the editor is expressed as an [`EditorAction`]
//! and dispatched through the session. Actions serialize with a `type`
//! tag so a frontend can post them verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use flowdeck_graph::{Dimensions, EdgeId, NodeId, OperatorKind, Position};

/// A single user-level editing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorAction {
    /// Drop a typed operator onto the canvas.
    AddNode {
        kind: OperatorKind,
        position: Position,
    },
    /// Drop an untyped placeholder onto the canvas.
    AddPlaceholder { position: Position },
    /// Delete a set of nodes along with their edges and form data.
    DeleteNodes { ids: Vec<NodeId> },
    /// Duplicate a node next to the original.
    CloneNode { id: NodeId },
    /// Rename a node, keeping its task id in step.
    RenameNode { id: NodeId, label: String },
    /// Move a node on the canvas.
    MoveNode { id: NodeId, position: Position },
    /// Resize a node on the canvas.
    ResizeNode { id: NodeId, dimensions: Dimensions },
    /// Rename the pipeline itself.
    SetName { name: String },
    /// Change or clear the node selection.
    SelectNode { id: Option<NodeId> },
    /// Open a node's configuration form.
    BeginEdit { id: NodeId },
    /// Close the configuration form.
    EndEdit,
    /// Connect two nodes with a stream.
    Connect { source: NodeId, target: NodeId },
    /// Remove a stream connection.
    Disconnect { edge: EdgeId },
    /// Set one field on a node's configuration form.
    SetField {
        id: NodeId,
        name: String,
        value: Value,
    },
    /// Update the label search query.
    SetSearch { query: String },
    /// Jump to the next search match.
    SearchNext,
    /// Jump to the previous search match.
    SearchPrev,
    /// Toggle a node's debug chip.
    ToggleDebug { id: NodeId },
    /// Clear all debug chips.
    ClearDebug,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_use_type_tag() {
        let action = EditorAction::AddNode {
            kind: OperatorKind::Reader,
            position: Position::new(100.0, 40.0),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "addNode");
        assert_eq!(json["kind"], "reader");
        assert_eq!(json["position"]["x"], 100.0);
    }

    #[test]
    fn test_actions_deserialize_from_wire() {
        let action: EditorAction = serde_json::from_str(
            r#"{"type": "connect", "source": "n1", "target": "n2"}"#,
        )
        .unwrap();
        assert_eq!(
            action,
            EditorAction::Connect {
                source: NodeId::from("n1"),
                target: NodeId::from("n2"),
            }
        );
    }

    #[test]
    fn test_unit_actions_round_trip() {
        let json = serde_json::to_string(&EditorAction::EndEdit).unwrap();
        assert_eq!(json, r#"{"type":"endEdit"}"#);

        let action: EditorAction = serde_json::from_str(r#"{"type":"searchNext"}"#).unwrap();
        assert_eq!(action, EditorAction::SearchNext);
    }

    #[test]
    fn test_set_field_carries_any_json_value() {
        let action: EditorAction = serde_json::from_str(
            r#"{"type": "setField", "id": "n1", "name": "amount", "value": 500}"#,
        )
        .unwrap();
        match action {
            EditorAction::SetField { name, value, .. } => {
                assert_eq!(name, "amount");
                assert_eq!(value, Value::from(500));
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }
}
