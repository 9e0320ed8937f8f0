//! Conversion between flow documents and the pipeline service payload.
//!
//! The service consumes a flat task list ordered left to right on the
//! canvas, with dependencies materialized per task. The payload carries
//! enough of the graph that a document can be rebuilt from it, which is
//! how remotely loaded pipelines come back onto the canvas.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::document::{FlowDocument, FlowId};
use crate::edge::FlowEdge;
use crate::error::{GraphError, GraphResult};
use crate::form::NodeFormData;
use crate::node::{Dimensions, FlowNode, NodeId, NodeMeta, NodeStatus, Position};
use crate::operator::OperatorKind;

/// One task as the pipeline service sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    /// Canvas node id the task came from
    pub id: NodeId,

    /// Task identifier within the pipeline
    pub task_id: String,

    /// Operator kind
    #[serde(rename = "type")]
    pub kind: OperatorKind,

    /// Display label
    pub label: String,

    /// Canvas position, kept so the layout survives a reload
    #[serde(default)]
    pub position: Position,

    /// Upstream task ids. Always materialized, even when empty.
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Marker set by the service once the task has been optimized
    #[serde(default)]
    pub fully_optimized: bool,

    /// Operator field values
    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
}

/// Body sent to the pipeline service on create and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelinePayload {
    /// Pipeline display name
    pub name: String,

    /// Tasks ordered by canvas x position
    pub tasks: Vec<TaskSpec>,
}

/// Serialize a document into the service payload.
///
/// Every node must have an operator type; dependencies are recomputed
/// from the current edge list rather than read from the forms; tasks are
/// emitted left to right by canvas x position, with ties keeping node
/// insertion order.
pub fn build_payload(document: &FlowDocument) -> GraphResult<PipelinePayload> {
    let mut tasks = Vec::with_capacity(document.nodes().len());
    for node in document.nodes() {
        let kind = node.kind.ok_or_else(|| GraphError::UntypedNode {
            node_id: node.id.clone(),
            label: node.meta.label.clone(),
        })?;

        let form = document.form(&node.id);
        let task_id = form
            .and_then(|form| form.task_id.clone())
            .unwrap_or_else(|| node.meta.label.clone());
        let depends_on = document
            .depends_on(&node.id)
            .iter()
            .map(|id| id.0.clone())
            .collect();

        tasks.push(TaskSpec {
            id: node.id.clone(),
            task_id,
            kind,
            label: node.meta.label.clone(),
            position: node.position,
            depends_on,
            fully_optimized: node.meta.fully_optimized,
            fields: form.map(|form| form.fields.clone()).unwrap_or_default(),
        });
    }

    tasks.sort_by(|a, b| a.position.x.total_cmp(&b.position.x));

    Ok(PipelinePayload {
        name: document.name().to_string(),
        tasks,
    })
}

impl PipelinePayload {
    /// Rebuild a canvas document from a service payload. Tasks become
    /// saved nodes and their dependency lists become edges; a dependency
    /// naming a task that is not part of the payload is rejected.
    pub fn into_document(self, flow_id: FlowId) -> GraphResult<FlowDocument> {
        let mut nodes = Vec::with_capacity(self.tasks.len());
        let mut edges = Vec::new();
        let mut form_data = HashMap::with_capacity(self.tasks.len());

        for task in &self.tasks {
            for dep in &task.depends_on {
                let dep_id = NodeId(dep.clone());
                if !self.tasks.iter().any(|other| other.id == dep_id) {
                    return Err(GraphError::EndpointMissing(dep_id));
                }
                edges.push(FlowEdge::between(dep_id, task.id.clone()));
            }
        }

        for task in self.tasks {
            let spec = task.kind.spec();
            nodes.push(FlowNode {
                id: task.id.clone(),
                kind: Some(task.kind),
                meta: NodeMeta {
                    label: task.label,
                    module: Some(spec.module),
                    color: Some(spec.module.color().to_string()),
                    icon: Some(spec.icon.to_string()),
                    fully_optimized: task.fully_optimized,
                },
                position: task.position,
                dimensions: Dimensions::default(),
                status: NodeStatus::Saved,
            });
            form_data.insert(
                task.id,
                NodeFormData {
                    task_id: Some(task.task_id),
                    depends_on: task.depends_on,
                    fields: task.fields,
                },
            );
        }

        Ok(FlowDocument::assemble(
            flow_id,
            self.name,
            nodes,
            edges,
            form_data,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn configured_doc() -> (FlowDocument, NodeId, NodeId) {
        let mut doc = FlowDocument::new(FlowId::from("flow-1"), "Orders sync");
        let writer = doc.add_node(OperatorKind::Writer, Position::new(400.0, 0.0));
        let reader = doc.add_node(OperatorKind::Reader, Position::new(0.0, 0.0));
        doc.connect(&reader, &writer).unwrap();
        doc.set_field(&reader, "connection", json!("warehouse")).unwrap();
        doc.set_field(&reader, "table", json!("sales.orders")).unwrap();
        doc.set_field(&writer, "connection", json!("lake")).unwrap();
        doc.set_field(&writer, "table", json!("sales.orders_raw")).unwrap();
        (doc, reader, writer)
    }

    #[test]
    fn test_tasks_ordered_by_canvas_x() {
        let (doc, reader, writer) = configured_doc();

        let payload = build_payload(&doc).unwrap();

        // Writer was added first, but the reader sits further left
        assert_eq!(payload.name, "Orders sync");
        assert_eq!(payload.tasks[0].id, reader);
        assert_eq!(payload.tasks[1].id, writer);
    }

    #[test]
    fn test_dependencies_come_from_edges_not_forms() {
        let (mut doc, reader, writer) = configured_doc();
        doc.stamp_dependencies();
        // A later edit invalidates the stamped lists
        let sql = doc.add_node(OperatorKind::Sql, Position::new(200.0, 0.0));
        doc.set_field(&sql, "statement", json!("select 1")).unwrap();
        doc.connect(&sql, &writer).unwrap();

        let payload = build_payload(&doc).unwrap();

        let writer_task = payload.tasks.iter().find(|t| t.id == writer).unwrap();
        assert_eq!(writer_task.depends_on, vec![reader.0.clone(), sql.0.clone()]);
    }

    #[test]
    fn test_task_id_falls_back_to_label() {
        let (mut doc, reader, writer) = configured_doc();
        doc.rename_node(&reader, "orders_reader").unwrap();

        let payload = build_payload(&doc).unwrap();

        assert_eq!(payload.tasks[0].task_id, "orders_reader");
        // Never renamed: the palette label stands in
        let writer_task = payload.tasks.iter().find(|t| t.id == writer).unwrap();
        assert_eq!(writer_task.task_id, "Writer");
    }

    #[test]
    fn test_untyped_node_is_rejected() {
        let (mut doc, reader, _) = configured_doc();
        let blank = doc.add_placeholder(Position::new(600.0, 0.0));
        doc.connect(&reader, &blank).unwrap();

        let err = build_payload(&doc).unwrap_err();
        assert_eq!(
            err,
            GraphError::UntypedNode {
                node_id: blank,
                label: "New task".to_string()
            }
        );
    }

    #[test]
    fn test_depends_on_materialized_even_when_empty() {
        let (doc, _, _) = configured_doc();

        let value = serde_json::to_value(build_payload(&doc).unwrap()).unwrap();

        assert_eq!(value["tasks"][0]["dependsOn"], json!([]));
        assert_eq!(value["tasks"][0]["taskId"], "Reader");
        assert_eq!(value["tasks"][0]["type"], "reader");
        assert_eq!(value["tasks"][0]["connection"], "warehouse");
    }

    #[test]
    fn test_payload_rebuilds_document() {
        let (mut doc, reader, writer) = configured_doc();
        doc.rename_node(&reader, "orders_reader").unwrap();

        let payload = build_payload(&doc).unwrap();
        let rebuilt = payload.into_document(FlowId::from("flow-1")).unwrap();

        assert!(!rebuilt.is_dirty());
        assert_eq!(rebuilt.nodes().len(), 2);
        assert_eq!(rebuilt.depends_on(&writer), &[reader.clone()]);

        let node = rebuilt.node(&reader).unwrap();
        assert_eq!(node.kind, Some(OperatorKind::Reader));
        assert_eq!(node.meta.label, "orders_reader");
        assert_eq!(node.status, NodeStatus::Saved);
        assert_eq!(node.position, Position::new(0.0, 0.0));

        let form = rebuilt.form(&reader).unwrap();
        assert_eq!(form.task_id, Some("orders_reader".to_string()));
        assert_eq!(form.field("table"), Some(&json!("sales.orders")));
    }

    #[test]
    fn test_rebuild_rejects_unknown_dependency() {
        let payload = PipelinePayload {
            name: "broken".to_string(),
            tasks: vec![TaskSpec {
                id: NodeId::from("a"),
                task_id: "a".to_string(),
                kind: OperatorKind::Union,
                label: "Union".to_string(),
                position: Position::default(),
                depends_on: vec!["ghost".to_string()],
                fully_optimized: false,
                fields: HashMap::new(),
            }],
        };

        let err = payload.into_document(FlowId::from("flow-1")).unwrap_err();
        assert_eq!(err, GraphError::EndpointMissing(NodeId::from("ghost")));
    }
}
