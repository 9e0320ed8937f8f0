//! The flow document.
//!
//! A `FlowDocument` is the single source of truth for one pipeline being
//! edited: the node list, the edge list, the per-node form data, the
//! selection pointer and the dirty flag. Every mutation goes through it so
//! the adjacency index, the form entries and the dirty flag stay
//! consistent with the graph.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::{self, Display};

use crate::edge::{EdgeId, FlowEdge};
use crate::error::{GraphError, GraphResult};
use crate::form::NodeFormData;
use crate::index::DependencyIndex;
use crate::node::{Dimensions, FlowNode, NodeId, NodeStatus, Position};
use crate::operator::OperatorKind;
use crate::validate::ValidationReport;

/// Value object: Flow ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowId(pub String);

impl FlowId {
    /// Get the string representation of the id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FlowId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Aggregate: one pipeline graph under edit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "DocumentWire")]
pub struct FlowDocument {
    /// Identity of the pipeline this document belongs to
    flow_id: FlowId,

    /// Display name of the pipeline
    name: String,

    /// Nodes in insertion order
    nodes: Vec<FlowNode>,

    /// Edges in insertion order
    edges: Vec<FlowEdge>,

    /// Form data keyed by node id; one entry per live node
    form_data: HashMap<NodeId, NodeFormData>,

    /// Currently selected node, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selected: Option<NodeId>,

    /// Whether the document has mutations not yet persisted
    dirty: bool,

    /// Mutation counter, bumped on every content change
    #[serde(skip)]
    revision: u64,

    /// Adjacency index kept in lockstep with the edge list
    #[serde(skip)]
    index: DependencyIndex,
}

// The index and revision are derived runtime state, so equality is over
// content only.
impl PartialEq for FlowDocument {
    fn eq(&self, other: &Self) -> bool {
        self.flow_id == other.flow_id
            && self.name == other.name
            && self.nodes == other.nodes
            && self.edges == other.edges
            && self.form_data == other.form_data
            && self.selected == other.selected
            && self.dirty == other.dirty
    }
}

impl FlowDocument {
    /// Create an empty document for a pipeline
    pub fn new(flow_id: FlowId, name: impl Into<String>) -> Self {
        Self {
            flow_id,
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            form_data: HashMap::new(),
            selected: None,
            dirty: false,
            revision: 0,
            index: DependencyIndex::default(),
        }
    }

    /// Build a clean document from parts the caller already checked for
    /// consistency. Used by the export layer when rebuilding a document
    /// from a service payload.
    pub(crate) fn assemble(
        flow_id: FlowId,
        name: String,
        nodes: Vec<FlowNode>,
        edges: Vec<FlowEdge>,
        form_data: HashMap<NodeId, NodeFormData>,
    ) -> Self {
        let index = DependencyIndex::from_edges(&edges);
        Self {
            flow_id,
            name,
            nodes,
            edges,
            form_data,
            selected: None,
            dirty: false,
            revision: 0,
            index,
        }
    }

    pub fn flow_id(&self) -> &FlowId {
        &self.flow_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    /// Edges in insertion order
    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    /// Look up a node by id
    pub fn node(&self, node_id: &NodeId) -> Option<&FlowNode> {
        self.nodes.iter().find(|node| &node.id == node_id)
    }

    /// Form data of a node
    pub fn form(&self, node_id: &NodeId) -> Option<&NodeFormData> {
        self.form_data.get(node_id)
    }

    /// Currently selected node, if any
    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    /// Whether the document has mutations not yet persisted
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Current mutation counter. Compared by `mark_saved` so a save only
    /// clears the dirty flag when nothing changed while it was in flight.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Upstream node ids of a node, in edge insertion order
    pub fn depends_on(&self, node_id: &NodeId) -> &[NodeId] {
        self.index.depends_on(node_id)
    }

    /// Downstream node ids of a node, in edge insertion order
    pub fn downstream(&self, node_id: &NodeId) -> &[NodeId] {
        self.index.downstream(node_id)
    }

    /// Number of edges touching a node, in either direction
    pub fn degree(&self, node_id: &NodeId) -> usize {
        self.index.degree(node_id)
    }

    /// First dependency cycle in the graph, if one exists
    pub fn find_cycle(&self) -> Option<Vec<NodeId>> {
        self.index.find_cycle(self.nodes.iter().map(|node| &node.id))
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    fn require_node(&self, node_id: &NodeId) -> GraphResult<&FlowNode> {
        self.node(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))
    }

    fn node_mut(&mut self, node_id: &NodeId) -> GraphResult<&mut FlowNode> {
        self.nodes
            .iter_mut()
            .find(|node| &node.id == node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))
    }

    /// Rename the pipeline itself
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.name != name {
            self.name = name;
            self.touch();
        }
    }

    /// Add a node for an operator dropped from the palette. The node is
    /// seeded with the operator's metadata and a blank form blueprint.
    pub fn add_node(&mut self, kind: OperatorKind, position: Position) -> NodeId {
        let node = FlowNode::from_operator(kind, position);
        let node_id = node.id.clone();
        self.form_data.insert(node_id.clone(), kind.blueprint());
        self.nodes.push(node);
        self.touch();
        node_id
    }

    /// Add a node without an operator type yet
    pub fn add_placeholder(&mut self, position: Position) -> NodeId {
        let node = FlowNode::placeholder(position);
        let node_id = node.id.clone();
        self.form_data.insert(node_id.clone(), NodeFormData::default());
        self.nodes.push(node);
        self.touch();
        node_id
    }

    /// Pick an operator type for a node. Blueprint fields the form does
    /// not hold yet are seeded; values the user already entered are kept.
    pub fn assign_kind(&mut self, node_id: &NodeId, kind: OperatorKind) -> GraphResult<()> {
        self.node_mut(node_id)?.assign_kind(kind);
        let form = self.form_data.entry(node_id.clone()).or_default();
        for (name, value) in kind.blueprint().fields {
            form.fields.entry(name).or_insert(value);
        }
        self.touch();
        Ok(())
    }

    /// Delete a set of nodes as one all-or-nothing cascade.
    ///
    /// Removes exactly the edges touching a deleted node and exactly the
    /// deleted nodes' form data, and clears the selection pointer if it
    /// pointed at one of them. Fails without mutating anything when any
    /// of the ids is unknown.
    pub fn remove_nodes(&mut self, node_ids: &[NodeId]) -> GraphResult<()> {
        for node_id in node_ids {
            self.require_node(node_id)?;
        }
        if node_ids.is_empty() {
            return Ok(());
        }

        let dropped: Vec<FlowEdge> = self
            .edges
            .iter()
            .filter(|edge| node_ids.iter().any(|id| edge.touches(id)))
            .cloned()
            .collect();
        for edge in &dropped {
            self.index.forget(edge);
        }
        self.edges
            .retain(|edge| !node_ids.iter().any(|id| edge.touches(id)));

        for node_id in node_ids {
            self.form_data.remove(node_id);
            if self.selected.as_ref() == Some(node_id) {
                self.selected = None;
            }
        }
        self.nodes.retain(|node| !node_ids.contains(&node.id));

        self.touch();
        Ok(())
    }

    /// Delete one node, cascading per `remove_nodes`
    pub fn remove_node(&mut self, node_id: &NodeId) -> GraphResult<()> {
        self.remove_nodes(std::slice::from_ref(node_id))
    }

    /// Duplicate a node: fresh id, offset position, deep-copied form data.
    /// Edges are never cloned and the copy starts without a task id so it
    /// gets its own on export.
    pub fn clone_node(&mut self, node_id: &NodeId) -> GraphResult<NodeId> {
        let source = self.require_node(node_id)?.clone();
        let mut form = self.form_data.get(node_id).cloned().unwrap_or_default();
        form.task_id = None;
        form.depends_on.clear();

        let mut copy = source;
        copy.id = NodeId::generate();
        copy.position = copy.position.offset_by(32.0, 32.0);
        copy.meta.label = format!("{} copy", copy.meta.label);
        copy.meta.fully_optimized = false;
        copy.status = NodeStatus::Pending;

        let copy_id = copy.id.clone();
        self.form_data.insert(copy_id.clone(), form);
        self.nodes.push(copy);
        self.touch();
        Ok(copy_id)
    }

    /// Rename a node. The new label is stamped into the form data as the
    /// task id so it wins over any previously loaded value at export.
    pub fn rename_node(&mut self, node_id: &NodeId, label: &str) -> GraphResult<()> {
        let node = self.node_mut(node_id)?;
        if node.meta.label == label {
            return Ok(());
        }
        node.meta.label = label.to_string();
        self.form_data
            .entry(node_id.clone())
            .or_default()
            .task_id = Some(label.to_string());
        self.touch();
        Ok(())
    }

    /// Move a node on the canvas
    pub fn move_node(&mut self, node_id: &NodeId, position: Position) -> GraphResult<()> {
        let node = self.node_mut(node_id)?;
        if node.position == position {
            return Ok(());
        }
        node.position = position;
        self.touch();
        Ok(())
    }

    /// Resize a node on the canvas
    pub fn resize_node(&mut self, node_id: &NodeId, dimensions: Dimensions) -> GraphResult<()> {
        let node = self.node_mut(node_id)?;
        if node.dimensions == dimensions {
            return Ok(());
        }
        node.dimensions = dimensions;
        self.touch();
        Ok(())
    }

    /// Set the optimization marker reported by the service
    pub fn set_fully_optimized(&mut self, node_id: &NodeId, value: bool) -> GraphResult<()> {
        let node = self.node_mut(node_id)?;
        if node.meta.fully_optimized == value {
            return Ok(());
        }
        node.meta.fully_optimized = value;
        self.touch();
        Ok(())
    }

    /// Change the selection pointer. Selection is a UI pointer, not
    /// content, so it never marks the document dirty.
    pub fn select(&mut self, node_id: Option<NodeId>) -> GraphResult<()> {
        if let Some(id) = &node_id {
            self.require_node(id)?;
        }
        self.selected = node_id;
        Ok(())
    }

    /// Connect two nodes with a directed edge
    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> GraphResult<EdgeId> {
        if self.node(source).is_none() {
            return Err(GraphError::EndpointMissing(source.clone()));
        }
        if self.node(target).is_none() {
            return Err(GraphError::EndpointMissing(target.clone()));
        }
        if source == target {
            return Err(GraphError::SelfLoop(source.clone()));
        }
        if self.edges.iter().any(|edge| edge.connects(source, target)) {
            return Err(GraphError::DuplicateEdge {
                from: source.clone(),
                to: target.clone(),
            });
        }

        let edge = FlowEdge::between(source.clone(), target.clone());
        let edge_id = edge.id.clone();
        self.index.record(&edge);
        self.edges.push(edge);
        self.touch();
        Ok(edge_id)
    }

    /// Remove one edge
    pub fn disconnect(&mut self, edge_id: &EdgeId) -> GraphResult<()> {
        let at = self
            .edges
            .iter()
            .position(|edge| &edge.id == edge_id)
            .ok_or_else(|| GraphError::EdgeNotFound(edge_id.clone()))?;
        let edge = self.edges.remove(at);
        self.index.forget(&edge);
        self.touch();
        Ok(())
    }

    /// Upsert one form field of a node, leaving every other node's entry
    /// untouched. Returns whether the value actually changed; rewriting
    /// the same value does not dirty the document.
    pub fn set_field(&mut self, node_id: &NodeId, name: &str, value: Value) -> GraphResult<bool> {
        self.require_node(node_id)?;
        let form = self.form_data.entry(node_id.clone()).or_default();
        let changed = form.set_field(name, value);
        if changed {
            self.touch();
        }
        Ok(changed)
    }

    /// Refresh every form's dependency list from the current edge list.
    /// Called by the persistence path right before serializing; stale
    /// values from earlier sessions are never trusted.
    pub fn stamp_dependencies(&mut self) {
        for node in &self.nodes {
            let upstream: Vec<String> = self
                .index
                .depends_on(&node.id)
                .iter()
                .map(|id| id.0.clone())
                .collect();
            if let Some(form) = self.form_data.get_mut(&node.id) {
                form.depends_on = upstream;
            }
        }
    }

    /// Flip node statuses to match a validation report. Status is derived
    /// presentation state, so this does not dirty the document.
    pub fn apply_validation(&mut self, report: &ValidationReport) {
        for node in &mut self.nodes {
            if report.has_errors_for(&node.id) {
                node.status = NodeStatus::Invalid;
            } else if node.status == NodeStatus::Invalid {
                node.refresh_status(false, false);
            }
        }
    }

    /// Record a successful save. Clears the dirty flag only when the
    /// revision still matches the one captured when the save started, so
    /// edits made while the save was in flight stay scheduled for the
    /// next cycle. Returns whether the flag was cleared.
    pub fn mark_saved(&mut self, revision: u64) -> bool {
        if self.revision != revision {
            return false;
        }
        for node in &mut self.nodes {
            node.refresh_status(false, true);
        }
        self.dirty = false;
        true
    }
}

/// Serialized shape of a document, used to rebuild the derived state on
/// load.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentWire {
    flow_id: FlowId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    nodes: Vec<FlowNode>,
    #[serde(default)]
    edges: Vec<FlowEdge>,
    #[serde(default)]
    form_data: HashMap<NodeId, NodeFormData>,
    #[serde(default)]
    selected: Option<NodeId>,
    #[serde(default)]
    dirty: bool,
}

impl TryFrom<DocumentWire> for FlowDocument {
    type Error = String;

    fn try_from(wire: DocumentWire) -> Result<Self, Self::Error> {
        let DocumentWire {
            flow_id,
            name,
            nodes,
            edges,
            mut form_data,
            selected,
            dirty,
        } = wire;

        for edge in &edges {
            for endpoint in [&edge.source, &edge.target] {
                if !nodes.iter().any(|node| &node.id == endpoint) {
                    return Err(format!(
                        "edge {} references missing node {}",
                        edge.id, endpoint
                    ));
                }
            }
        }

        // One form entry per live node, nothing else
        form_data.retain(|node_id, _| nodes.iter().any(|node| &node.id == node_id));
        for node in &nodes {
            form_data.entry(node.id.clone()).or_default();
        }

        let selected = selected.filter(|id| nodes.iter().any(|node| &node.id == id));
        let index = DependencyIndex::from_edges(&edges);

        Ok(Self {
            flow_id,
            name,
            nodes,
            edges,
            form_data,
            selected,
            dirty,
            revision: 0,
            index,
        })
    }
}
