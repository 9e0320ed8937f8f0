//! Canvas overlay state: node search and debug markers.
//!
//! Both are ephemeral UI state layered over a document. They never dirty
//! the document and are not part of the persisted blob, but they have to
//! be kept consistent with it as nodes are renamed and deleted.

use crate::document::FlowDocument;
use crate::node::NodeId;

/// Incremental node search over the canvas
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    query: String,
    matches: Vec<NodeId>,
    cursor: Option<usize>,
}

impl SearchState {
    /// Current query text
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Whether a search is in progress
    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    /// Matching node ids, in node order
    pub fn matches(&self) -> &[NodeId] {
        &self.matches
    }

    /// The match the cursor sits on, if any
    pub fn current(&self) -> Option<&NodeId> {
        self.cursor.and_then(|at| self.matches.get(at))
    }

    /// One-based cursor position and total match count, for the
    /// "N of M" readout. None while no search is active.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.cursor.map(|at| (at + 1, self.matches.len()))
    }

    /// Replace the query and recompute matches. Labels are matched by
    /// case-insensitive substring; an empty query clears the search.
    pub fn set_query(&mut self, query: impl Into<String>, document: &FlowDocument) {
        self.query = query.into();
        self.matches = find_matches(&self.query, document);
        self.cursor = if self.matches.is_empty() { None } else { Some(0) };
    }

    /// Recompute matches against the current document, keeping the cursor
    /// on the same node when it still matches.
    pub fn refresh(&mut self, document: &FlowDocument) {
        let anchor = self.current().cloned();
        self.matches = find_matches(&self.query, document);
        self.cursor = match anchor.and_then(|id| self.matches.iter().position(|m| *m == id)) {
            Some(at) => Some(at),
            None if self.matches.is_empty() => None,
            None => Some(0),
        };
    }

    /// Advance the cursor, wrapping past the last match
    pub fn next(&mut self) {
        if let Some(at) = self.cursor {
            self.cursor = Some((at + 1) % self.matches.len());
        }
    }

    /// Move the cursor back, wrapping past the first match
    pub fn prev(&mut self) {
        if let Some(at) = self.cursor {
            self.cursor = Some((at + self.matches.len() - 1) % self.matches.len());
        }
    }

    /// Drop the query and all match state
    pub fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
        self.cursor = None;
    }
}

fn find_matches(query: &str, document: &FlowDocument) -> Vec<NodeId> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    document
        .nodes()
        .iter()
        .filter(|node| node.meta.label.to_lowercase().contains(&needle))
        .map(|node| node.id.clone())
        .collect()
}

/// One debug chip rendered over the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct DebugChip {
    pub node_id: NodeId,
    /// Node label, or the raw id when the label is blank
    pub label: String,
}

/// Per-node debug markers, in toggle order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugState {
    enabled: Vec<NodeId>,
}

impl DebugState {
    /// Node ids with debugging enabled, in toggle order
    pub fn enabled(&self) -> &[NodeId] {
        &self.enabled
    }

    /// Whether a node has debugging enabled
    pub fn is_enabled(&self, node_id: &NodeId) -> bool {
        self.enabled.contains(node_id)
    }

    /// Flip the marker for a node. Returns the new state.
    pub fn toggle(&mut self, node_id: &NodeId) -> bool {
        if let Some(at) = self.enabled.iter().position(|id| id == node_id) {
            self.enabled.remove(at);
            false
        } else {
            self.enabled.push(node_id.clone());
            true
        }
    }

    /// Drop all markers
    pub fn clear(&mut self) {
        self.enabled.clear();
    }

    /// Drop markers whose nodes no longer exist
    pub fn prune(&mut self, document: &FlowDocument) {
        self.enabled.retain(|id| document.node(id).is_some());
    }

    /// Chips to render, in toggle order
    pub fn chips(&self, document: &FlowDocument) -> Vec<DebugChip> {
        self.enabled
            .iter()
            .filter_map(|id| document.node(id).map(|node| (id, node)))
            .map(|(id, node)| DebugChip {
                node_id: id.clone(),
                label: if node.meta.label.is_empty() {
                    id.to_string()
                } else {
                    node.meta.label.clone()
                },
            })
            .collect()
    }
}
