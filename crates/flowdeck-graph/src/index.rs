//! Adjacency index over the edge list.
//!
//! The index is kept in lockstep with edge mutations so upstream and
//! downstream lookups never rescan the edge list. Lists preserve edge
//! insertion order.

use std::collections::{HashMap, HashSet};

use crate::edge::FlowEdge;
use crate::node::NodeId;

/// Incoming and outgoing adjacency per node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyIndex {
    /// target -> sources, in edge insertion order
    incoming: HashMap<NodeId, Vec<NodeId>>,

    /// source -> targets, in edge insertion order
    outgoing: HashMap<NodeId, Vec<NodeId>>,
}

impl DependencyIndex {
    /// Build an index from scratch over an edge list
    pub fn from_edges(edges: &[FlowEdge]) -> Self {
        let mut index = Self::default();
        for edge in edges {
            index.record(edge);
        }
        index
    }

    /// Add one edge to the index
    pub fn record(&mut self, edge: &FlowEdge) {
        self.incoming
            .entry(edge.target.clone())
            .or_default()
            .push(edge.source.clone());
        self.outgoing
            .entry(edge.source.clone())
            .or_default()
            .push(edge.target.clone());
    }

    /// Remove one edge from the index. Entries left empty are dropped so
    /// a rebuilt index compares equal to an incrementally maintained one.
    pub fn forget(&mut self, edge: &FlowEdge) {
        if let Some(sources) = self.incoming.get_mut(&edge.target) {
            if let Some(at) = sources.iter().position(|id| id == &edge.source) {
                sources.remove(at);
            }
            if sources.is_empty() {
                self.incoming.remove(&edge.target);
            }
        }
        if let Some(targets) = self.outgoing.get_mut(&edge.source) {
            if let Some(at) = targets.iter().position(|id| id == &edge.target) {
                targets.remove(at);
            }
            if targets.is_empty() {
                self.outgoing.remove(&edge.source);
            }
        }
    }

    /// Upstream node ids of the given node: the sources of every edge
    /// terminating at it.
    pub fn depends_on(&self, node_id: &NodeId) -> &[NodeId] {
        self.incoming
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Downstream node ids of the given node
    pub fn downstream(&self, node_id: &NodeId) -> &[NodeId] {
        self.outgoing
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of edges touching the node, in either direction
    pub fn degree(&self, node_id: &NodeId) -> usize {
        self.depends_on(node_id).len() + self.downstream(node_id).len()
    }

    /// Walk the graph from the given starting order and return the first
    /// cycle found, as the node sequence with the entry node repeated at
    /// the end. Returns None for acyclic graphs.
    pub fn find_cycle<'a, I>(&'a self, order: I) -> Option<Vec<NodeId>>
    where
        I: IntoIterator<Item = &'a NodeId>,
    {
        let mut visited: HashSet<&NodeId> = HashSet::new();
        for start in order {
            if visited.contains(start) {
                continue;
            }
            let mut path: Vec<&NodeId> = Vec::new();
            let mut on_path: HashSet<&NodeId> = HashSet::new();
            if let Some(cycle) = self.visit(start, &mut visited, &mut path, &mut on_path) {
                return Some(cycle);
            }
        }
        None
    }

    fn visit<'a>(
        &'a self,
        node: &'a NodeId,
        visited: &mut HashSet<&'a NodeId>,
        path: &mut Vec<&'a NodeId>,
        on_path: &mut HashSet<&'a NodeId>,
    ) -> Option<Vec<NodeId>> {
        visited.insert(node);
        on_path.insert(node);
        path.push(node);

        for next in self.downstream(node) {
            if on_path.contains(next) {
                // Back edge: the cycle is the path tail from `next` onward
                let entry = path.iter().position(|id| *id == next).unwrap_or(0);
                let mut cycle: Vec<NodeId> =
                    path[entry..].iter().map(|id| (*id).clone()).collect();
                cycle.push(next.clone());
                return Some(cycle);
            }
            if !visited.contains(next) {
                if let Some(cycle) = self.visit(next, visited, path, on_path) {
                    return Some(cycle);
                }
            }
        }

        path.pop();
        on_path.remove(node);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: &str, target: &str) -> FlowEdge {
        FlowEdge::between(NodeId::from(source), NodeId::from(target))
    }

    #[test]
    fn test_depends_on_matches_incoming_edges() {
        let edges = vec![edge("a", "c"), edge("b", "c"), edge("c", "d")];
        let index = DependencyIndex::from_edges(&edges);

        assert_eq!(
            index.depends_on(&NodeId::from("c")),
            &[NodeId::from("a"), NodeId::from("b")]
        );
        assert_eq!(index.depends_on(&NodeId::from("a")), &[] as &[NodeId]);
        assert_eq!(index.downstream(&NodeId::from("c")), &[NodeId::from("d")]);
    }

    #[test]
    fn test_record_preserves_insertion_order() {
        let mut index = DependencyIndex::default();
        index.record(&edge("b", "z"));
        index.record(&edge("a", "z"));
        index.record(&edge("c", "z"));

        assert_eq!(
            index.depends_on(&NodeId::from("z")),
            &[NodeId::from("b"), NodeId::from("a"), NodeId::from("c")]
        );
    }

    #[test]
    fn test_forget_removes_only_the_given_edge() {
        let first = edge("a", "c");
        let second = edge("b", "c");
        let mut index = DependencyIndex::default();
        index.record(&first);
        index.record(&second);

        index.forget(&first);

        assert_eq!(index.depends_on(&NodeId::from("c")), &[NodeId::from("b")]);
        assert_eq!(index.degree(&NodeId::from("a")), 0);
    }

    #[test]
    fn test_incremental_equals_rebuilt() {
        let edges = vec![edge("a", "b"), edge("b", "c"), edge("a", "c")];
        let mut incremental = DependencyIndex::default();
        for e in &edges {
            incremental.record(e);
        }

        assert_eq!(incremental, DependencyIndex::from_edges(&edges));

        // Dropping an edge keeps the two construction paths in agreement
        incremental.forget(&edges[1]);
        let remaining = vec![edges[0].clone(), edges[2].clone()];
        assert_eq!(incremental, DependencyIndex::from_edges(&remaining));
    }

    #[test]
    fn test_degree_counts_both_directions() {
        let edges = vec![edge("a", "b"), edge("b", "c")];
        let index = DependencyIndex::from_edges(&edges);

        assert_eq!(index.degree(&NodeId::from("b")), 2);
        assert_eq!(index.degree(&NodeId::from("a")), 1);
        assert_eq!(index.degree(&NodeId::from("lonely")), 0);
    }

    #[test]
    fn test_find_cycle_on_acyclic_graph() {
        let edges = vec![edge("a", "b"), edge("b", "c"), edge("a", "c")];
        let index = DependencyIndex::from_edges(&edges);
        let order = [NodeId::from("a"), NodeId::from("b"), NodeId::from("c")];

        assert_eq!(index.find_cycle(order.iter()), None);
    }

    #[test]
    fn test_find_cycle_reports_the_loop() {
        let edges = vec![edge("a", "b"), edge("b", "c"), edge("c", "a")];
        let index = DependencyIndex::from_edges(&edges);
        let order = [NodeId::from("a"), NodeId::from("b"), NodeId::from("c")];

        let cycle = index.find_cycle(order.iter()).unwrap();
        assert_eq!(
            cycle,
            vec![
                NodeId::from("a"),
                NodeId::from("b"),
                NodeId::from("c"),
                NodeId::from("a")
            ]
        );
    }

    #[test]
    fn test_find_cycle_ignores_disconnected_parts() {
        let edges = vec![edge("a", "b"), edge("x", "y"), edge("y", "x")];
        let index = DependencyIndex::from_edges(&edges);
        let order = [
            NodeId::from("a"),
            NodeId::from("b"),
            NodeId::from("x"),
            NodeId::from("y"),
        ];

        let cycle = index.find_cycle(order.iter()).unwrap();
        assert_eq!(cycle.first(), cycle.last());
        assert!(cycle.contains(&NodeId::from("x")));
    }
}
