#![forbid(unsafe_code)]

use super::{Edge, EdgeData, FrameMetaPatch, FrameNode, dedup_edges};
use crate::ids;
use std::collections::BTreeSet;

/// The authoritative in-memory graph for one open project.
///
/// Every operation is synchronous and total: apart from the duplicate-id
/// check on [`GraphState::add_node`], malformed or stale ids are treated as
/// no-ops, never errors, because concurrent UI events (a drag-release racing
/// a delete) are expected to arrive out of order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphState {
    pub nodes: Vec<FrameNode>,
    pub edges: Vec<Edge>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphError {
    DuplicateId(String),
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "duplicate node id: {id}"),
        }
    }
}

impl std::error::Error for GraphError {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemoveReport {
    pub nodes_removed: usize,
    pub edges_removed: usize,
}

impl GraphState {
    pub fn from_parts(nodes: Vec<FrameNode>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&FrameNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    pub fn add_node(&mut self, node: FrameNode) -> Result<(), GraphError> {
        if self.node(&node.id).is_some() {
            return Err(GraphError::DuplicateId(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Removes matching nodes and cascade-deletes every edge whose source
    /// or target is in `ids`. Selection state referencing removed ids is
    /// the caller's to clear.
    pub fn remove_nodes(&mut self, ids: &BTreeSet<String>) -> RemoveReport {
        let nodes_before = self.nodes.len();
        self.nodes.retain(|node| !ids.contains(&node.id));

        let edges_before = self.edges.len();
        self.edges
            .retain(|edge| !ids.contains(&edge.source) && !ids.contains(&edge.target));

        RemoveReport {
            nodes_removed: nodes_before - self.nodes.len(),
            edges_removed: edges_before - self.edges.len(),
        }
    }

    /// Shallow-merges `patch` into the node's meta. Returns false (no-op,
    /// not an error) when the id is absent: the editing UI may race a
    /// deletion.
    pub fn update_node_meta(&mut self, id: &str, patch: FrameMetaPatch) -> bool {
        match self.nodes.iter_mut().find(|node| node.id == id) {
            Some(node) => {
                patch.apply(&mut node.meta);
                true
            }
            None => false,
        }
    }

    /// Creates a manual edge with default styling between two existing
    /// nodes and inserts it through the dedup policy (a colliding edge is
    /// replaced, not duplicated). Returns the new edge id, or None when
    /// either endpoint is unknown.
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
        source_handle: Option<String>,
        target_handle: Option<String>,
    ) -> Option<String> {
        if self.node(source).is_none() || self.node(target).is_none() {
            return None;
        }

        let edge = Edge {
            id: ids::edge_id(source, target),
            source: source.to_string(),
            target: target.to_string(),
            source_handle,
            target_handle,
            label: None,
            data: EdgeData::default(),
        };
        let id = edge.id.clone();

        let mut edges = std::mem::take(&mut self.edges);
        edges.push(edge);
        self.edges = dedup_edges(edges);
        Some(id)
    }

    /// Moves an existing edge to new endpoints, keeping its label and data
    /// but regenerating its id from the new `(source, target)` pair. The
    /// reconnected edge counts as most recently updated for dedup purposes.
    /// Returns the new id, or None when the edge or an endpoint is unknown.
    pub fn reconnect(
        &mut self,
        edge_id: &str,
        new_source: &str,
        new_target: &str,
        new_source_handle: Option<String>,
        new_target_handle: Option<String>,
    ) -> Option<String> {
        if self.node(new_source).is_none() || self.node(new_target).is_none() {
            return None;
        }
        let index = self.edges.iter().position(|edge| edge.id == edge_id)?;

        let existing = self.edges.remove(index);
        let edge = Edge {
            id: ids::edge_id(new_source, new_target),
            source: new_source.to_string(),
            target: new_target.to_string(),
            source_handle: new_source_handle,
            target_handle: new_target_handle,
            label: existing.label,
            data: existing.data,
        };
        let id = edge.id.clone();

        let mut edges = std::mem::take(&mut self.edges);
        edges.push(edge);
        self.edges = dedup_edges(edges);
        Some(id)
    }

    /// Plain edge removal, no cascade.
    pub fn remove_edges(&mut self, ids: &BTreeSet<String>) -> usize {
        let before = self.edges.len();
        self.edges.retain(|edge| !ids.contains(&edge.id));
        before - self.edges.len()
    }
}
