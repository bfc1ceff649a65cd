#![forbid(unsafe_code)]

use super::{Edge, EdgeKey};
use std::collections::HashMap;

/// Enforces the at-most-one-edge-per-key invariant over an edge list.
///
/// When several edges share a dedup key, the one latest in the list (most
/// recently added or updated) wins. Survivors keep their original relative
/// order, and running the pass twice yields the same result as once.
pub fn dedup_edges(edges: Vec<Edge>) -> Vec<Edge> {
    let mut winner: HashMap<EdgeKey, usize> = HashMap::with_capacity(edges.len());
    for (index, edge) in edges.iter().enumerate() {
        winner.insert(edge.dedup_key(), index);
    }

    edges
        .into_iter()
        .enumerate()
        .filter_map(|(index, edge)| {
            if winner.get(&edge.dedup_key()) == Some(&index) {
                Some(edge)
            } else {
                None
            }
        })
        .collect()
}
