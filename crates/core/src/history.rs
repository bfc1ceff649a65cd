#![forbid(unsafe_code)]

use crate::graph::GraphState;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAP: usize = 50;

/// Bounded linear undo/redo over owned deep copies of the graph.
///
/// Snapshots are captured by the caller before a structural mutation, never
/// for transient visual state. Taking a snapshot clears the redo stack
/// (standard branch invalidation); overflowing the cap evicts the oldest
/// entry instead of failing. History never blocks editing: the empty-stack
/// undo/redo cases are plain no-ops.
#[derive(Clone, Debug)]
pub struct HistoryStack {
    past: VecDeque<GraphState>,
    future: Vec<GraphState>,
    cap: usize,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_HISTORY_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            cap,
        }
    }

    /// Deep-copies `current` onto the past stack. Call before applying a
    /// structural mutation.
    pub fn take_snapshot(&mut self, current: &GraphState) {
        if self.cap == 0 {
            return;
        }
        if self.past.len() == self.cap {
            self.past.pop_front();
        }
        self.past.push_back(current.clone());
        self.future.clear();
    }

    /// Pops the most recent snapshot, parking `current` on the redo stack.
    /// The returned state becomes the live graph.
    pub fn undo(&mut self, current: &GraphState) -> Option<GraphState> {
        let snapshot = self.past.pop_back()?;
        self.future.push(current.clone());
        Some(snapshot)
    }

    pub fn redo(&mut self, current: &GraphState) -> Option<GraphState> {
        let snapshot = self.future.pop()?;
        if self.past.len() == self.cap {
            self.past.pop_front();
        }
        self.past.push_back(current.clone());
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new()
    }
}
