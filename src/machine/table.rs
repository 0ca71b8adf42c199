//! Transition table: which targets are legal from each state.

use crate::core::State;
use std::collections::HashMap;
use tracing::debug;

/// Mapping from a source state to the set of states it may move to.
///
/// Targets are kept in insertion order with duplicates collapsed. A lookup
/// miss means "no transitions defined from this state", never an error.
#[derive(Clone, Debug)]
pub struct TransitionTable<S: State> {
    targets: HashMap<S, Vec<S>>,
}

impl<S: State> Default for TransitionTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> TransitionTable<S> {
    pub fn new() -> Self {
        Self {
            targets: HashMap::new(),
        }
    }

    /// Add `to` to the targets of `from`. Returns `false` if already present.
    pub fn add(&mut self, from: S, to: S) -> bool {
        let targets = self.targets.entry(from).or_default();
        if targets.contains(&to) {
            return false;
        }
        targets.push(to);
        true
    }

    /// Remove `to` from the targets of `from`. Returns `false` if absent.
    pub fn remove(&mut self, from: &S, to: &S) -> bool {
        let Some(targets) = self.targets.get_mut(from) else {
            debug!(from = %from.name(), "No transitions defined from state, nothing to remove");
            return false;
        };
        let Some(index) = targets.iter().position(|t| t == to) else {
            return false;
        };
        targets.remove(index);
        true
    }

    /// Drop every target of `state`.
    pub fn clear_state(&mut self, state: &S) {
        if self.targets.remove(state).is_none() {
            debug!(state = %state.name(), "No transitions defined from state, nothing to clear");
        }
    }

    pub fn clear(&mut self) {
        self.targets.clear();
    }

    pub fn allows(&self, from: &S, to: &S) -> bool {
        self.targets.get(from).is_some_and(|t| t.contains(to))
    }

    /// Legal targets from `state`; empty when none are defined.
    pub fn targets(&self, state: &S) -> &[S] {
        self.targets.get(state).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of `(from, to)` pairs in the table.
    pub fn len(&self) -> usize {
        self.targets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
