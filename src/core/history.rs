//! Bounded history of applied states.
//!
//! The history is a FIFO of the most recent states the machine has entered,
//! newest at the tail. It backs context-dependent navigation such as leaving
//! an overlay state back to whatever was active before it.

use super::state::State;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::time::Duration;

/// Capacity used when none is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 3;

/// A single applied state and the moment it was entered.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry<S: State> {
    /// The state that was entered
    pub state: S,
    /// When the state was entered
    pub entered_at: DateTime<Utc>,
}

/// Bounded, ordered history of applied states.
///
/// Recording past capacity evicts the oldest entry, so `len() <= capacity()`
/// always holds.
///
/// # Example
///
/// ```rust
/// use phasecraft::core::StateHistory;
/// use phasecraft::game::GamePhase;
///
/// let mut history = StateHistory::with_capacity(2);
/// history.record(GamePhase::Start);
/// history.record(GamePhase::Preparation);
/// history.record(GamePhase::Playing);
///
/// let states: Vec<_> = history.states().cloned().collect();
/// assert_eq!(states, vec![GamePhase::Preparation, GamePhase::Playing]);
/// ```
#[derive(Clone, Debug)]
pub struct StateHistory<S: State> {
    entries: VecDeque<HistoryEntry<S>>,
    capacity: usize,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    /// Create an empty history with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an empty history holding at most `capacity` entries.
    ///
    /// A capacity of zero is clamped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a newly applied state, evicting the oldest entry when full.
    pub fn record(&mut self, state: S) {
        self.record_at(state, Utc::now());
    }

    pub(crate) fn record_at(&mut self, state: S, entered_at: DateTime<Utc>) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry { state, entered_at });
    }

    /// The state active before the newest one.
    ///
    /// Returns the entry two positions back from the tail, skipping the
    /// current (overlay) state itself. `None` when fewer than two entries
    /// exist.
    pub fn previous_context(&self) -> Option<&S> {
        let len = self.entries.len();
        if len < 2 {
            return None;
        }
        self.entries.get(len - 2).map(|e| &e.state)
    }

    /// The most recently recorded state.
    pub fn latest(&self) -> Option<&S> {
        self.entries.back().map(|e| &e.state)
    }

    /// Recorded states, oldest first.
    pub fn states(&self) -> impl Iterator<Item = &S> + '_ {
        self.entries.iter().map(|e| &e.state)
    }

    /// Recorded entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry<S>> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Time spanned from the oldest to the newest retained entry.
    ///
    /// Returns `None` if the history is empty.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.entries.front(), self.entries.back()) {
            let duration = last.entered_at.signed_duration_since(first.entered_at);
            duration.to_std().ok()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
    enum TestState {
        #[default]
        None,
        Initial,
        Processing,
        Overlay,
        Complete,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::None => "None",
                Self::Initial => "Initial",
                Self::Processing => "Processing",
                Self::Overlay => "Overlay",
                Self::Complete => "Complete",
            }
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history: StateHistory<TestState> = StateHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), DEFAULT_HISTORY_CAPACITY);
        assert!(history.latest().is_none());
        assert!(history.previous_context().is_none());
        assert!(history.duration().is_none());
    }

    #[test]
    fn record_evicts_oldest_past_capacity() {
        let mut history = StateHistory::with_capacity(3);
        history.record(TestState::Initial);
        history.record(TestState::Processing);
        history.record(TestState::Overlay);
        history.record(TestState::Complete);

        assert_eq!(history.len(), 3);
        let states: Vec<_> = history.states().cloned().collect();
        assert_eq!(
            states,
            vec![
                TestState::Processing,
                TestState::Overlay,
                TestState::Complete
            ]
        );
    }

    #[test]
    fn previous_context_skips_the_newest_entry() {
        let mut history = StateHistory::new();
        history.record(TestState::Initial);
        history.record(TestState::Processing);
        history.record(TestState::Overlay);

        assert_eq!(history.latest(), Some(&TestState::Overlay));
        assert_eq!(history.previous_context(), Some(&TestState::Processing));
    }

    #[test]
    fn previous_context_needs_two_entries() {
        let mut history = StateHistory::new();
        history.record(TestState::Initial);
        assert!(history.previous_context().is_none());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut history = StateHistory::with_capacity(0);
        history.record(TestState::Initial);
        history.record(TestState::Processing);

        assert_eq!(history.capacity(), 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest(), Some(&TestState::Processing));
    }

    #[test]
    fn clear_empties_history() {
        let mut history = StateHistory::new();
        history.record(TestState::Initial);
        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn duration_spans_retained_entries() {
        let mut history = StateHistory::new();
        let start = Utc::now();
        history.record_at(TestState::Initial, start);
        history.record_at(
            TestState::Processing,
            start + chrono::Duration::milliseconds(25),
        );

        assert_eq!(history.duration(), Some(Duration::from_millis(25)));
    }

    #[test]
    fn single_entry_has_duration_zero() {
        let mut history = StateHistory::new();
        history.record(TestState::Initial);
        assert_eq!(history.duration(), Some(Duration::from_secs(0)));
    }
}
