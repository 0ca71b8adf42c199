//! State machine holding one current state and enforcing the transition table.

use crate::core::{State, StateChange};
use crate::machine::error::TransitionError;
use crate::machine::table::TransitionTable;
use crate::observer::{DispatchReport, Observer, ObserverList, ObserverRole};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Observer of applied transitions.
pub type StateObserver<S> = Observer<StateChange<S>>;

type HookMap<S> = RefCell<HashMap<S, Rc<ObserverList<StateChange<S>>>>>;

/// Result of an accepted `change_state` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The requested state was already current; nothing fired.
    Unchanged,
    /// The state changed. Carries what happened in the commit observers,
    /// exit hooks, enter hooks and state-changed observers.
    Applied(DispatchReport),
}

/// Single-owner container of the current state.
///
/// Every operation takes `&self`. No internal borrow is held while hooks or
/// observers run, so they may call back into the machine.
///
/// # Example
///
/// ```rust
/// use phasecraft::game::GamePhase;
/// use phasecraft::machine::StateMachine;
///
/// let machine = StateMachine::new(GamePhase::Start);
/// machine.add_transition(GamePhase::Start, GamePhase::Preparation);
///
/// assert!(!machine.change_state(GamePhase::Gameover));
/// assert!(machine.change_state(GamePhase::Preparation));
/// assert_eq!(machine.current_state(), GamePhase::Preparation);
/// ```
pub struct StateMachine<S: State> {
    table: RefCell<TransitionTable<S>>,
    current: RefCell<S>,
    starting: RefCell<S>,
    started: Cell<bool>,
    no_restrictions: Cell<bool>,
    committed: ObserverList<StateChange<S>>,
    state_changed: ObserverList<StateChange<S>>,
    enter_hooks: HookMap<S>,
    exit_hooks: HookMap<S>,
}

impl<S: State> StateMachine<S> {
    /// Create a machine whose current and starting state are `starting`.
    pub fn new(starting: S) -> Self {
        Self {
            table: RefCell::new(TransitionTable::new()),
            current: RefCell::new(starting.clone()),
            starting: RefCell::new(starting),
            started: Cell::new(false),
            no_restrictions: Cell::new(false),
            committed: ObserverList::new(),
            state_changed: ObserverList::new(),
            enter_hooks: RefCell::new(HashMap::new()),
            exit_hooks: RefCell::new(HashMap::new()),
        }
    }

    pub fn current_state(&self) -> S {
        self.current.borrow().clone()
    }

    pub fn starting_state(&self) -> S {
        self.starting.borrow().clone()
    }

    /// Replace the starting state. Refused once the machine has been reset
    /// to its starting state for the first time.
    pub fn set_starting_state(&self, state: S) -> bool {
        if self.started.get() {
            warn!(
                state = %state.name(),
                "Starting state is fixed after the first reset"
            );
            return false;
        }
        *self.starting.borrow_mut() = state;
        true
    }

    pub fn no_restrictions(&self) -> bool {
        self.no_restrictions.get()
    }

    /// When set, every transition to a non-null state is valid.
    pub fn set_no_restrictions(&self, enabled: bool) {
        self.no_restrictions.set(enabled);
    }

    pub fn add_transition(&self, from: S, to: S) -> bool {
        self.table.borrow_mut().add(from, to)
    }

    pub fn remove_transition(&self, from: &S, to: &S) -> bool {
        self.table.borrow_mut().remove(from, to)
    }

    pub fn clear_state_transitions(&self, state: &S) {
        self.table.borrow_mut().clear_state(state);
    }

    pub fn clear_all_transitions(&self) {
        self.table.borrow_mut().clear();
    }

    /// Whether `from -> to` is permitted. This is the only check
    /// `change_state` consults.
    pub fn test_transition(&self, from: &S, to: &S) -> bool {
        self.no_restrictions.get() || self.table.borrow().allows(from, to)
    }

    /// Legal targets from `state`, empty when none are defined.
    pub fn get_valid_transitions(&self, state: &S) -> Vec<S> {
        self.table.borrow().targets(state).to_vec()
    }

    /// Attempt a transition, returning whether the machine is now in
    /// `new_state`.
    pub fn change_state(&self, new_state: S) -> bool {
        self.try_change_state(new_state).is_ok()
    }

    /// Attempt a transition, reporting why it was refused.
    ///
    /// On success the new state is committed first and the commit observers
    /// run; then the exit hooks of the old state, the enter hooks of the new
    /// state, and finally the state-changed observers run. Faults in any of them are isolated and
    /// cannot undo the transition.
    pub fn try_change_state(&self, new_state: S) -> Result<TransitionOutcome, TransitionError> {
        let old_state = self.current_state();

        if new_state == old_state {
            debug!(state = %new_state.name(), "Already in requested state");
            return Ok(TransitionOutcome::Unchanged);
        }

        if new_state.is_null() {
            warn!(from = %old_state.name(), "Rejected transition to the null state");
            return Err(TransitionError::NullTarget {
                from: old_state.name().to_string(),
            });
        }

        if !self.test_transition(&old_state, &new_state) {
            warn!(
                from = %old_state.name(),
                to = %new_state.name(),
                "Rejected transition not present in the transition table"
            );
            return Err(TransitionError::NotAllowed {
                from: old_state.name().to_string(),
                to: new_state.name().to_string(),
            });
        }

        *self.current.borrow_mut() = new_state.clone();
        info!(
            from = %old_state.name(),
            to = %new_state.name(),
            "State changed"
        );

        let change = StateChange::new(old_state, new_state);
        let mut report = self.committed.notify(ObserverRole::CommitObserver, &change);
        if let Some(hooks) = Self::hooks_for(&self.exit_hooks, &change.from) {
            report.merge(hooks.notify(ObserverRole::ExitHook, &change));
        }
        if let Some(hooks) = Self::hooks_for(&self.enter_hooks, &change.to) {
            report.merge(hooks.notify(ObserverRole::EnterHook, &change));
        }
        report.merge(
            self.state_changed
                .notify(ObserverRole::StateObserver, &change),
        );

        Ok(TransitionOutcome::Applied(report))
    }

    /// Put the machine in its starting state without consulting the table
    /// and without firing hooks or observers.
    pub fn reset_to_starting_state(&self) {
        let starting = self.starting_state();
        debug!(state = %starting.name(), "Reset to starting state");
        *self.current.borrow_mut() = starting;
        self.started.set(true);
    }

    /// Subscribe to applied transitions. Idempotent per observer.
    pub fn subscribe(&self, observer: StateObserver<S>) -> bool {
        self.state_changed.add(observer)
    }

    pub fn unsubscribe(&self, observer: &StateObserver<S>) -> bool {
        self.state_changed.remove(observer)
    }

    /// Run `observer` right after every commit, before any exit or enter
    /// hook. A transition started from a hook therefore reaches commit
    /// observers after the transition that triggered it.
    pub fn on_commit(&self, observer: StateObserver<S>) -> bool {
        self.committed.add(observer)
    }

    pub fn remove_commit_observer(&self, observer: &StateObserver<S>) -> bool {
        self.committed.remove(observer)
    }

    /// Run `observer` whenever the machine enters `state`.
    pub fn on_enter(&self, state: S, observer: StateObserver<S>) -> bool {
        Self::hooks_entry(&self.enter_hooks, state).add(observer)
    }

    /// Run `observer` whenever the machine leaves `state`.
    pub fn on_exit(&self, state: S, observer: StateObserver<S>) -> bool {
        Self::hooks_entry(&self.exit_hooks, state).add(observer)
    }

    pub fn remove_enter_hook(&self, state: &S, observer: &StateObserver<S>) -> bool {
        Self::hooks_for(&self.enter_hooks, state).is_some_and(|hooks| hooks.remove(observer))
    }

    pub fn remove_exit_hook(&self, state: &S, observer: &StateObserver<S>) -> bool {
        Self::hooks_for(&self.exit_hooks, state).is_some_and(|hooks| hooks.remove(observer))
    }

    fn hooks_for(map: &HookMap<S>, state: &S) -> Option<Rc<ObserverList<StateChange<S>>>> {
        map.borrow().get(state).cloned()
    }

    fn hooks_entry(map: &HookMap<S>, state: S) -> Rc<ObserverList<StateChange<S>>> {
        Rc::clone(map.borrow_mut().entry(state).or_default())
    }
}

impl<S: State> std::fmt::Debug for StateMachine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &*self.current.borrow())
            .field("starting", &*self.starting.borrow())
            .field("no_restrictions", &self.no_restrictions.get())
            .field("transitions", &self.table.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::ReactionError;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
    enum WorkflowState {
        #[default]
        None,
        Initial,
        Processing,
        Complete,
    }

    impl State for WorkflowState {
        fn name(&self) -> &str {
            match self {
                Self::None => "None",
                Self::Initial => "Initial",
                Self::Processing => "Processing",
                Self::Complete => "Complete",
            }
        }
    }

    type Log = Rc<RefCell<Vec<String>>>;

    fn machine() -> StateMachine<WorkflowState> {
        let machine = StateMachine::new(WorkflowState::Initial);
        machine.add_transition(WorkflowState::Initial, WorkflowState::Processing);
        machine.add_transition(WorkflowState::Processing, WorkflowState::Complete);
        machine
    }

    fn logger(name: &str, log: &Log) -> StateObserver<WorkflowState> {
        let log = Rc::clone(log);
        let label = name.to_string();
        Observer::from_fn(name, move |change: &StateChange<WorkflowState>| {
            log.borrow_mut().push(format!("{label} {change}"))
        })
    }

    #[test]
    fn simple_transition_succeeds() {
        let machine = machine();
        assert!(machine.change_state(WorkflowState::Processing));
        assert_eq!(machine.current_state(), WorkflowState::Processing);
    }

    #[test]
    fn self_transition_is_accepted_without_notification() {
        let log = Log::default();
        let machine = machine();
        machine.subscribe(logger("obs", &log));

        let outcome = machine.try_change_state(WorkflowState::Initial);

        assert_eq!(outcome, Ok(TransitionOutcome::Unchanged));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn transition_outside_table_is_rejected() {
        let machine = machine();
        let result = machine.try_change_state(WorkflowState::Complete);

        assert_eq!(
            result,
            Err(TransitionError::NotAllowed {
                from: "Initial".to_string(),
                to: "Complete".to_string(),
            })
        );
        assert_eq!(machine.current_state(), WorkflowState::Initial);
    }

    #[test]
    fn null_target_is_always_rejected() {
        let machine = machine();
        machine.set_no_restrictions(true);
        machine.add_transition(WorkflowState::Initial, WorkflowState::None);

        assert!(matches!(
            machine.try_change_state(WorkflowState::None),
            Err(TransitionError::NullTarget { .. })
        ));
        assert_eq!(machine.current_state(), WorkflowState::Initial);
    }

    #[test]
    fn no_restrictions_bypasses_table() {
        let machine = machine();
        machine.set_no_restrictions(true);
        assert!(machine.change_state(WorkflowState::Complete));
        assert!(machine.change_state(WorkflowState::Initial));
    }

    #[test]
    fn observers_receive_old_and_new_state() {
        let log = Log::default();
        let machine = machine();
        machine.subscribe(logger("obs", &log));

        machine.change_state(WorkflowState::Processing);
        machine.change_state(WorkflowState::Complete);

        assert_eq!(
            *log.borrow(),
            vec!["obs Initial -> Processing", "obs Processing -> Complete"]
        );
    }

    #[test]
    fn hooks_fire_exit_then_enter_then_observers() {
        let log = Log::default();
        let machine = machine();
        machine.subscribe(logger("changed", &log));
        machine.on_exit(WorkflowState::Initial, logger("exit", &log));
        machine.on_enter(WorkflowState::Processing, logger("enter", &log));
        machine.on_enter(WorkflowState::Complete, logger("never", &log));

        machine.change_state(WorkflowState::Processing);

        assert_eq!(
            *log.borrow(),
            vec![
                "exit Initial -> Processing",
                "enter Initial -> Processing",
                "changed Initial -> Processing",
            ]
        );
    }

    #[test]
    fn commit_observers_run_before_hooks() {
        let log = Log::default();
        let machine = machine();
        machine.subscribe(logger("changed", &log));
        machine.on_enter(WorkflowState::Processing, logger("enter", &log));
        machine.on_commit(logger("commit", &log));

        machine.change_state(WorkflowState::Processing);

        assert_eq!(
            *log.borrow(),
            vec![
                "commit Initial -> Processing",
                "enter Initial -> Processing",
                "changed Initial -> Processing",
            ]
        );
    }

    #[test]
    fn hook_chained_transition_commits_in_order() {
        let log = Log::default();
        let machine = Rc::new(machine());
        machine.on_commit(logger("commit", &log));
        let advance = {
            let machine = Rc::clone(&machine);
            Observer::from_fn("advance", move |_: &StateChange<WorkflowState>| {
                machine.change_state(WorkflowState::Complete);
            })
        };
        machine.on_enter(WorkflowState::Processing, advance);

        assert!(machine.change_state(WorkflowState::Processing));

        assert_eq!(machine.current_state(), WorkflowState::Complete);
        assert_eq!(
            *log.borrow(),
            vec!["commit Initial -> Processing", "commit Processing -> Complete"]
        );
    }

    #[test]
    fn removed_commit_observer_stops_firing() {
        let log = Log::default();
        let machine = machine();
        let observer = logger("commit", &log);
        machine.on_commit(observer.clone());

        assert!(machine.remove_commit_observer(&observer));
        machine.change_state(WorkflowState::Processing);

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn faulting_observer_cannot_veto_transition() {
        let log = Log::default();
        let machine = machine();
        machine.subscribe(Observer::new("veto", |_: &StateChange<WorkflowState>| {
            Err(ReactionError::new("refuse"))
        }));
        machine.subscribe(logger("after", &log));

        let outcome = machine.try_change_state(WorkflowState::Processing);

        assert_eq!(machine.current_state(), WorkflowState::Processing);
        assert_eq!(log.borrow().len(), 1);
        match outcome {
            Ok(TransitionOutcome::Applied(report)) => {
                assert_eq!(report.invoked, 2);
                assert_eq!(report.faults.len(), 1);
            }
            other => panic!("Expected applied transition, got {other:?}"),
        }
    }

    #[test]
    fn observer_may_chain_a_transition() {
        let machine = Rc::new(machine());
        let chained = {
            let machine = Rc::clone(&machine);
            Observer::from_fn("chain", move |change: &StateChange<WorkflowState>| {
                if change.to == WorkflowState::Processing {
                    machine.change_state(WorkflowState::Complete);
                }
            })
        };
        machine.subscribe(chained);

        assert!(machine.change_state(WorkflowState::Processing));
        assert_eq!(machine.current_state(), WorkflowState::Complete);
    }

    #[test]
    fn reset_bypasses_table_and_fires_nothing() {
        let log = Log::default();
        let machine = machine();
        machine.set_no_restrictions(true);
        machine.change_state(WorkflowState::Complete);
        machine.set_no_restrictions(false);
        machine.subscribe(logger("obs", &log));

        machine.reset_to_starting_state();

        assert_eq!(machine.current_state(), WorkflowState::Initial);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn starting_state_is_fixed_after_first_reset() {
        let machine = machine();
        assert!(machine.set_starting_state(WorkflowState::Processing));
        machine.reset_to_starting_state();
        assert_eq!(machine.current_state(), WorkflowState::Processing);
        assert!(!machine.set_starting_state(WorkflowState::Complete));
        assert_eq!(machine.starting_state(), WorkflowState::Processing);
    }

    #[test]
    fn valid_transitions_are_listed() {
        let machine = machine();
        assert_eq!(
            machine.get_valid_transitions(&WorkflowState::Initial),
            vec![WorkflowState::Processing]
        );
        assert!(machine
            .get_valid_transitions(&WorkflowState::Complete)
            .is_empty());
    }

    #[test]
    fn table_maintenance_changes_authority() {
        let machine = machine();
        assert!(machine.remove_transition(&WorkflowState::Initial, &WorkflowState::Processing));
        assert!(!machine.change_state(WorkflowState::Processing));

        machine.add_transition(WorkflowState::Initial, WorkflowState::Processing);
        machine.clear_all_transitions();
        assert!(!machine.test_transition(&WorkflowState::Initial, &WorkflowState::Processing));
    }

    #[test]
    fn removed_hook_stops_firing() {
        let log = Log::default();
        let machine = machine();
        let hook = logger("enter", &log);
        machine.on_enter(WorkflowState::Processing, hook.clone());
        assert!(machine.remove_enter_hook(&WorkflowState::Processing, &hook));
        assert!(!machine.remove_exit_hook(&WorkflowState::Initial, &hook));

        machine.change_state(WorkflowState::Processing);
        assert!(log.borrow().is_empty());
    }
}
