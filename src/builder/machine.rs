//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::builder::transition::TransitionRule;
use crate::core::State;
use crate::machine::StateMachine;

/// Builder for constructing state machines with a fluent API.
///
/// # Example
///
/// ```rust
/// use phasecraft::builder::StateMachineBuilder;
/// use phasecraft::game::GamePhase;
///
/// let machine = StateMachineBuilder::new()
///     .starting(GamePhase::Start)
///     .transition(GamePhase::Start, GamePhase::Preparation)
///     .transitions_from(GamePhase::Preparation, [GamePhase::Playing, GamePhase::Start])
///     .build()
///     .unwrap();
///
/// assert_eq!(machine.current_state(), GamePhase::Start);
/// ```
pub struct StateMachineBuilder<S: State> {
    starting: Option<S>,
    rules: Vec<TransitionRule<S>>,
    no_restrictions: bool,
}

impl<S: State> StateMachineBuilder<S> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            starting: None,
            rules: Vec::new(),
            no_restrictions: false,
        }
    }

    /// Set the starting state (required).
    pub fn starting(mut self, state: S) -> Self {
        self.starting = Some(state);
        self
    }

    /// Allow a single `from -> to` transition.
    pub fn transition(mut self, from: S, to: S) -> Self {
        self.rules.push(TransitionRule::new(from, [to]));
        self
    }

    /// Allow `from` to move to each of `targets`.
    pub fn transitions_from(mut self, from: S, targets: impl IntoIterator<Item = S>) -> Self {
        self.rules.push(TransitionRule::new(from, targets));
        self
    }

    /// Add several declarative rules at once.
    pub fn rules(mut self, rules: impl IntoIterator<Item = TransitionRule<S>>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Accept every non-null transition regardless of the table.
    pub fn no_restrictions(mut self, enabled: bool) -> Self {
        self.no_restrictions = enabled;
        self
    }

    /// Build the state machine, positioned at its starting state.
    /// Returns an error if the starting state is missing or null.
    pub fn build(self) -> Result<StateMachine<S>, BuildError> {
        let starting = self.starting.ok_or(BuildError::MissingStartingState)?;
        if starting.is_null() {
            return Err(BuildError::NullStartingState);
        }

        let machine = StateMachine::new(starting);
        for rule in &self.rules {
            for (from, to) in rule.pairs() {
                machine.add_transition(from, to);
            }
        }
        machine.set_no_restrictions(self.no_restrictions);

        Ok(machine)
    }
}

impl<S: State> Default for StateMachineBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
