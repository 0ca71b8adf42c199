//! Static wiring data for a [`GameStateMachine`](super::GameStateMachine).
//!
//! Configuration is read once at initialization. Structural problems are
//! accumulated with [`Validation`] so every fault is reported at once; the
//! composition logs them and degrades rather than refusing to start.

use super::phases::GamePhases;
use crate::builder::TransitionRule;
use crate::core::{State, DEFAULT_HISTORY_CAPACITY};
use crate::handlers::TagFilter;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// Where a mapped event sends the machine.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case", bound = "")]
pub enum MappingTarget<S: State> {
    /// Move to a fixed state.
    State(S),
    /// Move back to the state that preceded the current one.
    PreviousContext,
}

impl<S: State> Default for MappingTarget<S> {
    fn default() -> Self {
        Self::State(S::default())
    }
}

impl<S: State> fmt::Display for MappingTarget<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::State(state) => f.write_str(state.name()),
            Self::PreviousContext => f.write_str("<previous context>"),
        }
    }
}

/// One event-to-state mapping.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(bound = "")]
pub struct EventMapping<S: GamePhases> {
    pub event: S::Event,
    #[serde(default)]
    pub target: MappingTarget<S>,
}

impl<S: GamePhases> EventMapping<S> {
    pub fn to_state(event: S::Event, state: S) -> Self {
        Self {
            event,
            target: MappingTarget::State(state),
        }
    }

    pub fn to_previous_context(event: S::Event) -> Self {
        Self {
            event,
            target: MappingTarget::PreviousContext,
        }
    }
}

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// A structural fault in otherwise parseable configuration.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigFault {
    #[error("starting state is the null state")]
    NullStartingState,

    #[error("history capacity is zero; one entry will be kept")]
    ZeroHistoryCapacity,

    #[error("transition from '{from}' targets the null state")]
    NullTransitionTarget { from: String },

    #[error("transition rule has the null state as its source")]
    NullTransitionSource,

    #[error("event {event} is mapped to the null state")]
    NullMappingTarget { event: String },

    #[error("event {event} is mapped more than once")]
    DuplicateMapping { event: String },
}

/// Everything a [`GameStateMachine`](super::GameStateMachine) is wired from.
///
/// Every field has a default, so `{}` is a valid configuration that runs on
/// the phase enumeration's built-in table and mappings.
///
/// ```json
/// {
///   "starting_state": "Start",
///   "transitions": [{ "from": "Start", "to": ["Preparation"] }],
///   "event_mappings": [
///     { "event": "LevelStart", "target": { "state": "Preparation" } },
///     { "event": "Resume", "target": "previous_context" }
///   ],
///   "history_capacity": 3,
///   "handler_filter": { "include": ["gameplay"], "exclude": ["editor"] }
/// }
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(bound = "", default)]
pub struct GameStateConfig<S: GamePhases> {
    pub starting_state: S,
    pub no_restrictions: bool,
    /// Rows added to the table before the built-in ones.
    pub transitions: Vec<TransitionRule<S>>,
    /// Also load [`GamePhases::default_transitions`].
    pub include_default_transitions: bool,
    /// Checked before the built-in mappings; the first mapping for an event
    /// wins.
    pub event_mappings: Vec<EventMapping<S>>,
    pub history_capacity: usize,
    pub handler_filter: TagFilter,
}

impl<S: GamePhases> Default for GameStateConfig<S> {
    fn default() -> Self {
        Self {
            starting_state: S::initial(),
            no_restrictions: false,
            transitions: Vec::new(),
            include_default_transitions: true,
            event_mappings: Vec::new(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            handler_filter: TagFilter::default(),
        }
    }
}

impl<S: GamePhases> GameStateConfig<S> {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Check the configuration, accumulating every fault.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigFault>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<ConfigFault>>> = Vec::new();

        checks.push(if self.starting_state.is_null() {
            Validation::fail(ConfigFault::NullStartingState)
        } else {
            Validation::success(())
        });

        checks.push(if self.history_capacity == 0 {
            Validation::fail(ConfigFault::ZeroHistoryCapacity)
        } else {
            Validation::success(())
        });

        for rule in &self.transitions {
            if rule.from.is_null() {
                checks.push(Validation::fail(ConfigFault::NullTransitionSource));
            }
            for _ in rule.to.iter().filter(|to| to.is_null()) {
                checks.push(Validation::fail(ConfigFault::NullTransitionTarget {
                    from: rule.from.name().to_string(),
                }));
            }
        }

        let mut seen = HashSet::new();
        for mapping in &self.event_mappings {
            let event = format!("{:?}", mapping.event);
            if !seen.insert(mapping.event.clone()) {
                checks.push(Validation::fail(ConfigFault::DuplicateMapping {
                    event: event.clone(),
                }));
            }
            if mapping.target == MappingTarget::State(S::default()) {
                checks.push(Validation::fail(ConfigFault::NullMappingTarget { event }));
            }
        }

        Validation::all_vec(checks).map(|_| ())
    }

    /// Every fault [`validate`](Self::validate) finds, in discovery order.
    pub fn faults(&self) -> Vec<ConfigFault> {
        match self.validate() {
            Validation::Success(()) => Vec::new(),
            Validation::Failure(errors) => errors.iter().cloned().collect(),
        }
    }

    /// The starting state to actually use; a null one falls back to
    /// [`GamePhases::initial`].
    pub fn effective_starting_state(&self) -> S {
        if self.starting_state.is_null() {
            S::initial()
        } else {
            self.starting_state.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::phases::{GameEvent, GamePhase};

    #[test]
    fn empty_json_uses_defaults() {
        let config = GameStateConfig::<GamePhase>::from_json_str("{}").unwrap();

        assert_eq!(config.starting_state, GamePhase::Start);
        assert_eq!(config.history_capacity, DEFAULT_HISTORY_CAPACITY);
        assert!(config.include_default_transitions);
        assert!(!config.no_restrictions);
        assert!(config.faults().is_empty());
    }

    #[test]
    fn parses_full_configuration() {
        let json = r#"{
            "starting_state": "Preparation",
            "no_restrictions": true,
            "transitions": [{ "from": "Preparation", "to": ["Playing"] }],
            "include_default_transitions": false,
            "event_mappings": [
                { "event": "GameStart", "target": { "state": "Playing" } },
                { "event": "Resume", "target": "previous_context" }
            ],
            "history_capacity": 5,
            "handler_filter": { "include": ["gameplay"] }
        }"#;
        let config = GameStateConfig::<GamePhase>::from_json_str(json).unwrap();

        assert_eq!(config.starting_state, GamePhase::Preparation);
        assert!(config.no_restrictions);
        assert!(!config.include_default_transitions);
        assert_eq!(
            config.event_mappings,
            vec![
                EventMapping::to_state(GameEvent::GameStart, GamePhase::Playing),
                EventMapping::to_previous_context(GameEvent::Resume),
            ]
        );
        assert_eq!(config.history_capacity, 5);
        assert_eq!(config.handler_filter.include, vec!["gameplay".to_string()]);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let result = GameStateConfig::<GamePhase>::from_json_str("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = GameStateConfig::<GamePhase>::from_json_file("/nonexistent/phasecraft.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn validation_accumulates_every_fault() {
        let config = GameStateConfig::<GamePhase> {
            starting_state: GamePhase::None,
            history_capacity: 0,
            transitions: vec![TransitionRule::new(GamePhase::Start, [GamePhase::None])],
            event_mappings: vec![
                EventMapping::to_state(GameEvent::Pause, GamePhase::Pause),
                EventMapping::to_state(GameEvent::Pause, GamePhase::Playing),
                EventMapping::to_state(GameEvent::Restart, GamePhase::None),
            ],
            ..GameStateConfig::default()
        };

        match config.validate() {
            Validation::Failure(errors) => {
                assert_eq!(errors.len(), 5);
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, ConfigFault::NullStartingState)));
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, ConfigFault::ZeroHistoryCapacity)));
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, ConfigFault::NullTransitionTarget { .. })));
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, ConfigFault::DuplicateMapping { .. })));
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, ConfigFault::NullMappingTarget { .. })));
            }
            Validation::Success(_) => panic!("Expected failures, got success"),
        }
    }

    #[test]
    fn missing_mapping_target_is_a_null_target() {
        let json = r#"{ "event_mappings": [{ "event": "Pause" }] }"#;
        let config = GameStateConfig::<GamePhase>::from_json_str(json).unwrap();

        assert_eq!(
            config.faults(),
            vec![ConfigFault::NullMappingTarget {
                event: "Pause".to_string()
            }]
        );
    }

    #[test]
    fn null_starting_state_falls_back_to_initial() {
        let config = GameStateConfig::<GamePhase> {
            starting_state: GamePhase::None,
            ..GameStateConfig::default()
        };
        assert_eq!(config.effective_starting_state(), GamePhase::Start);
    }
}
