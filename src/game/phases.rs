//! Phase enumerations and their built-in wiring data.
//!
//! The default transition table and event mappings are data, not behavior:
//! adding a phase means adding a variant and the rows that reach it.

use crate::builder::TransitionRule;
use crate::channel::EventKey;
use crate::core::State;
use crate::game::config::{EventMapping, MappingTarget};
use crate::phase_enum;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A state enumeration that ships with its own default wiring.
pub trait GamePhases: State {
    /// Event channel key that drives this enumeration.
    type Event: EventKey + Serialize + DeserializeOwned;

    /// The phase representing "not yet started".
    fn initial() -> Self;

    /// Built-in transition table.
    fn default_transitions() -> Vec<TransitionRule<Self>>;

    /// Built-in event-to-state mappings. Configured mappings take precedence.
    fn default_event_mappings() -> Vec<EventMapping<Self>>;
}

phase_enum! {
    /// Phases of a game session.
    pub enum GamePhase {
        #[default]
        None,
        Start,
        Preparation,
        Playing,
        /// Overlay phase; leaving it returns to whatever preceded it
        Pause,
        LevelComplete,
        Gameover,
    }
}

/// Events that drive a game session's phase changes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum GameEvent {
    LevelStart,
    GameStart,
    Pause,
    Resume,
    LevelComplete,
    GameOver,
    Restart,
}

impl GamePhases for GamePhase {
    type Event = GameEvent;

    fn initial() -> Self {
        Self::Start
    }

    fn default_transitions() -> Vec<TransitionRule<Self>> {
        use GamePhase::*;
        vec![
            TransitionRule::new(Start, [Preparation]),
            TransitionRule::new(Preparation, [Playing, Pause, Start]),
            TransitionRule::new(Playing, [Pause, LevelComplete, Gameover, Start]),
            TransitionRule::new(Pause, [Preparation, Playing, Start]),
            TransitionRule::new(LevelComplete, [Preparation, Start]),
            TransitionRule::new(Gameover, [Preparation, Start]),
        ]
    }

    fn default_event_mappings() -> Vec<EventMapping<Self>> {
        vec![
            EventMapping::to_state(GameEvent::LevelStart, GamePhase::Preparation),
            EventMapping::to_state(GameEvent::GameStart, GamePhase::Playing),
            EventMapping::to_state(GameEvent::Pause, GamePhase::Pause),
            EventMapping::to_previous_context(GameEvent::Resume),
            EventMapping::to_state(GameEvent::LevelComplete, GamePhase::LevelComplete),
            EventMapping::to_state(GameEvent::GameOver, GamePhase::Gameover),
            EventMapping::to_state(GameEvent::Restart, GamePhase::Start),
        ]
    }
}
