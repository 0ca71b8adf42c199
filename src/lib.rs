//! Phasecraft: an event-driven finite state machine core for game sessions.
//!
//! The crate is split into small single-threaded components that a session
//! composes:
//!
//! - [`channel::EventChannel`]: keyed publish/subscribe with typed payloads
//! - [`machine::StateMachine`]: transition-table validation, lifecycle hooks
//!   and a state-changed notification
//! - [`handlers::HandlerRegistry`]: priority-ordered reactions to applied
//!   transitions
//! - [`core::StateHistory`]: a bounded buffer of recently entered states
//! - [`game::GameStateMachine`]: the session composition that wires events to
//!   transitions and supports returning to a previous context
//!
//! Every callback runs behind a fault boundary: a listener, observer or
//! handler that returns an error or panics is logged and skipped, and the
//! rest still run.
//!
//! # Example
//!
//! ```rust
//! use phasecraft::channel::EventChannel;
//! use phasecraft::game::{GameEvent, GamePhase, GameStateConfig, GameStateMachine};
//! use std::rc::Rc;
//!
//! let channel = Rc::new(EventChannel::new());
//! let game = GameStateMachine::<GamePhase>::new(GameStateConfig::default(), Some(Rc::clone(&channel)));
//! game.initialize();
//!
//! channel.raise(&GameEvent::LevelStart);
//!
//! assert_eq!(game.current_state(), GamePhase::Preparation);
//! let history: Vec<_> = game.history().states().cloned().collect();
//! assert_eq!(history, vec![GamePhase::Start, GamePhase::Preparation]);
//! ```

pub mod builder;
pub mod channel;
pub mod core;
pub mod game;
pub mod handlers;
pub mod logging;
pub mod machine;
pub mod observer;

// Re-export commonly used types
pub use builder::{StateMachineBuilder, TransitionRule};
pub use channel::{EventChannel, Listener};
pub use crate::core::{State, StateChange, StateHistory};
pub use game::{GameEvent, GamePhase, GamePhases, GameStateConfig, GameStateMachine};
pub use handlers::{HandlerRegistry, StateHandler};
pub use machine::{StateMachine, TransitionError};
pub use observer::{DispatchReport, ReactionError};
