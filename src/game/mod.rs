//! The game-session composition.
//!
//! [`GameStateMachine`] wires an [`EventChannel`](crate::channel::EventChannel),
//! a [`StateMachine`](crate::machine::StateMachine), a
//! [`HandlerRegistry`](crate::handlers::HandlerRegistry) and a bounded
//! [`StateHistory`](crate::core::StateHistory) together from a
//! [`GameStateConfig`].

pub mod composition;
pub mod config;
pub mod phases;

pub use composition::GameStateMachine;
pub use config::{ConfigError, ConfigFault, EventMapping, GameStateConfig, MappingTarget};
pub use phases::{GameEvent, GamePhase, GamePhases};
