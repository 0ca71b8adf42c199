//! Transition-validated state machine.

pub mod error;
pub mod state_machine;
pub mod table;

pub use error::TransitionError;
pub use state_machine::{StateMachine, StateObserver, TransitionOutcome};
pub use table::TransitionTable;
