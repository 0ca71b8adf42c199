//! Reasons a transition is rejected.

use thiserror::Error;

/// Why `change_state` refused to move.
///
/// A rejection is recoverable: the machine stays where it was and the caller
/// decides what to do next.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Cannot transition from '{from}' to the null state")]
    NullTarget { from: String },

    #[error("Transition from '{from}' to '{to}' is not in the transition table")]
    NotAllowed { from: String, to: String },
}
