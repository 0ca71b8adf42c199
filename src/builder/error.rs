//! Build errors for the state machine builder.

use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Starting state not specified. Call .starting(state) before .build()")]
    MissingStartingState,

    #[error("Starting state cannot be the null state")]
    NullStartingState,
}
