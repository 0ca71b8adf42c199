//! Fault types raised by observer callbacks.

use std::fmt;
use thiserror::Error;

/// Error an observer callback returns to report that its reaction failed.
///
/// Returning this never unwinds past the raise or dispatch that invoked the
/// callback; it is logged and recorded in the [`DispatchReport`].
///
/// [`DispatchReport`]: crate::observer::DispatchReport
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ReactionError {
    message: String,
}

impl ReactionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ReactionError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for ReactionError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Where in the core a callback was running when it faulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverRole {
    /// Event channel listener
    Listener,
    /// Observer run right after the new state is committed
    CommitObserver,
    /// State-changed notification subscriber
    StateObserver,
    /// Per-state enter callback
    EnterHook,
    /// Per-state exit callback
    ExitHook,
    /// Registered state handler
    Handler,
}

impl fmt::Display for ObserverRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Listener => "listener",
            Self::CommitObserver => "commit observer",
            Self::StateObserver => "state observer",
            Self::EnterHook => "enter hook",
            Self::ExitHook => "exit hook",
            Self::Handler => "handler",
        };
        f.write_str(label)
    }
}

/// How a callback faulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    /// The callback returned `Err`
    Failed(ReactionError),
    /// The callback panicked; carries the panic message when one was given
    Panicked(String),
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(err) => write!(f, "failed: {err}"),
            Self::Panicked(msg) => write!(f, "panicked: {msg}"),
        }
    }
}

/// A fault caught at an isolation boundary, with the identity of the
/// callback that produced it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{role} '{observer}' {kind}")]
pub struct ObserverFault {
    pub role: ObserverRole,
    pub observer: String,
    pub kind: FaultKind,
}
