//! Core State trait for state machine states.
//!
//! A state is an opaque, comparable identity. Two states are equal iff their
//! names match, and `Default::default()` is the distinguished null state that
//! represents "no state".

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::hash::Hash;

/// Trait for state machine states.
///
/// # Required Traits
///
/// - `Clone`: States are copied into history and notifications
/// - `Eq` + `Hash`: States key the transition table
/// - `Default`: The default value is the null state and is never a valid
///   transition target
/// - `Serialize` + `Deserialize`: States appear in configuration files
///
/// Implementations must keep equality consistent with [`State::name`].
///
/// # Example
///
/// ```rust
/// use phasecraft::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
/// enum DoorState {
///     #[default]
///     None,
///     Open,
///     Closed,
/// }
///
/// impl State for DoorState {
///     fn name(&self) -> &str {
///         match self {
///             Self::None => "None",
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///         }
///     }
/// }
///
/// assert!(DoorState::None.is_null());
/// assert!(!DoorState::Open.is_null());
/// ```
pub trait State:
    Clone + Eq + Hash + Debug + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// Check if this is the null state.
    ///
    /// Default implementation compares against `Self::default()`.
    fn is_null(&self) -> bool {
        *self == Self::default()
    }
}

/// A `(from, to)` pair describing an applied transition.
///
/// This is the payload of the state-changed notification and the argument
/// handed to every state handler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateChange<S: State> {
    /// The state being left
    pub from: S,
    /// The state being entered
    pub to: S,
}

impl<S: State> StateChange<S> {
    pub fn new(from: S, to: S) -> Self {
        Self { from, to }
    }
}

impl<S: State> fmt::Display for StateChange<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from.name(), self.to.name())
    }
}
