//! The state handler capability.

use crate::core::{State, StateChange};
use crate::observer::ReactionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// An observer invoked after every applied transition.
///
/// Handlers run in ascending [`priority`](StateHandler::priority) order and
/// react to a transition that has already committed; returning `Err` (or
/// panicking) is logged and does not affect other handlers or the machine.
///
/// Handlers take `&self`; keep mutable reaction state behind `Cell` or
/// `RefCell`.
///
/// # Example
///
/// ```rust
/// use phasecraft::core::StateChange;
/// use phasecraft::game::GamePhase;
/// use phasecraft::handlers::StateHandler;
/// use phasecraft::observer::ReactionError;
/// use std::cell::Cell;
///
/// struct PauseMenu {
///     visible: Cell<bool>,
/// }
///
/// impl StateHandler<GamePhase> for PauseMenu {
///     fn name(&self) -> &str {
///         "pause-menu"
///     }
///
///     fn priority(&self) -> i32 {
///         10
///     }
///
///     fn handle_state_change(&self, change: &StateChange<GamePhase>) -> Result<(), ReactionError> {
///         self.visible.set(change.to == GamePhase::Pause);
///         Ok(())
///     }
/// }
/// ```
pub trait StateHandler<S: State> {
    /// Identity used in logs and fault reports.
    fn name(&self) -> &str;

    /// Dispatch order; lower runs earlier.
    fn priority(&self) -> i32 {
        0
    }

    /// Disabled handlers are skipped during dispatch.
    fn is_enabled(&self) -> bool {
        true
    }

    fn handle_state_change(&self, change: &StateChange<S>) -> Result<(), ReactionError>;
}

/// Identifier of one handler registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerId(Uuid);

impl HandlerId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
