//! Core state types.
//!
//! This module contains the building blocks shared by every other module:
//! - State definitions via the `State` trait
//! - The `(from, to)` change record carried by notifications
//! - Bounded history of applied states

mod history;
mod state;

pub use history::{HistoryEntry, StateHistory, DEFAULT_HISTORY_CAPACITY};
pub use state::{State, StateChange};
