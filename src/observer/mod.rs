//! Observer lists and the fault-isolation boundary.
//!
//! The event channel, the state machine's notifications and the handler
//! registry all invoke user callbacks the same way: over a snapshot, in
//! order, each inside [`run_isolated`]. A callback that returns `Err` or
//! panics is logged with its name and recorded in a [`DispatchReport`];
//! the remaining callbacks still run.

pub mod error;
pub mod isolation;
pub mod list;

pub use error::{FaultKind, ObserverFault, ObserverRole, ReactionError};
pub use isolation::{run_isolated, DispatchReport};
pub use list::{Observer, ObserverList};
