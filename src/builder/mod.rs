//! Builder API for ergonomic state machine construction.
//!
//! This module provides a fluent builder, declarative transition rules, and
//! the `phase_enum!` macro for declaring state enumerations with minimal
//! boilerplate.

pub mod error;
pub mod machine;
pub mod macros;
pub mod transition;

pub use error::BuildError;
pub use machine::StateMachineBuilder;
pub use transition::TransitionRule;
