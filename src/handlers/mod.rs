//! State handlers and their priority-ordered registry.
//!
//! Handlers are the outbound contract of the core: anything that wants to
//! react to applied transitions implements [`StateHandler`] and is either
//! registered by hand or discovered by a scan over a [`HandlerSource`].

pub mod handler;
pub mod registry;
pub mod source;

pub use handler::{HandlerId, StateHandler};
pub use registry::{HandlerRecord, HandlerRegistry, ScanSummary};
pub use source::{Candidate, HandlerSource, TagFilter};
