//! Candidate discovery for handler scans.
//!
//! The host environment enumerates its live objects as [`Candidate`]s. The
//! registry filters them by tag and registers the ones that expose the
//! [`StateHandler`] capability.

use super::handler::StateHandler;
use crate::core::State;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// A live object offered to a handler scan.
pub struct Candidate<S: State> {
    pub name: String,
    pub tags: Vec<String>,
    /// `None` when the object does not expose the handler capability
    pub handler: Option<Rc<dyn StateHandler<S>>>,
}

impl<S: State> Candidate<S> {
    /// A candidate exposing the handler capability.
    pub fn with_handler(
        name: impl Into<String>,
        tags: &[&str],
        handler: Rc<dyn StateHandler<S>>,
    ) -> Self {
        Self {
            name: name.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            handler: Some(handler),
        }
    }

    /// A candidate without the handler capability.
    pub fn plain(name: impl Into<String>, tags: &[&str]) -> Self {
        Self {
            name: name.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            handler: None,
        }
    }
}

impl<S: State> Clone for Candidate<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            tags: self.tags.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<S: State> fmt::Debug for Candidate<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("is_handler", &self.handler.is_some())
            .finish()
    }
}

/// Enumerates candidate objects for a scan.
pub trait HandlerSource<S: State> {
    fn candidates(&self) -> Vec<Candidate<S>>;
}

impl<S, F> HandlerSource<S> for F
where
    S: State,
    F: Fn() -> Vec<Candidate<S>>,
{
    fn candidates(&self) -> Vec<Candidate<S>> {
        self()
    }
}

/// Include/exclude tag filter applied to scanned candidates.
///
/// An empty `include` admits every candidate; a candidate carrying any
/// `exclude` tag is always rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl TagFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, tag: impl Into<String>) -> Self {
        self.include.push(tag.into());
        self
    }

    pub fn exclude(mut self, tag: impl Into<String>) -> Self {
        self.exclude.push(tag.into());
        self
    }

    pub fn admits(&self, tags: &[String]) -> bool {
        if tags.iter().any(|t| self.exclude.contains(t)) {
            return false;
        }
        self.include.is_empty() || tags.iter().any(|t| self.include.contains(t))
    }
}
