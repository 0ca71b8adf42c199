//! Keyed publish/subscribe event channel.
//!
//! Producers raise events by key; listeners registered for that key react.
//! A listener is bound to one payload type when it is added, and a raise
//! only reaches listeners whose payload type matches. Listeners for other
//! payload types under the same key are skipped rather than failing.
//!
//! # Example
//!
//! ```rust
//! use phasecraft::channel::{EventChannel, Listener};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
//! enum Signal {
//!     Score,
//! }
//!
//! let channel = EventChannel::new();
//! let total = Rc::new(Cell::new(0));
//!
//! let on_score = {
//!     let total = Rc::clone(&total);
//!     Listener::from_fn("score-counter", move |points: &u32| total.set(total.get() + points))
//! };
//! channel.add_listener(Signal::Score, on_score);
//!
//! channel.raise_with(&Signal::Score, &10u32);
//! channel.raise_with(&Signal::Score, &"not a number"); // skipped, no error
//! channel.raise(&Signal::Score); // no-payload raise, skipped too
//!
//! assert_eq!(total.get(), 10);
//! ```

use crate::observer::{DispatchReport, Observer, ObserverRole};
use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;
use tracing::{debug, trace};
use uuid::Uuid;

/// A channel listener expecting payloads of type `P`.
///
/// No-payload listeners are `Listener<()>`.
pub type Listener<P> = Observer<P>;

/// Identity usable as an event channel key.
pub trait EventKey: Clone + Eq + Hash + Debug + 'static {}

impl<T: Clone + Eq + Hash + Debug + 'static> EventKey for T {}

#[derive(Clone)]
struct Entry {
    id: Uuid,
    payload: TypeId,
    payload_name: &'static str,
    listener: Rc<dyn Any>,
}

impl Entry {
    fn new<P: 'static>(listener: Listener<P>) -> Self {
        Self {
            id: listener.id(),
            payload: TypeId::of::<P>(),
            payload_name: type_name::<P>(),
            listener: Rc::new(listener),
        }
    }
}

/// Keyed publish/subscribe bus.
///
/// Raising is synchronous: every matching listener runs on the caller's
/// stack, in registration order, before the raise returns. Iteration is over
/// a snapshot, so listeners may raise again, add, or remove listeners while
/// a raise is in flight.
pub struct EventChannel<K: EventKey> {
    listeners: RefCell<HashMap<K, Vec<Entry>>>,
}

impl<K: EventKey> Default for EventChannel<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: EventKey> EventChannel<K> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(HashMap::new()),
        }
    }

    /// Register a listener for `key`.
    ///
    /// Returns `false` without adding anything if this listener (or a clone
    /// of it) is already registered for `key`.
    pub fn add_listener<P: 'static>(&self, key: K, listener: Listener<P>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let entries = listeners.entry(key).or_default();
        if entries.iter().any(|e| e.id == listener.id()) {
            trace!(listener = %listener.name(), "Listener already registered");
            return false;
        }
        entries.push(Entry::new(listener));
        true
    }

    /// Remove one registration. Removing something that is not registered
    /// is a silent no-op and returns `false`.
    pub fn remove_listener<P: 'static>(&self, key: &K, listener: &Listener<P>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(entries) = listeners.get_mut(key) else {
            return false;
        };
        let Some(index) = entries.iter().position(|e| e.id == listener.id()) else {
            return false;
        };
        entries.remove(index);
        if entries.is_empty() {
            listeners.remove(key);
        }
        true
    }

    /// Remove every listener registered for `key`.
    pub fn remove_listeners(&self, key: &K) {
        self.listeners.borrow_mut().remove(key);
    }

    /// Remove every listener for every key.
    pub fn remove_all_listeners(&self) {
        self.listeners.borrow_mut().clear();
    }

    /// Invoke every no-payload listener registered for `key`.
    pub fn raise(&self, key: &K) -> DispatchReport {
        self.raise_with(key, &())
    }

    /// Invoke every listener registered for `key` whose payload type is `P`.
    ///
    /// Listeners registered under `key` for any other payload type are
    /// counted as skipped.
    pub fn raise_with<P: 'static>(&self, key: &K, payload: &P) -> DispatchReport {
        let snapshot = match self.listeners.borrow().get(key) {
            Some(entries) => entries.clone(),
            None => Vec::new(),
        };

        let mut report = DispatchReport::default();
        if snapshot.is_empty() {
            debug!(key = ?key, "Raised event has no listeners");
            return report;
        }

        let payload_type = TypeId::of::<P>();
        for entry in snapshot {
            if entry.payload != payload_type {
                trace!(
                    key = ?key,
                    expected = entry.payload_name,
                    raised = type_name::<P>(),
                    "Skipping listener for a different payload type"
                );
                report.skip();
                continue;
            }
            let Some(listener) = entry.listener.downcast_ref::<Listener<P>>() else {
                report.skip();
                continue;
            };
            report.run(ObserverRole::Listener, listener.name(), || {
                listener.call(payload)
            });
        }
        report
    }

    /// Number of listeners registered for `key`, across all payload types.
    pub fn listener_count(&self, key: &K) -> usize {
        self.listeners.borrow().get(key).map_or(0, Vec::len)
    }

    pub fn has_listeners(&self, key: &K) -> bool {
        self.listener_count(key) > 0
    }

    /// Keys that currently have at least one listener.
    pub fn keys(&self) -> Vec<K> {
        self.listeners.borrow().keys().cloned().collect()
    }
}

impl<K: EventKey> std::fmt::Debug for EventChannel<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.borrow();
        let mut map = f.debug_map();
        for (key, entries) in listeners.iter() {
            map.entry(key, &entries.len());
        }
        map.finish()
    }
}
