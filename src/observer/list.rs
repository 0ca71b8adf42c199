//! Named callbacks and ordered observer lists.

use super::error::{ObserverRole, ReactionError};
use super::isolation::DispatchReport;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

type Callback<A> = Rc<dyn Fn(&A) -> Result<(), ReactionError>>;

/// A named callback with a stable identity.
///
/// Clones share the identity, so registering a clone of an observer that is
/// already present is a no-op, and removing with a clone removes the
/// original.
///
/// # Example
///
/// ```rust
/// use phasecraft::observer::{Observer, ObserverList, ObserverRole};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let hits = Rc::new(Cell::new(0));
/// let counter = {
///     let hits = Rc::clone(&hits);
///     Observer::from_fn("counter", move |n: &u32| hits.set(hits.get() + *n))
/// };
///
/// let list = ObserverList::new();
/// assert!(list.add(counter.clone()));
/// assert!(!list.add(counter.clone()));
///
/// list.notify(ObserverRole::StateObserver, &5);
/// assert_eq!(hits.get(), 5);
/// ```
pub struct Observer<A: ?Sized> {
    id: Uuid,
    name: Rc<str>,
    callback: Callback<A>,
}

impl<A: ?Sized> Observer<A> {
    /// Create an observer whose callback may report failure.
    pub fn new<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&A) -> Result<(), ReactionError> + 'static,
    {
        let name: String = name.into();
        Self {
            id: Uuid::new_v4(),
            name: Rc::from(name),
            callback: Rc::new(callback),
        }
    }

    /// Create an observer from a callback that cannot fail.
    pub fn from_fn<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&A) + 'static,
    {
        Self::new(name, move |arg: &A| {
            callback(arg);
            Ok(())
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if `other` is this observer or a clone of it.
    pub fn same_as(&self, other: &Observer<A>) -> bool {
        self.id == other.id
    }

    /// Invoke the callback directly, outside any isolation boundary.
    pub fn call(&self, arg: &A) -> Result<(), ReactionError> {
        (self.callback)(arg)
    }
}

impl<A: ?Sized> Clone for Observer<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Rc::clone(&self.name),
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<A: ?Sized> fmt::Debug for Observer<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// Ordered list of observers owned by a publisher.
///
/// Adding is idempotent per observer identity. Notification iterates over a
/// snapshot, so callbacks may add or remove observers (or notify again)
/// while a notification is in flight; such changes apply to the next call.
pub struct ObserverList<A: ?Sized> {
    observers: RefCell<Vec<Observer<A>>>,
}

impl<A: ?Sized> Default for ObserverList<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized> ObserverList<A> {
    pub fn new() -> Self {
        Self {
            observers: RefCell::new(Vec::new()),
        }
    }

    /// Append an observer. Returns `false` if it was already present.
    pub fn add(&self, observer: Observer<A>) -> bool {
        let mut observers = self.observers.borrow_mut();
        if observers.iter().any(|o| o.same_as(&observer)) {
            return false;
        }
        observers.push(observer);
        true
    }

    /// Remove one observer. Returns `false` if it was not present.
    pub fn remove(&self, observer: &Observer<A>) -> bool {
        let mut observers = self.observers.borrow_mut();
        match observers.iter().position(|o| o.same_as(observer)) {
            Some(index) => {
                observers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, observer: &Observer<A>) -> bool {
        self.observers.borrow().iter().any(|o| o.same_as(observer))
    }

    pub fn clear(&self) {
        self.observers.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.observers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.borrow().is_empty()
    }

    /// Copy of the current observers in registration order.
    pub fn snapshot(&self) -> Vec<Observer<A>> {
        self.observers.borrow().clone()
    }

    /// Invoke every observer in registration order, isolating faults.
    pub fn notify(&self, role: ObserverRole, arg: &A) -> DispatchReport {
        let mut report = DispatchReport::default();
        for observer in self.snapshot() {
            report.run(role, observer.name(), || observer.call(arg));
        }
        report
    }
}

impl<A: ?Sized> fmt::Debug for ObserverList<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.observers.borrow().iter()).finish()
    }
}
