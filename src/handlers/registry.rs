//! Priority-ordered registry of state handlers.

use super::handler::{HandlerId, StateHandler};
use super::source::{HandlerSource, TagFilter};
use crate::core::{State, StateChange};
use crate::observer::{DispatchReport, ObserverRole};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// One registration: the handler plus the bookkeeping the registry keeps
/// about it.
pub struct HandlerRecord<S: State> {
    pub id: HandlerId,
    pub name: String,
    pub priority: i32,
    pub enabled: bool,
    /// Added with `register_handler` rather than found by a scan
    pub manual: bool,
    pub handler: Rc<dyn StateHandler<S>>,
}

impl<S: State> Clone for HandlerRecord<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            priority: self.priority,
            enabled: self.enabled,
            manual: self.manual,
            handler: Rc::clone(&self.handler),
        }
    }
}

/// Counts from one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub registered: usize,
    pub filtered_out: usize,
    pub missing_capability: usize,
    /// Manually registered handlers the scan removed
    pub dropped_manual: usize,
}

/// Handler set sorted ascending by priority.
///
/// Dispatch walks a snapshot of the set, so handlers may register or
/// unregister handlers (or trigger further transitions) while a dispatch is
/// running.
pub struct HandlerRegistry<S: State> {
    records: RefCell<Vec<HandlerRecord<S>>>,
    filter: RefCell<TagFilter>,
    initialized: Cell<bool>,
}

impl<S: State> Default for HandlerRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

fn same_handler<S: State>(a: &Rc<dyn StateHandler<S>>, b: &Rc<dyn StateHandler<S>>) -> bool {
    std::ptr::eq(
        Rc::as_ptr(a) as *const (),
        Rc::as_ptr(b) as *const (),
    )
}

impl<S: State> HandlerRegistry<S> {
    pub fn new() -> Self {
        Self::with_filter(TagFilter::default())
    }

    pub fn with_filter(filter: TagFilter) -> Self {
        Self {
            records: RefCell::new(Vec::new()),
            filter: RefCell::new(filter),
            initialized: Cell::new(false),
        }
    }

    pub fn set_filter(&self, filter: TagFilter) {
        *self.filter.borrow_mut() = filter;
    }

    /// Replace the handler set with every admitted candidate from `source`
    /// that exposes the handler capability.
    ///
    /// Manually registered handlers the scan does not find again are
    /// removed with a warning each.
    pub fn scan_for_handlers(&self, source: &dyn HandlerSource<S>) -> ScanSummary {
        let filter = self.filter.borrow().clone();
        let mut summary = ScanSummary::default();
        let mut records = Vec::new();

        for candidate in source.candidates() {
            if !filter.admits(&candidate.tags) {
                summary.filtered_out += 1;
                continue;
            }
            let Some(handler) = candidate.handler else {
                warn!(
                    candidate = %candidate.name,
                    "Scanned object does not expose the state handler capability"
                );
                summary.missing_capability += 1;
                continue;
            };
            if records
                .iter()
                .any(|r: &HandlerRecord<S>| same_handler(&r.handler, &handler))
            {
                continue;
            }
            records.push(Self::record_for(handler, false));
            summary.registered += 1;
        }

        Self::sort(&mut records);
        let previous = std::mem::replace(&mut *self.records.borrow_mut(), records);
        for dropped in previous.iter().filter(|old| old.manual && !self.contains(&old.handler)) {
            warn!(
                handler = %dropped.name,
                "Scan replaced a manually registered handler"
            );
            summary.dropped_manual += 1;
        }
        self.initialized.set(true);

        info!(
            registered = summary.registered,
            filtered_out = summary.filtered_out,
            missing_capability = summary.missing_capability,
            dropped_manual = summary.dropped_manual,
            "Handler scan complete"
        );
        summary
    }

    /// Register a handler created outside a scan.
    ///
    /// Registering the same instance twice returns the existing id. A later
    /// [`scan_for_handlers`](Self::scan_for_handlers) replaces the whole set,
    /// manual registrations included.
    pub fn register_handler(&self, handler: Rc<dyn StateHandler<S>>) -> HandlerId {
        let mut records = self.records.borrow_mut();
        if let Some(existing) = records.iter().find(|r| same_handler(&r.handler, &handler)) {
            debug!(handler = %existing.name, "Handler already registered");
            return existing.id;
        }

        let record = Self::record_for(handler, true);
        let id = record.id;
        debug!(handler = %record.name, priority = record.priority, "Registered handler");
        records.push(record);
        Self::sort(&mut records);
        self.initialized.set(true);
        id
    }

    pub fn unregister_handler(&self, handler: &Rc<dyn StateHandler<S>>) -> bool {
        let mut records = self.records.borrow_mut();
        match records.iter().position(|r| same_handler(&r.handler, handler)) {
            Some(index) => {
                records.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn unregister_by_id(&self, id: HandlerId) -> bool {
        let mut records = self.records.borrow_mut();
        match records.iter().position(|r| r.id == id) {
            Some(index) => {
                records.remove(index);
                true
            }
            None => false,
        }
    }

    /// Empty the set and mark the registry uninitialized.
    pub fn clear_all_handlers(&self) {
        self.records.borrow_mut().clear();
        self.initialized.set(false);
    }

    /// Toggle a registration's `enabled` flag. Returns `false` for an
    /// unknown id.
    pub fn set_enabled(&self, id: HandlerId, enabled: bool) -> bool {
        match self.records.borrow_mut().iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Invoke every enabled handler in priority order, isolating faults.
    ///
    /// A dispatch on an uninitialized registry logs a warning and does
    /// nothing.
    pub fn dispatch(&self, change: &StateChange<S>) -> DispatchReport {
        let mut report = DispatchReport::default();
        if !self.initialized.get() {
            warn!(change = %change, "Dispatch on an uninitialized handler registry");
            return report;
        }

        let snapshot = self.records.borrow().clone();
        for record in snapshot {
            if !record.enabled || !record.handler.is_enabled() {
                report.skip();
                continue;
            }
            report.run(ObserverRole::Handler, &record.name, || {
                record.handler.handle_state_change(change)
            });
        }
        report
    }

    /// Handler names in dispatch order.
    pub fn handler_names(&self) -> Vec<String> {
        self.records.borrow().iter().map(|r| r.name.clone()).collect()
    }

    pub fn contains(&self, handler: &Rc<dyn StateHandler<S>>) -> bool {
        self.records
            .borrow()
            .iter()
            .any(|r| same_handler(&r.handler, handler))
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    fn record_for(handler: Rc<dyn StateHandler<S>>, manual: bool) -> HandlerRecord<S> {
        HandlerRecord {
            id: HandlerId::new(),
            name: handler.name().to_string(),
            priority: handler.priority(),
            enabled: true,
            manual,
            handler,
        }
    }

    // Stable, so equal priorities keep registration order.
    fn sort(records: &mut [HandlerRecord<S>]) {
        records.sort_by_key(|r| r.priority);
    }
}
