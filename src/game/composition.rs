//! Session-scoped composition of channel, machine, registry and history.

use super::config::{EventMapping, GameStateConfig, MappingTarget};
use super::phases::GamePhases;
use crate::channel::{EventChannel, Listener};
use crate::core::{State, StateChange, StateHistory};
use crate::handlers::{Candidate, HandlerId, HandlerRegistry, HandlerSource, ScanSummary, StateHandler};
use crate::machine::{StateMachine, StateObserver};
use crate::observer::DispatchReport;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Event-driven game state machine with bounded history and handler
/// dispatch.
///
/// Construct one per session and pass it by reference to collaborators.
/// Nothing is wired until [`initialize`](Self::initialize) runs; calling it
/// again is a no-op unless [`set_clean`](Self::set_clean) asked for a full
/// re-wire.
///
/// Every applied transition, whether it came from an event, from
/// [`change_state`](Self::change_state) or directly from the underlying
/// [`StateMachine`], is recorded in history and dispatched to handlers as
/// soon as it commits, before the machine's enter and exit hooks run.
///
/// # Example
///
/// ```rust
/// use phasecraft::channel::EventChannel;
/// use phasecraft::game::{GameEvent, GamePhase, GameStateConfig, GameStateMachine};
/// use std::rc::Rc;
///
/// let channel = Rc::new(EventChannel::new());
/// let game = GameStateMachine::<GamePhase>::new(GameStateConfig::default(), Some(Rc::clone(&channel)));
/// game.initialize();
///
/// channel.raise(&GameEvent::LevelStart);
/// channel.raise(&GameEvent::GameStart);
/// channel.raise(&GameEvent::Pause);
/// assert_eq!(game.current_state(), GamePhase::Pause);
///
/// channel.raise(&GameEvent::Resume);
/// assert_eq!(game.current_state(), GamePhase::Playing);
/// ```
pub struct GameStateMachine<S: GamePhases> {
    config: GameStateConfig<S>,
    machine: Rc<StateMachine<S>>,
    channel: Option<Rc<EventChannel<S::Event>>>,
    registry: Rc<HandlerRegistry<S>>,
    history: Rc<RefCell<StateHistory<S>>>,
    source: Option<Box<dyn HandlerSource<S>>>,
    mappings: RefCell<Vec<EventMapping<S>>>,
    subscriptions: RefCell<Vec<(S::Event, Listener<()>)>>,
    mappings_built: Cell<bool>,
    subscribed: Cell<bool>,
    handlers_discovered: Cell<bool>,
    default_transitions_added: Cell<bool>,
    session_started: Cell<bool>,
    clean: Cell<bool>,
}

impl<S: GamePhases> GameStateMachine<S> {
    /// Build the composition. A `None` channel is a configuration fault:
    /// the machine still works, but no event drives it. Other configuration
    /// faults are reported by [`initialize`](Self::initialize).
    pub fn new(config: GameStateConfig<S>, channel: Option<Rc<EventChannel<S::Event>>>) -> Self {
        let machine = Rc::new(StateMachine::new(config.effective_starting_state()));
        let registry = Rc::new(HandlerRegistry::with_filter(config.handler_filter.clone()));
        let history = Rc::new(RefCell::new(StateHistory::with_capacity(
            config.history_capacity,
        )));

        machine.on_commit(Self::recorder(&history, &registry));

        Self {
            config,
            machine,
            channel,
            registry,
            history,
            source: None,
            mappings: RefCell::new(Vec::new()),
            subscriptions: RefCell::new(Vec::new()),
            mappings_built: Cell::new(false),
            subscribed: Cell::new(false),
            handlers_discovered: Cell::new(false),
            default_transitions_added: Cell::new(false),
            session_started: Cell::new(false),
            clean: Cell::new(false),
        }
    }

    /// Use `source` for handler discovery. Without one, discovery yields an
    /// empty (but initialized) registry.
    pub fn with_handler_source(mut self, source: impl HandlerSource<S> + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    fn recorder(
        history: &Rc<RefCell<StateHistory<S>>>,
        registry: &Rc<HandlerRegistry<S>>,
    ) -> StateObserver<S> {
        let history = Rc::clone(history);
        let registry = Rc::clone(registry);
        StateObserver::from_fn("game-state-recorder", move |change: &StateChange<S>| {
            history.borrow_mut().record(change.to.clone());
            registry.dispatch(change);
        })
    }

    /// Wire everything that is not wired yet. Safe to call repeatedly.
    pub fn initialize(&self) {
        if self.clean.replace(false) {
            info!("Clean initialization requested; re-wiring from scratch");
            self.unwire();
        }

        if !self.default_transitions_added.get() {
            for fault in self.config.faults() {
                warn!(%fault, "Configuration fault");
            }
            self.add_transitions();
            self.default_transitions_added.set(true);
        }

        if !self.mappings_built.get() {
            *self.mappings.borrow_mut() = self.resolve_mappings();
            self.mappings_built.set(true);
        }

        if !self.subscribed.get() {
            self.subscribe_mappings();
            self.subscribed.set(true);
        }

        if !self.handlers_discovered.get() {
            self.rescan_handlers();
        }

        if !self.session_started.get() {
            self.machine.reset_to_starting_state();
            let starting = self.machine.current_state();
            {
                let mut history = self.history.borrow_mut();
                history.clear();
                history.record(starting.clone());
            }
            self.session_started.set(true);
            info!(state = %starting.name(), "Game session started");
        }
    }

    /// Request a full re-wire on the next [`initialize`](Self::initialize).
    pub fn set_clean(&self, clean: bool) {
        self.clean.set(clean);
    }

    pub fn is_clean(&self) -> bool {
        self.clean.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.default_transitions_added.get()
            && self.mappings_built.get()
            && self.subscribed.get()
            && self.handlers_discovered.get()
            && self.session_started.get()
    }

    fn add_transitions(&self) {
        let rules = self.config.transitions.iter();
        let defaults = if self.config.include_default_transitions {
            S::default_transitions()
        } else {
            Vec::new()
        };

        for rule in rules.chain(defaults.iter()) {
            if rule.from.is_null() {
                continue;
            }
            for (from, to) in rule.pairs().filter(|(_, to)| !to.is_null()) {
                self.machine.add_transition(from, to);
            }
        }
        self.machine.set_no_restrictions(self.config.no_restrictions);
    }

    fn resolve_mappings(&self) -> Vec<EventMapping<S>> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();

        for mapping in &self.config.event_mappings {
            if mapping.target == MappingTarget::State(S::default()) {
                continue;
            }
            if seen.insert(mapping.event.clone()) {
                resolved.push(mapping.clone());
            }
        }

        for mapping in S::default_event_mappings() {
            if seen.insert(mapping.event.clone()) {
                resolved.push(mapping);
            } else {
                debug!(event = ?mapping.event, "Built-in mapping overridden by configuration");
            }
        }
        resolved
    }

    fn subscribe_mappings(&self) {
        let Some(channel) = &self.channel else {
            warn!("No event channel; automatic transitions are disabled");
            return;
        };

        let mut subscriptions = self.subscriptions.borrow_mut();
        for mapping in self.mappings.borrow().iter() {
            let listener = self.listener_for(&mapping.target, &mapping.event);
            if channel.add_listener(mapping.event.clone(), listener.clone()) {
                subscriptions.push((mapping.event.clone(), listener));
            }
        }
        debug!(count = subscriptions.len(), "Subscribed event mappings");
    }

    fn listener_for(&self, target: &MappingTarget<S>, event: &S::Event) -> Listener<()> {
        let machine = Rc::clone(&self.machine);
        let history = Rc::clone(&self.history);
        let target = target.clone();
        Listener::from_fn(format!("{event:?} -> {target}"), move |_: &()| match &target {
            MappingTarget::State(state) => {
                machine.change_state(state.clone());
            }
            MappingTarget::PreviousContext => {
                return_to_previous(&machine, &history);
            }
        })
    }

    fn unsubscribe_mappings(&self) {
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        if let Some(channel) = &self.channel {
            for (event, listener) in &subscriptions {
                channel.remove_listener(event, listener);
            }
        }
    }

    fn unwire(&self) {
        self.unsubscribe_mappings();
        self.mappings.borrow_mut().clear();
        self.machine.clear_all_transitions();
        self.registry.clear_all_handlers();
        self.history.borrow_mut().clear();

        self.mappings_built.set(false);
        self.subscribed.set(false);
        self.handlers_discovered.set(false);
        self.default_transitions_added.set(false);
        self.session_started.set(false);
    }

    /// Request a transition. See [`StateMachine::change_state`].
    pub fn change_state(&self, state: S) -> bool {
        self.machine.change_state(state)
    }

    /// Move back to the state before the current one.
    ///
    /// Returns `false` without transitioning if history holds fewer than two
    /// entries or the table rejects the move.
    pub fn return_to_previous_context(&self) -> bool {
        return_to_previous(&self.machine, &self.history)
    }

    /// Raise `event` on the channel this composition listens to.
    pub fn raise(&self, event: &S::Event) -> DispatchReport {
        match &self.channel {
            Some(channel) => channel.raise(event),
            None => {
                warn!(event = ?event, "Cannot raise event without an event channel");
                DispatchReport::default()
            }
        }
    }

    /// Replace the handler set with a fresh scan of the handler source.
    pub fn rescan_handlers(&self) -> ScanSummary {
        let summary = match &self.source {
            Some(source) => self.registry.scan_for_handlers(&**source),
            None => {
                let empty = Vec::<Candidate<S>>::new;
                self.registry.scan_for_handlers(&empty)
            }
        };
        self.handlers_discovered.set(true);
        summary
    }

    /// Register a handler outside discovery. Register after
    /// [`initialize`](Self::initialize): the first initialization scans the
    /// handler source, which replaces the set and warns about each manual
    /// registration it drops.
    pub fn register_handler(&self, handler: Rc<dyn StateHandler<S>>) -> HandlerId {
        self.registry.register_handler(handler)
    }

    pub fn unregister_handler(&self, handler: &Rc<dyn StateHandler<S>>) -> bool {
        self.registry.unregister_handler(handler)
    }

    pub fn current_state(&self) -> S {
        self.machine.current_state()
    }

    /// A copy of the recent-state buffer, oldest first.
    pub fn history(&self) -> StateHistory<S> {
        self.history.borrow().clone()
    }

    pub fn previous_context(&self) -> Option<S> {
        self.history.borrow().previous_context().cloned()
    }

    pub fn config(&self) -> &GameStateConfig<S> {
        &self.config
    }

    pub fn machine(&self) -> &StateMachine<S> {
        &self.machine
    }

    pub fn registry(&self) -> &HandlerRegistry<S> {
        &self.registry
    }

    pub fn channel(&self) -> Option<&Rc<EventChannel<S::Event>>> {
        self.channel.as_ref()
    }

    /// Remove this composition's channel subscriptions, drop its handlers
    /// and forget its history. Listeners other code added to a shared
    /// channel are left alone. A later [`initialize`](Self::initialize)
    /// wires everything again.
    pub fn shutdown(&self) {
        self.unwire();
        info!("Game session shut down");
    }
}

fn return_to_previous<S: State>(machine: &StateMachine<S>, history: &RefCell<StateHistory<S>>) -> bool {
    let previous = history.borrow().previous_context().cloned();
    match previous {
        Some(state) => machine.change_state(state),
        None => {
            warn!(
                entries = history.borrow().len(),
                "No previous context to return to"
            );
            false
        }
    }
}

impl<S: GamePhases> Drop for GameStateMachine<S> {
    fn drop(&mut self) {
        self.unsubscribe_mappings();
    }
}

impl<S: GamePhases> std::fmt::Debug for GameStateMachine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameStateMachine")
            .field("current", &self.machine.current_state())
            .field("history", &self.history.borrow())
            .field("handlers", &self.registry.len())
            .field("subscriptions", &self.subscriptions.borrow().len())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
