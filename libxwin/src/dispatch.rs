//! The event dispatcher multiplexes a single inbound event stream into per-window, per-event
//! type handlers.
//!
//! A background thread polls the [`EventSource`] every few milliseconds while at least one
//! handler is registered. Each pending event is routed through the registry
//! `window -> event type -> handler` and delivered on the dispatcher thread. There is at most one
//! handler per window and event type, registering another one for the same pair replaces it.
//!
//! The registry is shared between the dispatcher thread and the callers of
//! [`EventDispatcher::register`] and [`EventDispatcher::unregister`] and lives behind a mutex.
//! Handlers are always invoked with the lock released so that they are free to register or
//! unregister handlers themselves.
use std::{
    collections::HashMap,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Condvar, Mutex, MutexGuard},
    thread::{self, JoinHandle},
    time::Duration,
};

use tracing::{debug, error, info, trace, warn};
use x11rb::protocol::xproto::EventMask;

use crate::{WindowError, WindowResult};

/// Identifier of a window on the transport
pub type WindowId = u32;

/// Identifier of an event type on the transport, e.g. the X11 response type
pub type EventType = u8;

/// Default time between two polls of the event source
pub const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Event that can be routed to a window's handlers
pub trait DispatchEvent: Send + 'static {
    /// Window the event belongs to, `None` for events that aren't about a window
    fn window(&self) -> Option<WindowId>;

    /// Transport level type of the event
    fn event_type(&self) -> EventType;
}

/// Source of events polled by the dispatcher
pub trait EventSource: Send + Sync + 'static {
    type Event: DispatchEvent;

    /// Number of events queued and ready to be read without blocking
    fn pending_events(&self) -> WindowResult<usize>;

    /// Pop the next queued event
    fn next_event(&self) -> WindowResult<Option<Self::Event>>;
}

/// Receiver of the events of a window
pub trait EventHandler<E>: Send + Sync {
    /// Event mask the window has to select for this handler to get its events
    fn mask(&self) -> EventMask;

    /// Event types this handler wants delivered
    fn types(&self) -> &[EventType];

    /// Handle a single event, called on the dispatcher thread
    fn handle(&self, event: &E) -> WindowResult<()>;
}

/// Lifecycle of the dispatcher thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Running,
    Stopping,
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

type HandlerRef<E> = Arc<dyn EventHandler<E>>;

struct Registry<E> {
    state: DispatcherState,
    handlers: HashMap<WindowId, HashMap<EventType, HandlerRef<E>>>,
    thread: Option<JoinHandle<()>>,
}

struct Shared<E> {
    registry: Mutex<Registry<E>>,
    changed: Condvar,
}

impl<E> Shared<E> {
    fn lock(&self) -> WindowResult<MutexGuard<'_, Registry<E>>> {
        self.registry
            .lock()
            .map_err(|_| WindowError::DispatcherUnavailable("registry lock poisoned".to_owned()).into())
    }
}

/// EventDispatcher owns the handler registry and the thread delivering events to it.
///
/// The thread is started by the first registration and stops once the registry is empty or
/// [`EventDispatcher::stop`] is called. A later registration starts it again.
pub struct EventDispatcher<S: EventSource> {
    source: Arc<S>,
    interval: Duration,
    shared: Arc<Shared<S::Event>>,
}

impl<S: EventSource> EventDispatcher<S> {
    /// Create a dispatcher polling the given source every [`POLL_INTERVAL`]
    pub fn new(source: Arc<S>) -> Self {
        Self::with_interval(source, POLL_INTERVAL)
    }

    /// Create a dispatcher polling the given source at the given interval
    ///
    /// ### Arguments
    /// * `source` - event source shared with the dispatcher thread
    /// * `interval` - time to sleep between two polls, bounds the dispatch latency
    pub fn with_interval(source: Arc<S>, interval: Duration) -> Self {
        Self {
            source,
            interval,
            shared: Arc::new(Shared {
                registry: Mutex::new(Registry {
                    state: DispatcherState::Idle,
                    handlers: HashMap::new(),
                    thread: None,
                }),
                changed: Condvar::new(),
            }),
        }
    }

    /// Current lifecycle state of the dispatcher thread
    pub fn state(&self) -> WindowResult<DispatcherState> {
        Ok(self.shared.lock()?.state)
    }

    /// True if any handler is registered for the given window
    pub fn is_registered(&self, window: WindowId) -> WindowResult<bool> {
        Ok(self.shared.lock()?.handlers.contains_key(&window))
    }

    /// Register the handler for every event type it declares on the given window, replacing
    /// any handler already registered for the same type. Starts the dispatcher thread if needed.
    ///
    /// Returns the masks of all handlers now registered for the window; the caller selects their
    /// union on the window.
    pub fn register(&self, window: WindowId, handler: HandlerRef<S::Event>) -> WindowResult<Vec<EventMask>> {
        info!("register: window: {}, mask: {:?}, types: {:?}", window, handler.mask(), handler.types());
        let mut registry = self.shared.lock()?;
        if handler.types().is_empty() {
            warn!("register: window: {}, handler declares no event types", window);
            return Ok(registry.handlers.get(&window).map(masks).unwrap_or_default());
        }

        let entry = registry.handlers.entry(window).or_default();
        for type_ in handler.types() {
            entry.insert(*type_, handler.clone());
        }
        let result = masks(entry);
        debug!("register: windows: {}", registry.handlers.len());

        match registry.state {
            DispatcherState::Idle => self.start(&mut registry)?,
            DispatcherState::Stopping => {
                // The thread hasn't exited yet, keep it
                debug!("register: cancelling stop");
                registry.state = DispatcherState::Running;
                self.shared.changed.notify_all();
            },
            DispatcherState::Running => {},
        }
        Ok(result)
    }

    /// Unregister the given handler's event types from the window, or every handler of the window
    /// when `handler` is `None`.
    ///
    /// Returns the masks of the handlers still registered for the window. An empty result means
    /// nothing is left and the window's event mask should be reset.
    pub fn unregister(
        &self, window: WindowId, handler: Option<&dyn EventHandler<S::Event>>,
    ) -> WindowResult<Vec<EventMask>> {
        let mut registry = self.shared.lock()?;
        let remaining = {
            let entry = match registry.handlers.get_mut(&window) {
                Some(entry) => entry,
                None => {
                    warn!("unregister: window: {}, no handlers registered", window);
                    return Ok(vec![]);
                },
            };
            match handler {
                None => {
                    info!("unregister: window: {}, all handlers", window);
                    entry.clear();
                },
                Some(handler) => {
                    info!("unregister: window: {}, mask: {:?}, types: {:?}", window, handler.mask(), handler.types());
                    for type_ in handler.types() {
                        if entry.remove(type_).is_none() {
                            debug!("unregister: window: {}, type: {} was not registered", window, type_);
                        }
                    }
                },
            }
            if entry.is_empty() {
                None
            } else {
                Some(masks(entry))
            }
        };

        match remaining {
            Some(result) => Ok(result),
            None => {
                registry.handlers.remove(&window);
                debug!("unregister: windows: {}", registry.handlers.len());
                Ok(vec![])
            },
        }
    }

    /// Ask the dispatcher thread to stop and wait for it to exit. Registered handlers are kept
    /// and the next registration starts the thread again.
    ///
    /// Returns the state the dispatcher ended up in: `Idle` once the thread has exited, `Running`
    /// if a concurrent registration cancelled the stop. Called from a handler, i.e. on the
    /// dispatcher thread itself, this only requests the stop and returns `Stopping`; the thread
    /// exits once the handler returns.
    pub fn stop(&self) -> WindowResult<DispatcherState> {
        let mut registry = self.shared.lock()?;
        if registry.state == DispatcherState::Running {
            info!("stop: stopping dispatcher");
            registry.state = DispatcherState::Stopping;
        }
        if on_thread(&registry.thread) {
            return Ok(registry.state);
        }
        while registry.state == DispatcherState::Stopping {
            registry = self
                .shared
                .changed
                .wait(registry)
                .map_err(|_| WindowError::DispatcherUnavailable("registry lock poisoned".to_owned()))?;
        }
        let state = registry.state;
        let handle = match state {
            DispatcherState::Idle => registry.thread.take(),
            _ => None,
        };
        drop(registry);

        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("stop: dispatcher thread panicked");
            }
        }
        if state != DispatcherState::Idle {
            debug!("stop: cancelled, state: {}", state);
        }
        Ok(state)
    }

    // Spawn the dispatcher thread, the registry lock must be held
    fn start(&self, registry: &mut Registry<S::Event>) -> WindowResult<()> {
        // A previous thread has already left its loop when the state is idle
        if let Some(previous) = registry.thread.take() {
            drop(previous);
        }
        let source = self.source.clone();
        let shared = self.shared.clone();
        let interval = self.interval;
        let handle = thread::Builder::new().name("event-dispatcher".to_owned()).spawn(move || {
            run(source, shared, interval);
        })?;
        registry.thread = Some(handle);
        registry.state = DispatcherState::Running;
        Ok(())
    }
}

impl<S: EventSource> Drop for EventDispatcher<S> {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!("drop: failed to stop dispatcher: {}", err);
        }
    }
}

// Unique masks of a window's handlers
fn masks<E>(handlers: &HashMap<EventType, HandlerRef<E>>) -> Vec<EventMask> {
    let mut result: Vec<EventMask> = vec![];
    for handler in handlers.values() {
        let mask = handler.mask();
        if !result.contains(&mask) {
            result.push(mask);
        }
    }
    result.sort_by_key(|mask| u32::from(*mask));
    result
}

fn on_thread(handle: &Option<JoinHandle<()>>) -> bool {
    handle.as_ref().map(|x| x.thread().id() == thread::current().id()).unwrap_or(false)
}

// Dispatcher thread main loop
fn run<S: EventSource>(source: Arc<S>, shared: Arc<Shared<S::Event>>, interval: Duration) {
    info!("dispatcher: started");
    loop {
        thread::sleep(interval);
        match shared.lock() {
            Ok(mut registry) => {
                if registry.state == DispatcherState::Stopping || registry.handlers.is_empty() {
                    registry.state = DispatcherState::Idle;
                    shared.changed.notify_all();
                    break;
                }
            },
            Err(err) => {
                error!("dispatcher: {}", err);
                break;
            },
        }

        // Dispatch all pending events
        loop {
            match source.pending_events() {
                Ok(0) => break,
                Ok(_) => match source.next_event() {
                    Ok(Some(event)) => dispatch(&shared, event),
                    Ok(None) => break,
                    Err(err) => {
                        warn!("dispatcher: failed to read event: {}", err);
                        break;
                    },
                },
                Err(err) => {
                    warn!("dispatcher: failed to poll events: {}", err);
                    break;
                },
            }
        }
    }
    info!("dispatcher: stopped");
}

// Route a single event to its handler
fn dispatch<E: DispatchEvent>(shared: &Shared<E>, event: E) {
    let type_ = event.event_type();
    let window = match event.window() {
        Some(window) => window,
        None => {
            trace!("dispatch: type: {} has no window", type_);
            return;
        },
    };

    let handler = {
        let registry = match shared.lock() {
            Ok(registry) => registry,
            Err(err) => {
                error!("dispatch: {}", err);
                return;
            },
        };
        let handlers = match registry.handlers.get(&window) {
            Some(handlers) => handlers,
            None => {
                error!("dispatch: no handler for window: {}", window);
                return;
            },
        };
        match handlers.get(&type_) {
            Some(handler) => handler.clone(),
            None => {
                trace!("dispatch: window: {}, type: {} not handled", window, type_);
                return;
            },
        }
    };

    trace!("dispatch: window: {}, type: {}", window, type_);
    match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&event))) {
        Ok(Ok(())) => {},
        Ok(Err(err)) => warn!("dispatch: window: {}, type: {}, handler failed: {}", window, type_, err),
        Err(_) => error!("dispatch: window: {}, type: {}, handler panicked", window, type_),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        collections::VecDeque,
        sync::{mpsc, Weak},
        time::Instant,
    };

    const TYPE_A: EventType = 28;
    const TYPE_B: EventType = 22;

    #[derive(Debug, Clone, PartialEq)]
    struct FakeEvent {
        window: Option<WindowId>,
        kind: EventType,
    }

    impl DispatchEvent for FakeEvent {
        fn window(&self) -> Option<WindowId> {
            self.window
        }

        fn event_type(&self) -> EventType {
            self.kind
        }
    }

    #[derive(Default)]
    struct FakeSource {
        queue: Mutex<VecDeque<FakeEvent>>,
    }

    impl FakeSource {
        fn push(&self, window: WindowId, kind: EventType) {
            self.queue.lock().unwrap().push_back(FakeEvent { window: Some(window), kind });
        }

        fn is_empty(&self) -> bool {
            self.queue.lock().unwrap().is_empty()
        }
    }

    impl EventSource for FakeSource {
        type Event = FakeEvent;

        fn pending_events(&self) -> WindowResult<usize> {
            Ok(self.queue.lock().unwrap().len())
        }

        fn next_event(&self) -> WindowResult<Option<FakeEvent>> {
            Ok(self.queue.lock().unwrap().pop_front())
        }
    }

    type Log = Arc<Mutex<Vec<(&'static str, WindowId, EventType)>>>;

    struct Recorder {
        name: &'static str,
        mask: EventMask,
        types: Vec<EventType>,
        log: Log,
    }

    impl Recorder {
        fn new(name: &'static str, mask: EventMask, types: &[EventType], log: &Log) -> Arc<Self> {
            Arc::new(Self { name, mask, types: types.to_vec(), log: log.clone() })
        }
    }

    impl EventHandler<FakeEvent> for Recorder {
        fn mask(&self) -> EventMask {
            self.mask
        }

        fn types(&self) -> &[EventType] {
            &self.types
        }

        fn handle(&self, event: &FakeEvent) -> WindowResult<()> {
            self.log.lock().unwrap().push((self.name, event.window.unwrap(), event.kind));
            Ok(())
        }
    }

    struct Failing {
        panic: bool,
    }

    impl EventHandler<FakeEvent> for Failing {
        fn mask(&self) -> EventMask {
            EventMask::PROPERTY_CHANGE
        }

        fn types(&self) -> &[EventType] {
            &[TYPE_A]
        }

        fn handle(&self, _: &FakeEvent) -> WindowResult<()> {
            if self.panic {
                panic!("handler blew up");
            }
            Err(WindowError::HandlerFailed("expected".to_owned()).into())
        }
    }

    fn dispatcher() -> (Arc<FakeSource>, EventDispatcher<FakeSource>) {
        let source = Arc::new(FakeSource::default());
        let dispatcher = EventDispatcher::with_interval(source.clone(), Duration::from_millis(1));
        (source, dispatcher)
    }

    fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        cond()
    }

    fn log() -> Log {
        Arc::new(Mutex::new(vec![]))
    }

    #[test]
    fn test_register_returns_union_of_masks() {
        let (_, dispatcher) = dispatcher();
        let log = log();
        let first = Recorder::new("first", EventMask::PROPERTY_CHANGE, &[TYPE_A], &log);
        let second = Recorder::new("second", EventMask::STRUCTURE_NOTIFY, &[TYPE_B], &log);

        let masks = dispatcher.register(1, first.clone()).unwrap();
        assert_eq!(masks, vec![EventMask::PROPERTY_CHANGE]);

        let mut masks = dispatcher.register(1, second).unwrap();
        masks.sort_by_key(|x| u32::from(*x));
        let mut expected = vec![EventMask::PROPERTY_CHANGE, EventMask::STRUCTURE_NOTIFY];
        expected.sort_by_key(|x| u32::from(*x));
        assert_eq!(masks, expected);

        let masks = dispatcher.unregister(1, Some(first.as_ref())).unwrap();
        assert_eq!(masks, vec![EventMask::STRUCTURE_NOTIFY]);
        dispatcher.stop().unwrap();
    }

    #[test]
    fn test_shared_mask_reported_once() {
        let (_, dispatcher) = dispatcher();
        let log = log();
        dispatcher.register(1, Recorder::new("a", EventMask::PROPERTY_CHANGE, &[TYPE_A], &log)).unwrap();
        let masks =
            dispatcher.register(1, Recorder::new("b", EventMask::PROPERTY_CHANGE, &[TYPE_B], &log)).unwrap();
        assert_eq!(masks, vec![EventMask::PROPERTY_CHANGE]);
    }

    #[test]
    fn test_events_are_delivered_by_window_and_type() {
        let (source, dispatcher) = dispatcher();
        let log = log();
        dispatcher.register(1, Recorder::new("one", EventMask::PROPERTY_CHANGE, &[TYPE_A], &log)).unwrap();
        dispatcher.register(2, Recorder::new("two", EventMask::PROPERTY_CHANGE, &[TYPE_A, TYPE_B], &log)).unwrap();

        source.push(1, TYPE_A);
        source.push(1, TYPE_B); // not handled for window 1
        source.push(2, TYPE_B);
        source.push(3, TYPE_A); // unknown window
        assert!(wait_until(|| source.is_empty() && log.lock().unwrap().len() == 2));
        assert_eq!(*log.lock().unwrap(), vec![("one", 1, TYPE_A), ("two", 2, TYPE_B)]);
    }

    #[test]
    fn test_second_handler_replaces_first() {
        let (source, dispatcher) = dispatcher();
        let log = log();
        dispatcher.register(1, Recorder::new("first", EventMask::PROPERTY_CHANGE, &[TYPE_A], &log)).unwrap();
        dispatcher.register(1, Recorder::new("second", EventMask::PROPERTY_CHANGE, &[TYPE_A], &log)).unwrap();

        source.push(1, TYPE_A);
        assert!(wait_until(|| !log.lock().unwrap().is_empty()));
        assert!(wait_until(|| source.is_empty()));
        assert_eq!(*log.lock().unwrap(), vec![("second", 1, TYPE_A)]);
    }

    #[test]
    fn test_unregister_all_drops_window() {
        let (source, dispatcher) = dispatcher();
        let log = log();
        dispatcher.register(1, Recorder::new("one", EventMask::PROPERTY_CHANGE, &[TYPE_A, TYPE_B], &log)).unwrap();
        dispatcher.register(2, Recorder::new("two", EventMask::PROPERTY_CHANGE, &[TYPE_A], &log)).unwrap();

        assert_eq!(dispatcher.unregister(1, None).unwrap(), vec![]);
        assert!(!dispatcher.is_registered(1).unwrap());
        assert!(dispatcher.is_registered(2).unwrap());

        source.push(1, TYPE_A);
        source.push(2, TYPE_A);
        assert!(wait_until(|| source.is_empty() && !log.lock().unwrap().is_empty()));
        assert_eq!(*log.lock().unwrap(), vec![("two", 2, TYPE_A)]);
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let (_, dispatcher) = dispatcher();
        let log = log();
        let handler = Recorder::new("one", EventMask::PROPERTY_CHANGE, &[TYPE_A], &log);
        assert_eq!(dispatcher.unregister(9, None).unwrap(), vec![]);
        assert_eq!(dispatcher.unregister(9, Some(handler.as_ref())).unwrap(), vec![]);

        dispatcher.register(1, handler).unwrap();
        let other = Recorder::new("other", EventMask::STRUCTURE_NOTIFY, &[TYPE_B], &log);
        assert_eq!(dispatcher.unregister(1, Some(other.as_ref())).unwrap(), vec![EventMask::PROPERTY_CHANGE]);
        assert!(dispatcher.is_registered(1).unwrap());
    }

    #[test]
    fn test_handler_without_types_is_ignored() {
        let (_, dispatcher) = dispatcher();
        let log = log();
        assert_eq!(dispatcher.register(1, Recorder::new("none", EventMask::PROPERTY_CHANGE, &[], &log)).unwrap(), vec![]);
        assert!(!dispatcher.is_registered(1).unwrap());
        assert_eq!(dispatcher.state().unwrap(), DispatcherState::Idle);
    }

    #[test]
    fn test_lifecycle_follows_registry() {
        let (source, dispatcher) = dispatcher();
        let log = log();
        assert_eq!(dispatcher.state().unwrap(), DispatcherState::Idle);

        let handler = Recorder::new("one", EventMask::PROPERTY_CHANGE, &[TYPE_A], &log);
        dispatcher.register(1, handler.clone()).unwrap();
        assert_eq!(dispatcher.state().unwrap(), DispatcherState::Running);

        dispatcher.unregister(1, Some(handler.as_ref())).unwrap();
        assert!(wait_until(|| dispatcher.state().unwrap() == DispatcherState::Idle));

        // Restartable
        dispatcher.register(1, handler).unwrap();
        assert_eq!(dispatcher.state().unwrap(), DispatcherState::Running);
        source.push(1, TYPE_A);
        assert!(wait_until(|| log.lock().unwrap().len() == 1));
    }

    #[test]
    fn test_explicit_stop() {
        let (source, dispatcher) = dispatcher();
        let log = log();
        dispatcher.register(1, Recorder::new("one", EventMask::PROPERTY_CHANGE, &[TYPE_A], &log)).unwrap();
        assert_eq!(dispatcher.stop().unwrap(), DispatcherState::Idle);
        assert_eq!(dispatcher.state().unwrap(), DispatcherState::Idle);
        assert!(dispatcher.is_registered(1).unwrap());

        // Nothing is delivered while stopped
        source.push(1, TYPE_A);
        thread::sleep(Duration::from_millis(20));
        assert!(log.lock().unwrap().is_empty());

        // Stopping twice is harmless
        assert_eq!(dispatcher.stop().unwrap(), DispatcherState::Idle);

        dispatcher.register(2, Recorder::new("two", EventMask::PROPERTY_CHANGE, &[TYPE_A], &log)).unwrap();
        assert!(wait_until(|| log.lock().unwrap().len() == 1));
        assert_eq!(*log.lock().unwrap(), vec![("one", 1, TYPE_A)]);
    }

    #[test]
    fn test_failing_handlers_do_not_stop_dispatch() {
        let (source, dispatcher) = dispatcher();
        let log = log();
        dispatcher.register(1, Arc::new(Failing { panic: false })).unwrap();
        dispatcher.register(2, Arc::new(Failing { panic: true })).unwrap();
        dispatcher.register(3, Recorder::new("three", EventMask::PROPERTY_CHANGE, &[TYPE_A], &log)).unwrap();

        source.push(1, TYPE_A);
        source.push(2, TYPE_A);
        source.push(3, TYPE_A);
        source.push(2, TYPE_A);
        source.push(3, TYPE_A);
        assert!(wait_until(|| log.lock().unwrap().len() == 2));
        assert_eq!(dispatcher.state().unwrap(), DispatcherState::Running);
    }

    struct SelfRemoving {
        dispatcher: Arc<EventDispatcher<FakeSource>>,
        log: Log,
    }

    impl EventHandler<FakeEvent> for SelfRemoving {
        fn mask(&self) -> EventMask {
            EventMask::PROPERTY_CHANGE
        }

        fn types(&self) -> &[EventType] {
            &[TYPE_A]
        }

        fn handle(&self, event: &FakeEvent) -> WindowResult<()> {
            self.log.lock().unwrap().push(("self", event.window.unwrap(), event.kind));
            self.dispatcher.unregister(event.window.unwrap(), Some(self))?;
            Ok(())
        }
    }

    #[test]
    fn test_handler_can_unregister_itself() {
        let source = Arc::new(FakeSource::default());
        let dispatcher = Arc::new(EventDispatcher::with_interval(source.clone(), Duration::from_millis(1)));
        let log = log();
        let handler = Arc::new(SelfRemoving { dispatcher: dispatcher.clone(), log: log.clone() });
        dispatcher.register(1, handler).unwrap();

        source.push(1, TYPE_A);
        source.push(1, TYPE_A);
        assert!(wait_until(|| dispatcher.state().unwrap() == DispatcherState::Idle));
        assert_eq!(*log.lock().unwrap(), vec![("self", 1, TYPE_A)]);
        assert!(!dispatcher.is_registered(1).unwrap());
    }

    struct Stopper {
        dispatcher: Weak<EventDispatcher<FakeSource>>,
        seen: Mutex<Vec<DispatcherState>>,
    }

    impl EventHandler<FakeEvent> for Stopper {
        fn mask(&self) -> EventMask {
            EventMask::PROPERTY_CHANGE
        }

        fn types(&self) -> &[EventType] {
            &[TYPE_A]
        }

        fn handle(&self, _: &FakeEvent) -> WindowResult<()> {
            if let Some(dispatcher) = self.dispatcher.upgrade() {
                let state = dispatcher.stop()?;
                self.seen.lock().unwrap().push(state);
            }
            Ok(())
        }
    }

    #[test]
    fn test_handler_can_stop_dispatcher() {
        let source = Arc::new(FakeSource::default());
        let dispatcher = Arc::new(EventDispatcher::with_interval(source.clone(), Duration::from_millis(1)));
        let stopper = Arc::new(Stopper { dispatcher: Arc::downgrade(&dispatcher), seen: Mutex::new(vec![]) });
        dispatcher.register(1, stopper.clone()).unwrap();

        source.push(1, TYPE_A);
        assert!(wait_until(|| dispatcher.state().unwrap() == DispatcherState::Idle));
        assert_eq!(*stopper.seen.lock().unwrap(), vec![DispatcherState::Stopping]);
        assert!(dispatcher.is_registered(1).unwrap());

        // The exited thread is joined by the next stop from outside
        assert_eq!(dispatcher.stop().unwrap(), DispatcherState::Idle);
    }

    // Blocks the dispatcher thread inside the handler until released
    struct Gate {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl EventHandler<FakeEvent> for Gate {
        fn mask(&self) -> EventMask {
            EventMask::STRUCTURE_NOTIFY
        }

        fn types(&self) -> &[EventType] {
            &[TYPE_B]
        }

        fn handle(&self, _: &FakeEvent) -> WindowResult<()> {
            let _ = self.entered.lock().unwrap().send(());
            let _ = self.release.lock().unwrap().recv_timeout(Duration::from_secs(5));
            Ok(())
        }
    }

    #[test]
    fn test_register_while_stopping_cancels_stop() {
        let (source, dispatcher) = dispatcher();
        let dispatcher = Arc::new(dispatcher);
        let log = log();
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let gate = Gate { entered: Mutex::new(entered_tx), release: Mutex::new(release_rx) };
        dispatcher.register(1, Arc::new(gate)).unwrap();

        source.push(1, TYPE_B);
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        // The loop is busy in the handler, so the stop can't complete yet
        let stopper = {
            let dispatcher = dispatcher.clone();
            thread::spawn(move || dispatcher.stop().unwrap())
        };
        assert!(wait_until(|| dispatcher.state().unwrap() == DispatcherState::Stopping));

        dispatcher.register(2, Recorder::new("two", EventMask::PROPERTY_CHANGE, &[TYPE_A], &log)).unwrap();
        assert_eq!(dispatcher.state().unwrap(), DispatcherState::Running);

        release_tx.send(()).unwrap();
        assert_eq!(stopper.join().unwrap(), DispatcherState::Running);

        source.push(2, TYPE_A);
        assert!(wait_until(|| log.lock().unwrap().len() == 1));
        assert_eq!(*log.lock().unwrap(), vec![("two", 2, TYPE_A)]);
        assert_eq!(dispatcher.state().unwrap(), DispatcherState::Running);
        assert_eq!(dispatcher.stop().unwrap(), DispatcherState::Idle);
    }

    #[test]
    fn test_concurrent_register_and_unregister() {
        let (source, dispatcher) = dispatcher();
        let log = log();
        let windows = |i: WindowId| (i * 10..i * 10 + 4).collect::<Vec<_>>();

        thread::scope(|s| {
            for i in 0..8 {
                let (source, dispatcher, log) = (&source, &dispatcher, &log);
                s.spawn(move || {
                    let windows = windows(i);
                    for _ in 0..50 {
                        for w in windows.iter() {
                            let handler = Recorder::new("a", EventMask::PROPERTY_CHANGE, &[TYPE_A], log);
                            assert!(dispatcher.register(*w, handler).unwrap().contains(&EventMask::PROPERTY_CHANGE));
                            source.push(*w, TYPE_A);
                        }
                        for w in windows.iter() {
                            let handler = Recorder::new("b", EventMask::STRUCTURE_NOTIFY, &[TYPE_B], log);
                            assert_eq!(dispatcher.register(*w, handler).unwrap().len(), 2);
                        }
                        for w in windows.iter().skip(1) {
                            assert_eq!(dispatcher.unregister(*w, None).unwrap(), vec![]);
                        }
                    }
                });
            }
        });

        let b = Recorder::new("b", EventMask::STRUCTURE_NOTIFY, &[TYPE_B], &log);
        for i in 0..8 {
            let windows = windows(i);
            assert!(dispatcher.is_registered(windows[0]).unwrap());
            for w in windows.iter().skip(1) {
                assert!(!dispatcher.is_registered(*w).unwrap());
            }
            assert_eq!(dispatcher.unregister(windows[0], Some(b.as_ref())).unwrap(), vec![EventMask::PROPERTY_CHANGE]);
        }
        assert_eq!(dispatcher.state().unwrap(), DispatcherState::Running);

        for i in 0..8 {
            assert_eq!(dispatcher.unregister(windows(i)[0], None).unwrap(), vec![]);
        }
        assert!(wait_until(|| dispatcher.state().unwrap() == DispatcherState::Idle));
    }
}
