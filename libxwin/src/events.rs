//! X11 side of the event dispatcher: the connection as an [`EventSource`], routing of x11rb
//! events and closure backed handlers.
use std::{collections::VecDeque, marker::PhantomData, sync::Arc, sync::Mutex};

use tracing::trace;
use x11rb::{
    connection::Connection,
    protocol::{
        xproto::{self, EventMask},
        Event,
    },
    rust_connection::RustConnection,
};

use crate::{DispatchEvent, EventHandler, EventSource, EventType, WindowError, WindowId, WindowResult};

/// XEventSource reads the events of the shared X11 connection. Events are buffered so that the
/// number of pending events can be reported without blocking.
pub struct XEventSource {
    conn: Arc<RustConnection>,
    queue: Mutex<VecDeque<Event>>,
}

impl XEventSource {
    pub fn new(conn: Arc<RustConnection>) -> Self {
        Self { conn, queue: Mutex::new(VecDeque::new()) }
    }

    fn queue(&self) -> WindowResult<std::sync::MutexGuard<'_, VecDeque<Event>>> {
        self.queue.lock().map_err(|_| WindowError::DispatcherUnavailable("event queue lock poisoned".to_owned()).into())
    }
}

impl EventSource for XEventSource {
    type Event = Event;

    fn pending_events(&self) -> WindowResult<usize> {
        let mut queue = self.queue()?;
        while let Some(event) = self.conn.poll_for_event()? {
            trace!("pending_events: {:?}", event);
            queue.push_back(event);
        }
        Ok(queue.len())
    }

    fn next_event(&self) -> WindowResult<Option<Event>> {
        Ok(self.queue()?.pop_front())
    }
}

// Window and response type of the events a client can select on a window
fn route(event: &Event) -> Option<(WindowId, EventType)> {
    match event {
        Event::PropertyNotify(e) => Some((e.window, xproto::PROPERTY_NOTIFY_EVENT)),
        Event::ConfigureNotify(e) => Some((e.window, xproto::CONFIGURE_NOTIFY_EVENT)),
        Event::ClientMessage(e) => Some((e.window, xproto::CLIENT_MESSAGE_EVENT)),
        Event::MapNotify(e) => Some((e.window, xproto::MAP_NOTIFY_EVENT)),
        Event::UnmapNotify(e) => Some((e.window, xproto::UNMAP_NOTIFY_EVENT)),
        Event::DestroyNotify(e) => Some((e.window, xproto::DESTROY_NOTIFY_EVENT)),
        Event::ReparentNotify(e) => Some((e.window, xproto::REPARENT_NOTIFY_EVENT)),
        Event::VisibilityNotify(e) => Some((e.window, xproto::VISIBILITY_NOTIFY_EVENT)),
        Event::Expose(e) => Some((e.window, xproto::EXPOSE_EVENT)),
        Event::FocusIn(e) => Some((e.event, xproto::FOCUS_IN_EVENT)),
        Event::FocusOut(e) => Some((e.event, xproto::FOCUS_OUT_EVENT)),
        Event::EnterNotify(e) => Some((e.event, xproto::ENTER_NOTIFY_EVENT)),
        Event::LeaveNotify(e) => Some((e.event, xproto::LEAVE_NOTIFY_EVENT)),
        Event::KeyPress(e) => Some((e.event, xproto::KEY_PRESS_EVENT)),
        Event::KeyRelease(e) => Some((e.event, xproto::KEY_RELEASE_EVENT)),
        Event::ButtonPress(e) => Some((e.event, xproto::BUTTON_PRESS_EVENT)),
        Event::ButtonRelease(e) => Some((e.event, xproto::BUTTON_RELEASE_EVENT)),
        _ => None,
    }
}

impl DispatchEvent for Event {
    fn window(&self) -> Option<WindowId> {
        route(self).map(|(window, _)| window)
    }

    fn event_type(&self) -> EventType {
        route(self).map(|(_, type_)| type_).unwrap_or(0)
    }
}

/// FnHandler turns a closure into an [`EventHandler`]
///
/// ### Examples
/// ```
/// use libxwin::prelude::*;
/// let handler = FnHandler::property_changes(|event| {
///     println!("{:?}", event);
///     Ok(())
/// });
/// assert_eq!(handler.types(), &[x11rb::protocol::xproto::PROPERTY_NOTIFY_EVENT]);
/// ```
pub struct FnHandler<E, F> {
    mask: EventMask,
    types: Vec<EventType>,
    func: F,
    _event: PhantomData<fn(&E)>,
}

impl<E, F> FnHandler<E, F>
where
    F: Fn(&E) -> WindowResult<()> + Send + Sync,
{
    /// Create a new handler
    ///
    /// ### Arguments
    /// * `mask` - event mask the window must select to receive the events
    /// * `types` - event types to deliver to `func`
    /// * `func` - closure invoked on the dispatcher thread
    pub fn new(mask: EventMask, types: &[EventType], func: F) -> Self {
        Self { mask, types: types.to_vec(), func, _event: PhantomData }
    }
}

impl<F> FnHandler<Event, F>
where
    F: Fn(&Event) -> WindowResult<()> + Send + Sync,
{
    /// Handler for property changes of a window, e.g. name, state or desktop
    pub fn property_changes(func: F) -> Self {
        FnHandler::new(EventMask::PROPERTY_CHANGE, &[xproto::PROPERTY_NOTIFY_EVENT], func)
    }

    /// Handler for configuration changes of a window, i.e. moves and resizes
    pub fn configure_changes(func: F) -> Self {
        FnHandler::new(EventMask::STRUCTURE_NOTIFY, &[xproto::CONFIGURE_NOTIFY_EVENT], func)
    }
}

impl<E, F> EventHandler<E> for FnHandler<E, F>
where
    F: Fn(&E) -> WindowResult<()> + Send + Sync,
{
    fn mask(&self) -> EventMask {
        self.mask
    }

    fn types(&self) -> &[EventType] {
        &self.types
    }

    fn handle(&self, event: &E) -> WindowResult<()> {
        (self.func)(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn property_notify(window: WindowId) -> Event {
        Event::PropertyNotify(xproto::PropertyNotifyEvent {
            response_type: xproto::PROPERTY_NOTIFY_EVENT,
            sequence: 0,
            window,
            atom: 0,
            time: 0,
            state: xproto::Property::NEW_VALUE,
        })
    }

    #[test]
    fn test_route_property_notify() {
        let event = property_notify(42);
        assert_eq!(event.window(), Some(42));
        assert_eq!(event.event_type(), xproto::PROPERTY_NOTIFY_EVENT);
    }

    #[test]
    fn test_route_unknown_event() {
        let event = Event::Unknown(vec![0; 32]);
        assert_eq!(event.window(), None);
        assert_eq!(event.event_type(), 0);
    }

    #[test]
    fn test_fn_handler() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let handler = FnHandler::property_changes(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(handler.mask(), EventMask::PROPERTY_CHANGE);
        assert_eq!(handler.types(), &[xproto::PROPERTY_NOTIFY_EVENT]);

        handler.handle(&property_notify(1)).unwrap();
        handler.handle(&property_notify(2)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);

        let handler = FnHandler::configure_changes(|_| Err(WindowError::HandlerFailed("nope".to_owned()).into()));
        assert_eq!(handler.mask(), EventMask::STRUCTURE_NOTIFY);
        assert!(handler.handle(&property_notify(1)).is_err());
    }

    #[test]
    fn test_generic_fn_handler() {
        let handler = FnHandler::new(EventMask::NO_EVENT, &[7, 9], |value: &u32| {
            if *value > 0 {
                Ok(())
            } else {
                Err(WindowError::HandlerFailed("zero".to_owned()).into())
            }
        });
        assert_eq!(handler.types(), &[7, 9]);
        assert!(handler.handle(&1).is_ok());
        assert!(handler.handle(&0).is_err());
    }
}
