//! `WindowManager` uses the [Extended Window Manager Hints (EWMH) specification](https://specifications.freedesktop.org/wm-spec/latest/)
//! to talk to EWMH compatible window managers. It owns the one X11 connection of the process
//! along with the atom cache, the capabilities of the running manager and the event dispatcher;
//! every [`Window`] borrows it.
//!
//! [Root Window Properties](https://specifications.freedesktop.org/wm-spec/latest/ar01s03.html)
//! The EWMH spec defines a number of properties that EWHM compliant window managers will maintain
//! on the root window, e.g. the number of desktops, the work area or the active window.
use std::{str, sync::Arc};

use tracing::{debug, trace};
use x11rb::{
    connection::Connection,
    protocol::xproto::{
        Atom, AtomEnum, ChangeWindowAttributesAux, ClientMessageEvent, ConnectionExt as _, EventMask,
        GetPropertyReply,
    },
    rust_connection::RustConnection,
};

use crate::{
    atoms::AtomCollection, window::Window, CapabilityTable, EventDispatcher, EventHandler, Geometry, Gravity,
    Position, Size, WindowError, WindowResult, WmCapabilities, XEventSource,
};

/// Handler type the window manager's dispatcher accepts
pub type XEventHandler = Arc<dyn EventHandler<x11rb::protocol::Event>>;

/// Window Manager control implements the EWMH protocol using x11rb to provide a simplified access
/// layer to EWHM compatible window managers.
pub struct WindowManager {
    conn: Arc<RustConnection>,          // x11 connection
    pub atoms: AtomCollection,          // atom cache
    screen: usize,                      // screen number
    root: u32,                          // root window id
    name: String,                       // window manager name
    table: CapabilityTable,             // known window manager quirks
    capabilities: WmCapabilities,       // quirks of the running window manager
    dispatcher: EventDispatcher<XEventSource>,
}

impl WindowManager {
    /// Connect to the X11 server named by `$DISPLAY`
    pub fn connect() -> WindowResult<Self> {
        WindowManager::connect_to(None)
    }

    /// Connect to the given X11 display, e.g. `:1`, or `$DISPLAY` if `None`
    pub fn connect_to(display: Option<&str>) -> WindowResult<Self> {
        let (conn, screen) = x11rb::connect(display)?;
        let root = conn.setup().roots[screen].root;

        debug!("initializing caching...");
        let atoms = AtomCollection::new(&conn)?.reply()?;
        let conn = Arc::new(conn);
        let dispatcher = EventDispatcher::new(Arc::new(XEventSource::new(conn.clone())));

        let mut wm = WindowManager {
            conn,
            atoms,
            screen,
            root,
            name: String::new(),
            table: CapabilityTable::builtin(),
            capabilities: WmCapabilities::default(),
            dispatcher,
        };
        wm.name = wm.lookup_name()?;
        wm.capabilities = wm.table.lookup(&wm.name);

        debug!("connect: screen: {}, root: {}, wm: {}", screen, root, wm.name);
        Ok(wm)
    }

    /// Get the default screen number
    pub fn screen(&self) -> usize {
        self.screen
    }

    /// Get the root window
    pub fn root(&self) -> u32 {
        self.root
    }

    /// Shared X11 connection
    pub fn conn(&self) -> &Arc<RustConnection> {
        &self.conn
    }

    /// Event dispatcher delivering the events of all windows of this connection
    pub fn dispatcher(&self) -> &EventDispatcher<XEventSource> {
        &self.dispatcher
    }

    /// Capabilities of the running window manager
    pub fn capabilities(&self) -> WmCapabilities {
        self.capabilities
    }

    /// Replace the capability table and re-resolve the running window manager's capabilities
    pub fn set_capabilities(&mut self, table: CapabilityTable) {
        self.capabilities = table.lookup(&self.name);
        self.table = table;
    }

    /// Window manager's name, empty if the window manager doesn't support EWMH
    pub fn name(&self) -> &str {
        &self.name
    }

    fn lookup_name(&self) -> WindowResult<String> {
        // Defined as: _NET_SUPPORTING_WM_CHECK, WINDOW/32 on the root pointing to a child window
        // which carries the _NET_WM_NAME of the window manager
        let win = match self.get_property32(self.root, self.atoms._NET_SUPPORTING_WM_CHECK, AtomEnum::WINDOW)? {
            Some(values) if !values.is_empty() => values[0],
            _ => return Ok(String::new()),
        };
        Ok(self.get_string(win, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)?.unwrap_or_default())
    }

    /// Number of desktops, 1 if the window manager doesn't say
    pub fn desktops(&self) -> WindowResult<u32> {
        // Defined as: _NET_NUMBER_OF_DESKTOPS, CARDINAL/32
        Ok(self.get_root_property32(self.atoms._NET_NUMBER_OF_DESKTOPS, AtomEnum::CARDINAL)?.unwrap_or(1))
    }

    /// Current desktop number
    pub fn desktop(&self) -> WindowResult<u32> {
        // Defined as: _NET_CURRENT_DESKTOP, CARDINAL/32
        self.get_root_property32(self.atoms._NET_CURRENT_DESKTOP, AtomEnum::CARDINAL)?
            .ok_or_else(|| WindowError::PropertyNotFound("_NET_CURRENT_DESKTOP".to_owned()).into())
    }

    /// Size of the current desktop
    pub fn desktop_size(&self) -> WindowResult<Size> {
        // Defined as: _NET_DESKTOP_GEOMETRY width, height, CARDINAL[2]/32
        let values = self.require_root_values(self.atoms._NET_DESKTOP_GEOMETRY, "_NET_DESKTOP_GEOMETRY", 2)?;
        Ok(Size::new(values[0], values[1]))
    }

    /// Geometry of the work area, i.e. the desktop without panels
    ///
    /// ### Examples
    /// ```ignore
    /// use libxwin::prelude::*;
    /// let wm = WindowManager::connect().unwrap();
    /// let workarea = wm.workarea_geometry().unwrap();
    /// ```
    pub fn workarea_geometry(&self) -> WindowResult<Geometry> {
        // Defined as: _NET_WORKAREA, x, y, width, height CARDINAL[][4]/32
        // there will be 4 values for each desktop, the first set is used
        let values = self.require_root_values(self.atoms._NET_WORKAREA, "_NET_WORKAREA", 4)?;
        let geometry = Geometry::new(values[0] as i32, values[1] as i32, values[2], values[3], Gravity::TOP_LEFT);
        debug!("workarea_geometry: {}", geometry);
        Ok(geometry)
    }

    /// Position of the current viewport, large desktops might be divided into several viewports
    pub fn viewport(&self) -> WindowResult<Position> {
        // Defined as: _NET_DESKTOP_VIEWPORT x, y, CARDINAL[][2]/32
        let values = self.require_root_values(self.atoms._NET_DESKTOP_VIEWPORT, "_NET_DESKTOP_VIEWPORT", 2)?;
        Ok(Position::new(values[0] as i32, values[1] as i32))
    }

    /// Get the active window id
    pub fn active_window_id(&self) -> WindowResult<u32> {
        // Defined as: _NET_ACTIVE_WINDOW, WINDOW/32
        self.get_root_property32(self.atoms._NET_ACTIVE_WINDOW, AtomEnum::WINDOW)?
            .ok_or_else(|| WindowError::PropertyNotFound("_NET_ACTIVE_WINDOW".to_owned()).into())
    }

    /// Get the active window
    pub fn active_window(&self) -> WindowResult<Window<'_>> {
        Ok(Window::new(self, self.active_window_id()?))
    }

    /// Ids of all managed windows in bottom to top stacking order
    pub fn windows_ids(&self) -> WindowResult<Vec<u32>> {
        // Defined as: _NET_CLIENT_LIST_STACKING, WINDOW[]/32
        Ok(self.get_property32(self.root, self.atoms._NET_CLIENT_LIST_STACKING, AtomEnum::WINDOW)?.unwrap_or_default())
    }

    /// All managed windows accepted by the filter in bottom to top stacking order
    ///
    /// ### Arguments
    /// * `filter` - predicate a window must satisfy to be returned
    ///
    /// ### Examples
    /// ```ignore
    /// use libxwin::prelude::*;
    /// let wm = WindowManager::connect().unwrap();
    /// let on_desktop = wm.windows(|win| win.desktop().map(|x| x == 0).unwrap_or(false)).unwrap();
    /// ```
    pub fn windows<F>(&self, filter: F) -> WindowResult<Vec<Window<'_>>>
    where
        F: Fn(&Window) -> bool,
    {
        Ok(self.windows_ids()?.into_iter().map(|id| Window::new(self, id)).filter(|win| filter(win)).collect())
    }

    /// Get the full raw property of the given window
    pub fn get_property<A: Into<Atom>, B: Into<Atom>>(
        &self, win: u32, property: A, type_: B,
    ) -> WindowResult<GetPropertyReply> {
        Ok(self.conn.get_property(false, win, property, type_, 0, u32::MAX)?.reply()?)
    }

    /// Get the 32bit values of a property, `None` if the window doesn't have the property
    pub fn get_property32<A: Into<Atom>, B: Into<Atom>>(
        &self, win: u32, property: A, type_: B,
    ) -> WindowResult<Option<Vec<u32>>> {
        let reply = self.get_property(win, property, type_)?;
        if reply.type_ == x11rb::NONE {
            return Ok(None);
        }
        Ok(reply.value32().map(|values| values.collect()))
    }

    /// Get a string property, `None` if the window doesn't have it or it's empty
    pub fn get_string<A: Into<Atom>, B: Into<Atom>>(
        &self, win: u32, property: A, type_: B,
    ) -> WindowResult<Option<String>> {
        let reply = self.get_property(win, property, type_)?;
        if reply.type_ == x11rb::NONE || reply.value.is_empty() {
            return Ok(None);
        }
        Ok(Some(str::from_utf8(&reply.value)?.trim_end_matches('\0').to_owned()))
    }

    fn get_root_property32<A: Into<Atom>, B: Into<Atom>>(
        &self, property: A, type_: B,
    ) -> WindowResult<Option<u32>> {
        Ok(self.get_property32(self.root, property, type_)?.and_then(|values| values.first().copied()))
    }

    fn require_root_values(&self, property: Atom, name: &str, len: usize) -> WindowResult<Vec<u32>> {
        match self.get_property32(self.root, property, AtomEnum::CARDINAL)? {
            Some(values) if values.len() >= len => Ok(values),
            _ => Err(WindowError::PropertyNotFound(name.to_owned()).into()),
        }
    }

    /// Send a client message to the root window on behalf of the message's window and flush.
    ///
    /// ### Arguments
    /// * `msg` - the client message event to send
    /// * `mask` - event mask the window manager listens on for this message
    pub fn send_event(&self, msg: ClientMessageEvent, mask: EventMask) -> WindowResult<()> {
        self.conn.send_event(false, self.root, mask, &msg)?.check()?;
        self.conn.flush()?;
        debug!("send_event: win: {}, type: {}", msg.window, msg.type_);
        Ok(())
    }

    /// Send a `_NET_WM_STATE` change for the given window
    pub(crate) fn change_state(&self, win: u32, data: [u32; 5]) -> WindowResult<()> {
        let msg = ClientMessageEvent::new(32, win, self.atoms._NET_WM_STATE, data);
        self.send_event(msg, EventMask::SUBSTRUCTURE_REDIRECT)
    }

    /// Register the handler for the window's events and select the events it needs
    ///
    /// ### Examples
    /// ```ignore
    /// use libxwin::prelude::*;
    /// let wm = WindowManager::connect().unwrap();
    /// let handler = Arc::new(FnHandler::property_changes(|event| { println!("{:?}", event); Ok(()) }));
    /// wm.listen(wm.active_window_id().unwrap(), handler).unwrap();
    /// ```
    pub fn listen(&self, win: u32, handler: XEventHandler) -> WindowResult<()> {
        let masks = self.dispatcher.register(win, handler)?;
        self.set_event_mask(win, &masks)
    }

    /// Unregister the handler, or all handlers if `None`, and select the events still needed
    pub fn unlisten(&self, win: u32, handler: Option<&XEventHandler>) -> WindowResult<()> {
        let masks = self.dispatcher.unregister(win, handler.map(|x| x.as_ref()))?;
        self.set_event_mask(win, &masks)
    }

    fn set_event_mask(&self, win: u32, masks: &[EventMask]) -> WindowResult<()> {
        let mask = masks.iter().fold(EventMask::NO_EVENT, |acc, x| acc | *x);
        trace!("set_event_mask: id: {}, masks: {:?}", win, masks);
        self.conn.change_window_attributes(win, &ChangeWindowAttributesAux::new().event_mask(mask))?.check()?;
        self.conn.flush()?;
        debug!("set_event_mask: id: {}, mask: {:?}", win, mask);
        Ok(())
    }

    /// Flush the request queue to the X server
    pub fn flush(&self) -> WindowResult<()> {
        self.conn.flush()?;
        Ok(())
    }

    /// Flush the request queue and wait until the X server has processed it
    pub fn sync(&self) -> WindowResult<()> {
        self.conn.get_input_focus()?.reply()?;
        Ok(())
    }
}

