use std::{fmt, str};

use tracing::debug;
use x11rb::{
    connection::Connection,
    protocol::xproto::{AtomEnum, ConfigureWindowAux, ConnectionExt as _},
};

use crate::{
    effective_geometry, resolve_move_resize, Borders, Geometry, Gravity, SizeHints, StateMode, WinState, WinType,
    WindowManager, WindowResult, XEventHandler,
};

/// Window is a handle on a single managed window borrowing the window manager's connection
#[derive(Clone, Copy)]
pub struct Window<'a> {
    pub id: u32,
    wm: &'a WindowManager,
}

impl<'a> Window<'a> {
    /// Create a handle for the given window id
    ///
    /// ### Examples
    /// ```ignore
    /// use libxwin::prelude::*;
    /// let wm = WindowManager::connect().unwrap();
    /// let win = Window::new(&wm, wm.active_window_id().unwrap());
    /// ```
    pub fn new(wm: &'a WindowManager, id: u32) -> Self {
        Self { id, wm }
    }

    /// Window manager this window belongs to
    pub fn wm(&self) -> &'a WindowManager {
        self.wm
    }

    /// Window's type(s), `Normal` if the window doesn't declare any
    pub fn types(&self) -> WindowResult<Vec<WinType>> {
        // Defined as: _NET_WM_WINDOW_TYPE, ATOM[]/32
        let atoms = &self.wm.atoms;
        match self.wm.get_property32(self.id, atoms._NET_WM_WINDOW_TYPE, AtomEnum::ATOM)? {
            Some(values) if !values.is_empty() => Ok(values.into_iter().map(|x| WinType::from(atoms, x)).collect()),
            _ => Ok(vec![WinType::Normal]),
        }
    }

    /// Window's state(s), empty if none are set
    pub fn state(&self) -> WindowResult<Vec<WinState>> {
        // Defined as: _NET_WM_STATE, ATOM[]/32
        let atoms = &self.wm.atoms;
        let values = self.wm.get_property32(self.id, atoms._NET_WM_STATE, AtomEnum::ATOM)?.unwrap_or_default();
        Ok(values.into_iter().map(|x| WinState::from(atoms, x)).collect())
    }

    /// Id of the window this window is transient for, e.g. the main window of a dialog
    pub fn parent_id(&self) -> WindowResult<Option<u32>> {
        let values = self.wm.get_property32(self.id, AtomEnum::WM_TRANSIENT_FOR, AtomEnum::WINDOW)?;
        Ok(values.and_then(|x| x.first().copied()).filter(|x| *x != x11rb::NONE))
    }

    /// Window this window is transient for
    pub fn parent(&self) -> WindowResult<Option<Window<'a>>> {
        Ok(self.parent_id()?.map(|id| Window::new(self.wm, id)))
    }

    /// Window's name from `_NET_WM_NAME` falling back on `WM_NAME`, empty if neither is set
    pub fn name(&self) -> WindowResult<String> {
        if let Some(name) = self.wm.get_string(self.id, self.wm.atoms._NET_WM_NAME, self.wm.atoms.UTF8_STRING)? {
            return Ok(name);
        }
        Ok(self.wm.get_string(self.id, AtomEnum::WM_NAME, AtomEnum::STRING)?.unwrap_or_default())
    }

    /// Window class which ends up being the application's name
    pub fn class_name(&self) -> WindowResult<String> {
        let reply = self.wm.get_property(self.id, AtomEnum::WM_CLASS, AtomEnum::STRING)?;
        let class = class_of(&reply.value)?;
        debug!("class_name: id: {}, class: {}", self.id, class);
        Ok(class)
    }

    /// Desktop the window is on, 0 if the window manager doesn't say
    pub fn desktop(&self) -> WindowResult<u32> {
        // Defined as: _NET_WM_DESKTOP desktop, CARDINAL/32
        // 0xFFFFFFFF is returned by some managers for windows shown on all desktops
        let values = self.wm.get_property32(self.id, self.wm.atoms._NET_WM_DESKTOP, AtomEnum::CARDINAL)?;
        Ok(values.and_then(|x| x.first().copied()).unwrap_or(0))
    }

    /// Window frame borders added by the window manager, zeros for undecorated windows
    pub fn borders(&self) -> WindowResult<Borders> {
        // Defined as: _NET_FRAME_EXTENTS, left, right, top, bottom, CARDINAL[4]/32
        let values = self.wm.get_property32(self.id, self.wm.atoms._NET_FRAME_EXTENTS, AtomEnum::CARDINAL)?;
        let borders = borders_of(values.as_deref());
        debug!("borders: id: {}, {}", self.id, borders);
        Ok(borders)
    }

    /// Client geometry without borders, translated into desktop space if the window manager
    /// needs it.
    pub fn raw_geometry(&self) -> WindowResult<Geometry> {
        let conn = self.wm.conn();
        let g = conn.get_geometry(self.id)?.reply()?;

        // The reported position is relative to the parent (usually the frame) so let the server
        // translate it. The translation runs from the root into the window which yields the
        // negated desktop position.
        let (x, y) = if self.wm.capabilities().needs_translation {
            let t = conn.translate_coordinates(self.wm.root(), self.id, g.x, g.y)?.reply()?;
            (-(t.dst_x as i32), -(t.dst_y as i32))
        } else {
            (g.x as i32, g.y as i32)
        };
        let geometry = Geometry::from((x, y, g.width as u32, g.height as u32));
        debug!("raw_geometry: id: {}, {}", self.id, geometry);
        Ok(geometry)
    }

    /// Window geometry including borders. `(x, y)` is the top-left corner of the frame relative
    /// to the top-left corner of the desktop.
    ///
    /// ### Examples
    /// ```ignore
    /// use libxwin::prelude::*;
    /// let wm = WindowManager::connect().unwrap();
    /// let geometry = wm.active_window().unwrap().geometry().unwrap();
    /// ```
    pub fn geometry(&self) -> WindowResult<Geometry> {
        let raw = self.raw_geometry()?;
        let borders = self.borders()?;
        Ok(effective_geometry(raw, &borders, self.wm.capabilities().needs_border_adjust))
    }

    /// Application's size hints from `WM_NORMAL_HINTS`
    pub fn size_hints(&self) -> WindowResult<Option<SizeHints>> {
        let values = self.wm.get_property32(self.id, AtomEnum::WM_NORMAL_HINTS, AtomEnum::WM_SIZE_HINTS)?;
        Ok(values.and_then(|x| SizeHints::from_raw(&x)))
    }

    /// Move and resize the window. The geometry includes borders; the size actually applied
    /// honors the application's size hints.
    ///
    /// ### Arguments
    /// * `geometry` - target geometry including borders
    /// * `on_resize` - point of the window that stays fixed if the hints change the size
    ///
    /// ### Examples
    /// ```ignore
    /// use libxwin::prelude::*;
    /// let wm = WindowManager::connect().unwrap();
    /// let win = wm.active_window().unwrap();
    /// win.move_resize(&Geometry::new(0, 0, 800, 600, Gravity::TOP_LEFT), Gravity::TOP_LEFT).unwrap();
    /// ```
    pub fn move_resize(&self, geometry: &Geometry, on_resize: Gravity) -> WindowResult<Geometry> {
        let borders = self.borders()?;
        let current = self.raw_geometry()?;
        let hints = self.size_hints()?;
        let request = resolve_move_resize(geometry, &borders, &current, hints.as_ref(), on_resize)?;

        let aux = ConfigureWindowAux::new().x(request.x).y(request.y).width(request.width).height(request.height);
        self.wm.conn().configure_window(self.id, &aux)?.check()?;
        self.wm.conn().flush()?;
        debug!("move_resize: id: {}, requested: {}, configured: {}", self.id, geometry, request);
        Ok(request)
    }

    /// Maximize the window both horizontally and vertically
    pub fn maximize(&self, mode: StateMode) -> WindowResult<()> {
        let atoms = &self.wm.atoms;
        let data = [mode.into(), atoms._NET_WM_STATE_MAXIMIZED_VERT, atoms._NET_WM_STATE_MAXIMIZED_HORZ, 0, 0];
        self.wm.change_state(self.id, data)?;
        debug!("maximize: id: {}, mode: {:?}", self.id, mode);
        Ok(())
    }

    /// Shade the window, if supported by the window manager
    pub fn shade(&self, mode: StateMode) -> WindowResult<()> {
        let data = [mode.into(), self.wm.atoms._NET_WM_STATE_SHADED, 0, 0, 0];
        self.wm.change_state(self.id, data)?;
        debug!("shade: id: {}, mode: {:?}", self.id, mode);
        Ok(())
    }

    /// Unmaximize and unshade the window
    pub fn reset(&self) -> WindowResult<()> {
        self.maximize(StateMode::Unset)?;
        self.shade(StateMode::Unset)
    }

    /// Register the handler for this window's events
    pub fn listen(&self, handler: XEventHandler) -> WindowResult<()> {
        self.wm.listen(self.id, handler)
    }

    /// Unregister the handler, or all handlers of this window if `None`
    pub fn unlisten(&self, handler: Option<&XEventHandler>) -> WindowResult<()> {
        self.wm.unlisten(self.id, handler)
    }
}

impl PartialEq for Window<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Window<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Window({})", self.id)
    }
}

// Skip the first null terminated string (the instance) and extract the second (the class)
fn class_of(value: &[u8]) -> WindowResult<String> {
    let iter = value.iter().copied().skip_while(|x| *x != 0).skip(1).take_while(|x| *x != 0);
    Ok(str::from_utf8(&iter.collect::<Vec<_>>())?.to_owned())
}

fn borders_of(values: Option<&[u32]>) -> Borders {
    match values {
        Some([left, right, top, bottom, ..]) => Borders::new(*left, *right, *top, *bottom),
        _ => Borders::default(),
    }
}
