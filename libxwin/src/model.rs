use std::fmt;

use crate::{atoms::AtomCollection, Gravity};

/// WinGravity is the ICCCM `win_gravity` code a client declares in its `WM_NORMAL_HINTS`
/// <https://tronche.com/gui/x/xlib/window/attributes/gravity.html>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinGravity {
    Forget,
    NorthWest,
    North,
    NorthEast,
    West,
    Center,
    East,
    SouthWest,
    South,
    SouthEast,
    Static,
}

// Implement format! support
impl fmt::Display for WinGravity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

impl From<u32> for WinGravity {
    fn from(val: u32) -> Self {
        match val {
            1 => WinGravity::NorthWest,
            2 => WinGravity::North,
            3 => WinGravity::NorthEast,
            4 => WinGravity::West,
            5 => WinGravity::Center,
            6 => WinGravity::East,
            7 => WinGravity::SouthWest,
            8 => WinGravity::South,
            9 => WinGravity::SouthEast,
            10 => WinGravity::Static,
            _ => WinGravity::Forget,
        }
    }
}

impl From<WinGravity> for u32 {
    fn from(val: WinGravity) -> Self {
        match val {
            WinGravity::Forget => 0,
            WinGravity::NorthWest => 1,
            WinGravity::North => 2,
            WinGravity::NorthEast => 3,
            WinGravity::West => 4,
            WinGravity::Center => 5,
            WinGravity::East => 6,
            WinGravity::SouthWest => 7,
            WinGravity::South => 8,
            WinGravity::SouthEast => 9,
            WinGravity::Static => 10,
        }
    }
}

// Static and Forget have no anchor of their own and behave like NorthWest
impl From<WinGravity> for Gravity {
    fn from(val: WinGravity) -> Self {
        match val {
            WinGravity::North => Gravity::TOP,
            WinGravity::NorthEast => Gravity::TOP_RIGHT,
            WinGravity::West => Gravity::LEFT,
            WinGravity::Center => Gravity::CENTER,
            WinGravity::East => Gravity::RIGHT,
            WinGravity::SouthWest => Gravity::BOTTOM_LEFT,
            WinGravity::South => Gravity::BOTTOM,
            WinGravity::SouthEast => Gravity::BOTTOM_RIGHT,
            _ => Gravity::TOP_LEFT,
        }
    }
}

/// StateMode is the action field of a `_NET_WM_STATE` client message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateMode {
    Unset,
    Set,
    Toggle,
}

impl From<StateMode> for u32 {
    fn from(val: StateMode) -> Self {
        match val {
            StateMode::Unset => 0,
            StateMode::Set => 1,
            StateMode::Toggle => 2,
        }
    }
}

/// WinState provides an easy way to identify the different window states
#[derive(Debug, Clone, PartialEq)]
pub enum WinState {
    Above,
    Below,
    DemandsAttention,
    Focused,
    Fullscreen,
    Hidden,
    MaxVert,
    MaxHorz,
    Modal,
    Shaded,
    SkipPager,
    SkipTaskbar,
    Sticky,
    Other(u32),
}

// Convert from u32 to State
impl WinState {
    pub fn from(atoms: &AtomCollection, val: u32) -> WinState {
        match val {
            _ if val == atoms._NET_WM_STATE_ABOVE => WinState::Above,
            _ if val == atoms._NET_WM_STATE_BELOW => WinState::Below,
            _ if val == atoms._NET_WM_STATE_DEMANDS_ATTENTION => WinState::DemandsAttention,
            _ if val == atoms._NET_WM_STATE_FOCUSED => WinState::Focused,
            _ if val == atoms._NET_WM_STATE_FULLSCREEN => WinState::Fullscreen,
            _ if val == atoms._NET_WM_STATE_HIDDEN => WinState::Hidden,
            _ if val == atoms._NET_WM_STATE_MAXIMIZED_VERT => WinState::MaxVert,
            _ if val == atoms._NET_WM_STATE_MAXIMIZED_HORZ => WinState::MaxHorz,
            _ if val == atoms._NET_WM_STATE_MODAL => WinState::Modal,
            _ if val == atoms._NET_WM_STATE_SHADED => WinState::Shaded,
            _ if val == atoms._NET_WM_STATE_SKIP_PAGER => WinState::SkipPager,
            _ if val == atoms._NET_WM_STATE_SKIP_TASKBAR => WinState::SkipTaskbar,
            _ if val == atoms._NET_WM_STATE_STICKY => WinState::Sticky,
            _ => WinState::Other(val),
        }
    }
}

// Implement format! support
impl fmt::Display for WinState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WinState::Other(val) => write!(f, "other({})", val),
            _ => write!(f, "{}", format!("{:?}", self).to_lowercase()),
        }
    }
}

/// WinType provides an easy way to identify the different window types
#[derive(Debug, Clone, PartialEq)]
pub enum WinType {
    Combo,
    Desktop,
    Dialog,
    DND,
    Dock,
    DropDownMenu,
    Menu,
    Normal,
    Notification,
    PopupMenu,
    Splash,
    Toolbar,
    ToolTip,
    Utility,
    Other(u32),
}

// Convert from u32 to Type
impl WinType {
    pub fn from(atoms: &AtomCollection, val: u32) -> WinType {
        match val {
            _ if val == atoms._NET_WM_WINDOW_TYPE_COMBO => WinType::Combo,
            _ if val == atoms._NET_WM_WINDOW_TYPE_DESKTOP => WinType::Desktop,
            _ if val == atoms._NET_WM_WINDOW_TYPE_DIALOG => WinType::Dialog,
            _ if val == atoms._NET_WM_WINDOW_TYPE_DND => WinType::DND,
            _ if val == atoms._NET_WM_WINDOW_TYPE_DOCK => WinType::Dock,
            _ if val == atoms._NET_WM_WINDOW_TYPE_DROPDOWN_MENU => WinType::DropDownMenu,
            _ if val == atoms._NET_WM_WINDOW_TYPE_MENU => WinType::Menu,
            _ if val == atoms._NET_WM_WINDOW_TYPE_NORMAL => WinType::Normal,
            _ if val == atoms._NET_WM_WINDOW_TYPE_NOTIFICATION => WinType::Notification,
            _ if val == atoms._NET_WM_WINDOW_TYPE_POPUP_MENU => WinType::PopupMenu,
            _ if val == atoms._NET_WM_WINDOW_TYPE_SPLASH => WinType::Splash,
            _ if val == atoms._NET_WM_WINDOW_TYPE_TOOLBAR => WinType::Toolbar,
            _ if val == atoms._NET_WM_WINDOW_TYPE_TOOLTIP => WinType::ToolTip,
            _ if val == atoms._NET_WM_WINDOW_TYPE_UTILITY => WinType::Utility,
            _ => WinType::Other(val),
        }
    }
}

// Implement format! support
impl fmt::Display for WinType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WinType::Other(val) => write!(f, "other({})", val),
            _ => write!(f, "{}", format!("{:?}", self).to_lowercase()),
        }
    }
}
