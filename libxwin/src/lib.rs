//! `libxwin` implements the client side of the [Extended Window Manager Hints (EWMH) specification](https://specifications.freedesktop.org/wm-spec/latest/)
//! to query and control the windows of EWMH compatible window managers. The EWHM spec builds on
//! the lower level Inter Client Communication Conventions Manual (ICCCM) which defines the size
//! hints applications declare.
//!
//! [Root Window Properties](https://specifications.freedesktop.org/wm-spec/latest/ar01s03.html)
//! The window manager maintains a number of properties on the root window that describe the
//! desktops and the managed windows. [`WindowManager`] reads those and hands out [`Window`]
//! handles to read and change individual windows.
//!
//! Window managers disagree on how they report geometry. [`CapabilityTable`] records the known
//! differences and the pure functions [`effective_geometry`] and [`resolve_move_resize`] turn the
//! reported values into what is actually on screen, and a requested rectangle into what the
//! application will accept.
//!
//! Window events are delivered by an [`EventDispatcher`] running a background poll loop while at
//! least one handler is registered.
mod atoms;
mod dispatch;
mod error;
mod events;
mod geometry;
mod hints;
mod model;
mod quirks;
mod resolve;
mod window;
mod wm;
pub use atoms::AtomCollection;
pub use dispatch::*;
pub use error::*;
pub use events::*;
pub use geometry::*;
pub use hints::*;
pub use model::*;
pub use quirks::*;
pub use resolve::*;
pub use window::Window;
pub use wm::{WindowManager, XEventHandler};

/// All essential symbols in a simple consumable form
///
/// ### Examples
/// ```
/// use libxwin::prelude::*;
/// let geometry = Geometry::new(100, 100, 200, 100, Gravity::CENTER);
/// assert_eq!(geometry.position(), Position::new(0, 50));
/// ```
pub mod prelude {
    pub use crate::*;
}
