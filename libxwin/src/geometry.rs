//! Geometric value types used to describe windows on the virtual desktop.
//!
//! All coordinates are desktop-space: the origin is the top-left corner of the virtual desktop,
//! x grows to the right and y grows down.
use std::{convert, fmt, str};

use crate::WindowError;

/// Gravity is an anchor point expressed as a fraction of a window's width and height, e.g.
/// `(0.0, 0.0)` is the top-left corner and `(0.5, 0.5)` is the center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    pub x: f64,
    pub y: f64,
}

impl Gravity {
    pub const TOP_LEFT: Gravity = Gravity::new(0.0, 0.0);
    pub const TOP: Gravity = Gravity::new(0.5, 0.0);
    pub const TOP_RIGHT: Gravity = Gravity::new(1.0, 0.0);
    pub const LEFT: Gravity = Gravity::new(0.0, 0.5);
    pub const CENTER: Gravity = Gravity::new(0.5, 0.5);
    pub const RIGHT: Gravity = Gravity::new(1.0, 0.5);
    pub const BOTTOM_LEFT: Gravity = Gravity::new(0.0, 1.0);
    pub const BOTTOM: Gravity = Gravity::new(0.5, 1.0);
    pub const BOTTOM_RIGHT: Gravity = Gravity::new(1.0, 1.0);

    /// Create a new gravity point from the given width and height fractions
    ///
    /// ### Arguments
    /// * `x` - fraction of the width, 0.0 is the left edge and 1.0 the right edge
    /// * `y` - fraction of the height, 0.0 is the top edge and 1.0 the bottom edge
    ///
    /// ### Examples
    /// ```
    /// use libxwin::prelude::*;
    /// let gravity = Gravity::new(0.5, 0.5);
    /// assert!(gravity.is_middle());
    /// ```
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when the gravity is exactly the center of the window
    pub fn is_middle(&self) -> bool {
        self.x == 0.5 && self.y == 0.5
    }

    /// True if gravity is toward top
    pub fn is_top(&self) -> bool {
        self.y < 0.5 || self.is_middle()
    }

    /// True if gravity is toward bottom
    pub fn is_bottom(&self) -> bool {
        self.y > 0.5 || self.is_middle()
    }

    /// True if gravity is toward left
    pub fn is_left(&self) -> bool {
        self.x < 0.5 || self.is_middle()
    }

    /// True if gravity is toward right
    pub fn is_right(&self) -> bool {
        self.x > 0.5 || self.is_middle()
    }

    /// Invert the gravity so that left becomes right and/or top becomes bottom.
    ///
    /// ### Arguments
    /// * `vertical` - flip the y axis
    /// * `horizontal` - flip the x axis
    ///
    /// ### Examples
    /// ```
    /// use libxwin::prelude::*;
    /// assert_eq!(Gravity::TOP_LEFT.invert(true, true), Gravity::BOTTOM_RIGHT);
    /// assert_eq!(Gravity::TOP_LEFT.invert(true, false), Gravity::BOTTOM_LEFT);
    /// ```
    pub fn invert(&self, vertical: bool, horizontal: bool) -> Gravity {
        let y = if vertical { 1.0 - self.y } else { self.y };
        let x = if horizontal { 1.0 - self.x } else { self.x };
        Gravity::new(x, y)
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Gravity::TOP_LEFT
    }
}

// Implement format! support
impl fmt::Display for Gravity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

// Convert from &str to Gravity
impl convert::TryFrom<&str> for Gravity {
    type Error = WindowError;

    fn try_from(val: &str) -> Result<Self, Self::Error> {
        match val.to_lowercase().as_ref() {
            "top-left" => Ok(Gravity::TOP_LEFT),
            "top" => Ok(Gravity::TOP),
            "top-right" => Ok(Gravity::TOP_RIGHT),
            "left" => Ok(Gravity::LEFT),
            "center" => Ok(Gravity::CENTER),
            "right" => Ok(Gravity::RIGHT),
            "bottom-left" => Ok(Gravity::BOTTOM_LEFT),
            "bottom" => Ok(Gravity::BOTTOM),
            "bottom-right" => Ok(Gravity::BOTTOM_RIGHT),
            _ => Err(WindowError::InvalidGravity(val.to_string())),
        }
    }
}

impl str::FromStr for Gravity {
    type Err = WindowError;

    fn from_str(val: &str) -> Result<Self, Self::Err> {
        Gravity::try_from(val)
    }
}

/// Size encapsulates width and height of a window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "width: {}, height: {}", self.width, self.height)
    }
}

/// Position of a window's top-left corner relative to the top-left corner of the desktop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "x: {}, y: {}", self.x, self.y)
    }
}

/// Geometry combines size and position of a window.
///
/// `(x, y)` is always the stored top-left corner and `(x2, y2)` the bottom-right corner. The
/// gravity given on construction only says how to interpret the supplied point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    /// Create a new geometry treating `(x, y)` as the `gravity` point of the window.
    ///
    /// Positions are whole pixels: the offset `width * gravity.x` (and likewise for y) is rounded
    /// to the nearest pixel, half away from zero, so for odd sizes the gravity point lands within
    /// half a pixel of `(x, y)`.
    ///
    /// ### Arguments
    /// * `x` - x coordinate of the gravity point
    /// * `y` - y coordinate of the gravity point
    /// * `width` - width of the window
    /// * `height` - height of the window
    /// * `gravity` - which point of the window `(x, y)` refers to
    ///
    /// ### Examples
    /// ```
    /// use libxwin::prelude::*;
    /// let geometry = Geometry::new(500, 400, 200, 100, Gravity::CENTER);
    /// assert_eq!((geometry.x, geometry.y), (400, 350));
    /// ```
    pub fn new(x: i32, y: i32, width: u32, height: u32, gravity: Gravity) -> Self {
        let mut geometry = Self { x: 0, y: 0, width, height };
        geometry.set_position(x, y, gravity);
        geometry
    }

    /// Bottom-right x coordinate
    pub fn x2(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Bottom-right y coordinate
    pub fn y2(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Move the window so that its `gravity` point lands on `(x, y)`
    pub fn set_position(&mut self, x: i32, y: i32, gravity: Gravity) {
        self.x = x.saturating_sub(fraction_of(self.width, gravity.x));
        self.y = y.saturating_sub(fraction_of(self.height, gravity.y));
    }
}

impl From<(i32, i32, u32, u32)> for Geometry {
    fn from((x, y, width, height): (i32, i32, u32, u32)) -> Self {
        Geometry { x, y, width, height }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "x: {}, y: {}, width: {}, height: {}, x2: {}, y2: {}",
            self.x,
            self.y,
            self.width,
            self.height,
            self.x2(),
            self.y2()
        )
    }
}

/// Borders are the frame extents (decorations) the window manager adds around a window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Borders {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Borders {
    pub fn new(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        Self { left, right, top, bottom }
    }

    /// Sum of left and right borders, saturating at `u32::MAX`
    pub fn horizontal(&self) -> u32 {
        self.left.saturating_add(self.right)
    }

    /// Sum of top and bottom borders, saturating at `u32::MAX`
    pub fn vertical(&self) -> u32 {
        self.top.saturating_add(self.bottom)
    }
}

impl From<(u32, u32, u32, u32)> for Borders {
    fn from((left, right, top, bottom): (u32, u32, u32, u32)) -> Self {
        Borders { left, right, top, bottom }
    }
}

impl fmt::Display for Borders {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "left: {}, right: {}, top: {}, bottom: {}", self.left, self.right, self.top, self.bottom)
    }
}

// Offset of a gravity fraction along a length, rounded to the nearest pixel
pub(crate) fn fraction_of(len: u32, fraction: f64) -> i32 {
    (len as f64 * fraction).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Gravity; 9] = [
        Gravity::TOP_LEFT,
        Gravity::TOP,
        Gravity::TOP_RIGHT,
        Gravity::LEFT,
        Gravity::CENTER,
        Gravity::RIGHT,
        Gravity::BOTTOM_LEFT,
        Gravity::BOTTOM,
        Gravity::BOTTOM_RIGHT,
    ];

    #[test]
    fn test_gravity_predicates() {
        for g in ALL.iter() {
            assert_eq!(g.is_middle(), g.x == 0.5 && g.y == 0.5, "{}", g);
            assert_eq!(g.is_top(), g.y < 0.5 || g.is_middle(), "{}", g);
            assert_eq!(g.is_bottom(), g.y > 0.5 || g.is_middle(), "{}", g);
            assert_eq!(g.is_left(), g.x < 0.5 || g.is_middle(), "{}", g);
            assert_eq!(g.is_right(), g.x > 0.5 || g.is_middle(), "{}", g);
        }

        // On the center line but not the center itself
        assert!(!Gravity::TOP.is_left());
        assert!(!Gravity::TOP.is_right());
        assert!(Gravity::CENTER.is_top() && Gravity::CENTER.is_bottom());
        assert!(Gravity::CENTER.is_left() && Gravity::CENTER.is_right());
    }

    #[test]
    fn test_gravity_invert() {
        assert_eq!(Gravity::TOP_LEFT.invert(true, true), Gravity::BOTTOM_RIGHT);
        assert_eq!(Gravity::TOP_LEFT.invert(false, true), Gravity::TOP_RIGHT);
        assert_eq!(Gravity::TOP_LEFT.invert(true, false), Gravity::BOTTOM_LEFT);
        assert_eq!(Gravity::RIGHT.invert(false, false), Gravity::RIGHT);
        assert_eq!(Gravity::CENTER.invert(true, true), Gravity::CENTER);
    }

    #[test]
    fn test_gravity_from_str() {
        assert_eq!(Gravity::try_from("Top-Left").unwrap(), Gravity::TOP_LEFT);
        assert_eq!("center".parse::<Gravity>().unwrap(), Gravity::CENTER);
        assert_eq!("bottom-right".parse::<Gravity>().unwrap(), Gravity::BOTTOM_RIGHT);
        assert_eq!("middle".parse::<Gravity>(), Err(WindowError::InvalidGravity("middle".to_owned())));
        assert_eq!(Gravity::CENTER.to_string(), "(0.50, 0.50)");
    }

    #[test]
    fn test_geometry_anchor_consistency() {
        for g in ALL.iter() {
            let geometry = Geometry::new(300, 200, 120, 80, *g);
            let px = geometry.x + (geometry.width as f64 * g.x) as i32;
            let py = geometry.y + (geometry.height as f64 * g.y) as i32;
            assert_eq!((px, py), (300, 200), "{}", g);
        }
    }

    #[test]
    fn test_geometry_anchor_consistency_odd_size() {
        // Offsets are rounded so the anchor lands within half a pixel
        for g in ALL.iter() {
            let geometry = Geometry::new(300, 200, 101, 81, *g);
            let px = geometry.x as f64 + geometry.width as f64 * g.x;
            let py = geometry.y as f64 + geometry.height as f64 * g.y;
            assert!((px - 300.0).abs() <= 0.5, "{}: {}", g, px);
            assert!((py - 200.0).abs() <= 0.5, "{}: {}", g, py);
        }
        let geometry = Geometry::new(300, 200, 101, 81, Gravity::CENTER);
        assert_eq!((geometry.x, geometry.y), (249, 159));
    }

    #[test]
    fn test_geometry_corners() {
        let geometry = Geometry::new(10, 20, 100, 50, Gravity::TOP_LEFT);
        assert_eq!((geometry.x, geometry.y, geometry.x2(), geometry.y2()), (10, 20, 110, 70));
        assert_eq!(geometry.position(), Position::new(10, 20));
        assert_eq!(geometry.size(), Size::new(100, 50));

        let geometry = Geometry::new(110, 70, 100, 50, Gravity::BOTTOM_RIGHT);
        assert_eq!((geometry.x, geometry.y), (10, 20));
        assert_eq!(geometry.to_string(), "x: 10, y: 20, width: 100, height: 50, x2: 110, y2: 70");
    }

    #[test]
    fn test_geometry_set_position() {
        let mut geometry = Geometry::new(0, 0, 200, 100, Gravity::TOP_LEFT);
        geometry.set_position(400, 300, Gravity::CENTER);
        assert_eq!(geometry, Geometry::from((300, 250, 200, 100)));

        geometry.set_position(400, 300, Gravity::TOP_RIGHT);
        assert_eq!(geometry, Geometry::from((200, 300, 200, 100)));
    }

    #[test]
    fn test_borders() {
        let borders = Borders::new(2, 3, 20, 4);
        assert_eq!(borders.horizontal(), 5);
        assert_eq!(borders.vertical(), 24);
        assert_eq!(Borders::from((2, 3, 20, 4)), borders);
        assert_eq!(Borders::default().horizontal(), 0);
    }

    #[test]
    fn test_borders_saturate() {
        let borders = Borders::new(u32::MAX, 5, u32::MAX - 1, 7);
        assert_eq!(borders.horizontal(), u32::MAX);
        assert_eq!(borders.vertical(), u32::MAX);
    }
}
