//! Sizing hints an application declares through the ICCCM `WM_NORMAL_HINTS` property.
use tracing::trace;

use crate::{WinGravity, WindowError, WindowResult};

// WM_SIZE_HINTS flags
const P_MIN_SIZE: u32 = 1 << 4;
const P_MAX_SIZE: u32 = 1 << 5;
const P_RESIZE_INC: u32 = 1 << 6;
const P_BASE_SIZE: u32 = 1 << 8;
const P_WIN_GRAVITY: u32 = 1 << 9;

// WM_SIZE_HINTS field offsets in 32bit units
const FLAGS: usize = 0;
const MIN_WIDTH: usize = 5;
const MIN_HEIGHT: usize = 6;
const MAX_WIDTH: usize = 7;
const MAX_HEIGHT: usize = 8;
const WIDTH_INC: usize = 9;
const HEIGHT_INC: usize = 10;
const BASE_WIDTH: usize = 15;
const BASE_HEIGHT: usize = 16;
const WIN_GRAVITY: usize = 17;

// Pre ICCCM 1.0 clients only send the first 15 fields, without base size and gravity
const LEGACY_LEN: usize = 15;
const FULL_LEN: usize = 18;

/// SizeHints holds the constraints an application puts on its own size. Every field is optional
/// and a missing field leaves the corresponding dimension unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeHints {
    min_width: Option<i32>,
    min_height: Option<i32>,
    max_width: Option<i32>,
    max_height: Option<i32>,
    width_inc: Option<i32>,
    height_inc: Option<i32>,
    base_width: Option<i32>,
    base_height: Option<i32>,
    win_gravity: Option<WinGravity>,
}

impl SizeHints {
    /// Create a new empty set of hints
    ///
    /// ### Examples
    /// ```
    /// use libxwin::prelude::*;
    /// let hints = SizeHints::new().min_size(100, 50).increment(8, 16);
    /// assert_eq!(hints.width_inc(), Some(8));
    /// ```
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the minimal width and height
    pub fn min_size(mut self, width: i32, height: i32) -> Self {
        self.min_width = Some(width);
        self.min_height = Some(height);
        self
    }

    /// Set the maximal width and height
    pub fn max_size(mut self, width: i32, height: i32) -> Self {
        self.max_width = Some(width);
        self.max_height = Some(height);
        self
    }

    /// Set the resize increments, the application only accepts sizes of `base + k * inc`
    pub fn increment(mut self, width: i32, height: i32) -> Self {
        self.width_inc = Some(width);
        self.height_inc = Some(height);
        self
    }

    /// Set the base size the increments are counted from
    pub fn base_size(mut self, width: i32, height: i32) -> Self {
        self.base_width = Some(width);
        self.base_height = Some(height);
        self
    }

    /// Set the gravity the application positions itself with
    pub fn win_gravity(mut self, gravity: WinGravity) -> Self {
        self.win_gravity = Some(gravity);
        self
    }

    pub fn min_width(&self) -> Option<i32> {
        positive(self.min_width)
    }

    pub fn min_height(&self) -> Option<i32> {
        positive(self.min_height)
    }

    pub fn max_width(&self) -> Option<i32> {
        positive(self.max_width)
    }

    pub fn max_height(&self) -> Option<i32> {
        positive(self.max_height)
    }

    pub fn width_inc(&self) -> Option<i32> {
        self.width_inc
    }

    pub fn height_inc(&self) -> Option<i32> {
        self.height_inc
    }

    pub fn base_width(&self) -> Option<i32> {
        positive(self.base_width)
    }

    pub fn base_height(&self) -> Option<i32> {
        positive(self.base_height)
    }

    pub fn gravity(&self) -> Option<WinGravity> {
        self.win_gravity
    }

    /// True when the application keeps its content, not its frame, at the requested position.
    /// WINE, OpenOffice and KeePassX windows behave like this.
    pub fn is_static(&self) -> bool {
        self.win_gravity == Some(WinGravity::Static)
    }

    /// Reject hints that can't be honored; an increment must be a positive step
    pub fn validate(&self) -> WindowResult<()> {
        for (name, inc) in [("width_inc", self.width_inc), ("height_inc", self.height_inc)] {
            if let Some(inc) = inc {
                if inc <= 0 {
                    return Err(WindowError::InvalidSizeHint(format!("{}: {}", name, inc)).into());
                }
            }
        }
        Ok(())
    }

    /// Decode the raw 32bit values of a `WM_NORMAL_HINTS` property. Returns `None` if there
    /// are too few values to be a size hints record.
    ///
    /// Fields the client didn't flag are left unset and zero or negative increments are dropped
    /// as the property is foreign input rather than a request from our caller.
    pub fn from_raw(values: &[u32]) -> Option<SizeHints> {
        if values.len() < LEGACY_LEN {
            trace!("size_hints: too few values: {}", values.len());
            return None;
        }
        let flags = values[FLAGS];
        let pair = |flag: u32, w: usize, h: usize| -> (Option<i32>, Option<i32>) {
            if flags & flag != 0 && values.len() > h {
                (Some(values[w] as i32), Some(values[h] as i32))
            } else {
                (None, None)
            }
        };

        let (min_width, min_height) = pair(P_MIN_SIZE, MIN_WIDTH, MIN_HEIGHT);
        let (max_width, max_height) = pair(P_MAX_SIZE, MAX_WIDTH, MAX_HEIGHT);
        let (width_inc, height_inc) = pair(P_RESIZE_INC, WIDTH_INC, HEIGHT_INC);
        let (base_width, base_height) = pair(P_BASE_SIZE, BASE_WIDTH, BASE_HEIGHT);
        let win_gravity = if flags & P_WIN_GRAVITY != 0 && values.len() >= FULL_LEN {
            Some(WinGravity::from(values[WIN_GRAVITY]))
        } else {
            None
        };

        let hints = SizeHints {
            min_width,
            min_height,
            max_width,
            max_height,
            width_inc: positive(width_inc),
            height_inc: positive(height_inc),
            base_width,
            base_height,
            win_gravity,
        };
        trace!("size_hints: {:?}", hints);
        Some(hints)
    }
}

// Zero and negative sizes are how clients say "unset"
fn positive(val: Option<i32>) -> Option<i32> {
    val.filter(|x| *x > 0)
}
