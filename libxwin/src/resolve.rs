//! Geometry resolution turns the raw values a window manager reports into the rectangle a
//! window occupies on screen, and a requested rectangle into the configure request the
//! application will actually accept.
//!
//! All functions here are pure; fetching the inputs is left to [`crate::Window`].
use tracing::trace;

use crate::{Borders, Geometry, Gravity, SizeHints, WindowResult};

/// Compute the full window geometry, content plus borders, from the raw geometry the window
/// manager reported.
///
/// ### Arguments
/// * `raw` - client geometry, already translated into desktop space if the manager needs it
/// * `borders` - frame extents around the client
/// * `adjust` - the manager reports the client position rather than the frame position
///
/// ### Examples
/// ```
/// use libxwin::prelude::*;
/// let raw = Geometry::from((100, 100, 200, 150));
/// let geometry = effective_geometry(raw, &Borders::new(2, 2, 20, 2), false);
/// assert_eq!(geometry, Geometry::from((100, 100, 204, 172)));
/// ```
pub fn effective_geometry(raw: Geometry, borders: &Borders, adjust: bool) -> Geometry {
    let (mut x, mut y) = (raw.x, raw.y);
    if adjust {
        x = clamp_i32(x as i64 - borders.left as i64);
        y = clamp_i32(y as i64 - borders.top as i64);
    }
    let width = raw.width.saturating_add(borders.horizontal());
    let height = raw.height.saturating_add(borders.vertical());
    Geometry::from((x, y, width, height))
}

/// Compute the content-space configure request for moving and resizing a window to the
/// requested full geometry while honoring the application's size hints.
///
/// When the hints force a size other than the requested one, the position is shifted so that
/// the `on_resize` point of the window stays where the requested geometry put it.
///
/// ### Arguments
/// * `requested` - target geometry including borders
/// * `borders` - current frame extents
/// * `current` - current raw client geometry, used for the increment base when none is declared
/// * `hints` - application size hints, if any
/// * `on_resize` - point of the window that must stay fixed when the size is constrained
///
/// ### Examples
/// ```
/// use libxwin::prelude::*;
/// let requested = Geometry::from((0, 0, 504, 420));
/// let borders = Borders::new(2, 2, 18, 2);
/// let hints = SizeHints::new().max_size(300, 400);
/// let current = Geometry::from((0, 0, 300, 300));
/// let request = resolve_move_resize(&requested, &borders, &current, Some(&hints), Gravity::TOP_RIGHT).unwrap();
/// assert_eq!(request, Geometry::from((200, 0, 300, 400)));
/// ```
pub fn resolve_move_resize(
    requested: &Geometry, borders: &Borders, current: &Geometry, hints: Option<&SizeHints>, on_resize: Gravity,
) -> WindowResult<Geometry> {
    if let Some(hints) = hints {
        hints.validate()?;
    }

    // Applications are sized without their decorations
    let (mut x, mut y) = (requested.x, requested.y);
    let width = clamp_len(requested.width as i64 - borders.horizontal() as i64);
    let height = clamp_len(requested.height as i64 - borders.vertical() as i64);

    let (final_width, final_height) = match hints {
        Some(hints) => {
            if hints.is_static() {
                x = clamp_i32(x as i64 + borders.left as i64);
                y = clamp_i32(y as i64 + borders.top as i64);
            }
            let horizontal = Axis {
                min: hints.min_width(),
                max: hints.max_width(),
                inc: hints.width_inc(),
                base: hints.base_width(),
            };
            let vertical = Axis {
                min: hints.min_height(),
                max: hints.max_height(),
                inc: hints.height_inc(),
                base: hints.base_height(),
            };
            (horizontal.constrain(width, current.width), vertical.constrain(height, current.height))
        },
        None => (width, height),
    };

    // Keep the on_resize point where the caller expects it
    if (final_width, final_height) != (width, height) {
        x = clamp_i32(x as i64 + shift(width as i64 - final_width as i64, on_resize.x));
        y = clamp_i32(y as i64 + shift(height as i64 - final_height as i64, on_resize.y));
    }

    let request = Geometry::from((x, y, final_width as u32, final_height as u32));
    trace!("resolve_move_resize: requested: {}, request: {}", requested, request);
    Ok(request)
}

// Size constraints along one dimension
struct Axis {
    min: Option<i32>,
    max: Option<i32>,
    inc: Option<i32>,
    base: Option<i32>,
}

impl Axis {
    // Computed in i64, only the result is clamped into 0..=i32::MAX
    fn constrain(&self, len: i32, current: u32) -> i32 {
        let mut len = len as i64;

        // Max is applied before min so a min larger than max wins
        if let Some(max) = self.max {
            len = len.min(max as i64);
        }
        if let Some(min) = self.min {
            len = len.max(min as i64);
        }

        // Snap down to base + k * inc, then step back up if that fell below min
        if let Some(inc) = self.inc.map(|x| x as i64) {
            let base = self.base.map(|x| x as i64).unwrap_or(current as i64 % inc);
            len = base + (len - base).div_euclid(inc) * inc;
            if let Some(min) = self.min {
                if len < min as i64 {
                    len += inc;
                }
            }
        }
        clamp_len(len)
    }
}

fn shift(delta: i64, fraction: f64) -> i64 {
    (delta as f64 * fraction).round() as i64
}

fn clamp_i32(val: i64) -> i32 {
    val.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

// Lengths are never negative and stay within i32
fn clamp_len(val: i64) -> i32 {
    val.clamp(0, i32::MAX as i64) as i32
}
