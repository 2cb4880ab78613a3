//! # Cursor Module
//!
//! The global pointer written by controller mouse emulation.
//!
//! Moving the real OS cursor is left to the embedding application; it plugs
//! its own [`CursorControl`] into the manager. [`VirtualCursor`] keeps a
//! position in memory and is used when nothing else is available.

use tracing::trace;

/// Access to the global cursor position.
#[cfg_attr(test, mockall::automock)]
pub trait CursorControl {
    /// Current cursor position in pixels.
    fn position(&self) -> (i32, i32);

    /// Moves the cursor to an absolute position.
    fn set_position(&mut self, x: i32, y: i32);

    /// Emulated mouse button press (`pressed = true`) or release.
    ///
    /// Buttons use the conventional numbering: 1 left, 2 middle, 3 right,
    /// 4 and 5 extra buttons.
    fn click(&mut self, _button: u8, _pressed: bool) {}
}

/// In-memory cursor that records the position and logs clicks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtualCursor {
    x: i32,
    y: i32,
}

impl VirtualCursor {
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl CursorControl for VirtualCursor {
    fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    fn set_position(&mut self, x: i32, y: i32) {
        trace!("Virtual cursor moved to ({}, {})", x, y);
        self.x = x;
        self.y = y;
    }

    fn click(&mut self, button: u8, pressed: bool) {
        trace!("Virtual cursor button {} {}", button, if pressed { "down" } else { "up" });
    }
}
