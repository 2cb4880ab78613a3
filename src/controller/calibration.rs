//! # Calibration Module
//!
//! Deadzone snapping and stick-to-cursor conversion.
//!
//! ## Deadzone
//!
//! A deadzone eliminates small stick movements near center to prevent drift.
//! Values with a magnitude strictly below the deadzone become exactly `0.0`;
//! everything else passes through unchanged (no rescaling).
//!
//! ## Mouse Emulation
//!
//! With emulation enabled the left stick drives the cursor. The stick uses its
//! own, usually larger, deadzone and each frame moves the cursor by
//! `round(value * speed)` pixels per axis.
//!
//! ## Usage
//!
//! ```
//! use joyhub::controller::calibration::{apply_deadzone, MouseEmulation};
//!
//! assert_eq!(apply_deadzone(0.1, 0.15), 0.0);
//! assert_eq!(apply_deadzone(-0.4, 0.15), -0.4);
//!
//! let mouse = MouseEmulation::default();
//! assert_eq!(mouse.cursor_delta(0.5, 0.0), Some((3, 0)));
//! assert_eq!(mouse.cursor_delta(0.1, 0.1), None);
//! ```

use super::types::JButton;

/// Default controller deadzone.
pub const DEFAULT_DEADZONE: f32 = 0.15;

/// Default cursor speed in pixels per frame at full deflection.
pub const DEFAULT_MOUSE_SPEED: f32 = 5.0;

/// Default stick deadzone while emulating the mouse.
pub const DEFAULT_MOUSE_DEADZONE: f32 = 0.2;

/// Snaps values inside the deadzone to zero.
///
/// # Arguments
///
/// * `value` - Axis value (-1.0 to 1.0)
/// * `deadzone` - Deadzone fraction (0.0 to 1.0)
#[must_use]
#[inline]
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        value
    }
}

/// Mouse emulation settings for one controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEmulation {
    /// Whether the stick drives the cursor.
    pub enabled: bool,
    /// Pixels per frame at full deflection.
    speed: f32,
    /// Stick deadzone used only for cursor movement (0.0 to 1.0).
    deadzone: f32,
}

impl Default for MouseEmulation {
    fn default() -> Self {
        Self {
            enabled: false,
            speed: DEFAULT_MOUSE_SPEED,
            deadzone: DEFAULT_MOUSE_DEADZONE,
        }
    }
}

impl MouseEmulation {
    /// Creates disabled emulation with the given speed and deadzone.
    ///
    /// Negative speeds are clamped to zero and the deadzone to 0.0..=1.0.
    #[must_use]
    pub fn new(speed: f32, deadzone: f32) -> Self {
        Self {
            enabled: false,
            speed: speed.max(0.0),
            deadzone: deadzone.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[must_use]
    pub fn deadzone(&self) -> f32 {
        self.deadzone
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    pub fn set_deadzone(&mut self, deadzone: f32) {
        self.deadzone = deadzone.clamp(0.0, 1.0);
    }

    /// Cursor offset for a left stick position, `None` when the stick rests.
    ///
    /// Rounds half away from zero, so `0.5 * 5.0` moves 3 pixels.
    #[must_use]
    pub fn cursor_delta(&self, lx: f32, ly: f32) -> Option<(i32, i32)> {
        let lx = apply_deadzone(lx, self.deadzone);
        let ly = apply_deadzone(ly, self.deadzone);

        if lx == 0.0 && ly == 0.0 {
            return None;
        }

        Some((
            (lx * self.speed).round() as i32,
            (ly * self.speed).round() as i32,
        ))
    }

    /// Mouse button emulated by a controller button.
    ///
    /// A is left click (1), B right (3), X middle (2), bumpers are the extra
    /// buttons 4 and 5.
    #[must_use]
    pub fn click_button(button: JButton) -> Option<u8> {
        match button {
            JButton::A => Some(1),
            JButton::B => Some(3),
            JButton::X => Some(2),
            JButton::LeftBumper => Some(4),
            JButton::RightBumper => Some(5),
            _ => None,
        }
    }
}
