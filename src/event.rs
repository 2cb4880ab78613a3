//! # Input Event Module
//!
//! The per-frame event batch consumed by [`ControllerManager::handle_events`].
//!
//! Events mirror what a windowing/input layer delivers once per frame:
//!
//! | Kind | Payload | Source bucket |
//! |------|---------|---------------|
//! | `KeyDown` / `KeyUp` | key code | keyboard |
//! | `MouseMotion` | position | mouse |
//! | `MouseButtonDown` / `MouseButtonUp` | button | mouse |
//! | `MouseWheel` | delta | mouse |
//! | `JoyAxisMotion` | device index, axis index, value | controller |
//! | `JoyButtonDown` / `JoyButtonUp` | device index, button index | controller |
//! | `JoyHatMotion` | device index, hat index, hat vector | controller |
//! | `JoyDeviceAdded` | device index | none |
//! | `JoyDeviceRemoved` | instance id | none |
//!
//! [`ControllerManager::handle_events`]: crate::manager::ControllerManager::handle_events

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Input category used for active source arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    /// Keyboard key events
    Keyboard,
    /// Mouse motion, button and wheel events
    Mouse,
    /// Controller axis, button and hat events
    Controller,
}

impl InputSource {
    /// All sources, in tie-break order.
    pub const ALL: [InputSource; 3] = [
        InputSource::Keyboard,
        InputSource::Mouse,
        InputSource::Controller,
    ];

    /// Lowercase tag ("keyboard", "mouse", "controller").
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InputSource::Keyboard => "keyboard",
            InputSource::Mouse => "mouse",
            InputSource::Controller => "controller",
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            InputSource::Keyboard => 0,
            InputSource::Mouse => 1,
            InputSource::Controller => 2,
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific payload of an [`InputEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Keyboard key pressed
    KeyDown { key: u32 },
    /// Keyboard key released
    KeyUp { key: u32 },
    /// Mouse moved to an absolute position
    MouseMotion { x: i32, y: i32 },
    /// Mouse button pressed
    MouseButtonDown { button: u8 },
    /// Mouse button released
    MouseButtonUp { button: u8 },
    /// Mouse wheel scrolled
    MouseWheel { dx: i32, dy: i32 },
    /// Raw controller axis moved
    JoyAxisMotion { joy: usize, axis: usize, value: f32 },
    /// Raw controller button pressed
    JoyButtonDown { joy: usize, button: usize },
    /// Raw controller button released
    JoyButtonUp { joy: usize, button: usize },
    /// Raw controller hat (d-pad) changed
    JoyHatMotion {
        joy: usize,
        hat: usize,
        value: (i32, i32),
    },
    /// A device appeared at `device_index`
    JoyDeviceAdded { device_index: usize },
    /// The device with `instance_id` disappeared
    JoyDeviceRemoved { instance_id: u32 },
}

impl EventKind {
    /// Source bucket this event counts towards, if any.
    ///
    /// Hot-plug notifications are not user activity and return `None`.
    #[must_use]
    pub fn source(&self) -> Option<InputSource> {
        match self {
            EventKind::KeyDown { .. } | EventKind::KeyUp { .. } => Some(InputSource::Keyboard),
            EventKind::MouseMotion { .. }
            | EventKind::MouseButtonDown { .. }
            | EventKind::MouseButtonUp { .. }
            | EventKind::MouseWheel { .. } => Some(InputSource::Mouse),
            EventKind::JoyAxisMotion { .. }
            | EventKind::JoyButtonDown { .. }
            | EventKind::JoyButtonUp { .. }
            | EventKind::JoyHatMotion { .. } => Some(InputSource::Controller),
            EventKind::JoyDeviceAdded { .. } | EventKind::JoyDeviceRemoved { .. } => None,
        }
    }

    /// Device index for per-controller events.
    #[must_use]
    pub fn joystick_id(&self) -> Option<usize> {
        match *self {
            EventKind::JoyAxisMotion { joy, .. }
            | EventKind::JoyButtonDown { joy, .. }
            | EventKind::JoyButtonUp { joy, .. }
            | EventKind::JoyHatMotion { joy, .. } => Some(joy),
            _ => None,
        }
    }
}

/// One discrete input event.
///
/// `timestamp` is measured on the manager's [`Clock`](crate::clock::Clock)
/// timeline. Events without a timestamp are stamped with the frame time when
/// the batch is handled.
///
/// # Examples
///
/// ```
/// use joyhub::event::{EventKind, InputEvent, InputSource};
/// use std::time::Duration;
///
/// let event = InputEvent::new(EventKind::KeyDown { key: 32 }).at(Duration::from_millis(100));
/// assert_eq!(event.timestamp, Some(Duration::from_millis(100)));
/// assert_eq!(event.kind.source(), Some(InputSource::Keyboard));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    /// When the event happened, if the producer knows
    pub timestamp: Option<Duration>,
    /// What happened
    pub kind: EventKind,
}

impl InputEvent {
    /// Creates an event without a timestamp.
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            timestamp: None,
            kind,
        }
    }

    /// Attaches a timestamp to the event.
    #[must_use]
    pub fn at(mut self, timestamp: Duration) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

impl From<EventKind> for InputEvent {
    fn from(kind: EventKind) -> Self {
        Self::new(kind)
    }
}
