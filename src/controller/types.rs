//! # Controller Types
//!
//! Logical control space shared by every controller regardless of vendor.
//!
//! Buttons and axes are named by function, not by the physical index a given
//! vendor uses for them. PlayStation names (Cross, Circle, ...) are aliases of
//! the same logical buttons, so `JButton::CROSS == JButton::A`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Controller family, detected from the device name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ControllerType {
    Xbox,
    PlayStation,
    NintendoSwitch,
    Generic,
}

impl fmt::Display for ControllerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerType::Xbox => "Xbox",
            ControllerType::PlayStation => "PlayStation",
            ControllerType::NintendoSwitch => "Nintendo Switch",
            ControllerType::Generic => "Generic",
        };
        f.write_str(name)
    }
}

/// How the controller is attached. Guessed from the name, not authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConnectionType {
    Usb,
    Bluetooth,
    WirelessDongle,
    Unknown,
}

/// Logical button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum JButton {
    A,
    B,
    X,
    Y,
    Back,
    Guide,
    Start,
    LeftStick,
    RightStick,
    LeftBumper,
    RightBumper,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    Touchpad,
}

impl JButton {
    /// PlayStation cross (×)
    pub const CROSS: JButton = JButton::A;
    /// PlayStation circle (○)
    pub const CIRCLE: JButton = JButton::B;
    /// PlayStation square (□)
    pub const SQUARE: JButton = JButton::X;
    /// PlayStation triangle (△)
    pub const TRIANGLE: JButton = JButton::Y;
    /// PlayStation share
    pub const SHARE: JButton = JButton::Back;
    /// PlayStation options
    pub const OPTIONS: JButton = JButton::Start;

    /// Every logical button, in declaration order.
    pub const ALL: [JButton; 16] = [
        JButton::A,
        JButton::B,
        JButton::X,
        JButton::Y,
        JButton::Back,
        JButton::Guide,
        JButton::Start,
        JButton::LeftStick,
        JButton::RightStick,
        JButton::LeftBumper,
        JButton::RightBumper,
        JButton::DpadUp,
        JButton::DpadDown,
        JButton::DpadLeft,
        JButton::DpadRight,
        JButton::Touchpad,
    ];

    /// Name printed on the physical button for a controller family.
    ///
    /// Used for on-screen prompts only; the logical value is the same for all
    /// families.
    ///
    /// # Examples
    ///
    /// ```
    /// use joyhub::controller::types::{ControllerType, JButton};
    ///
    /// assert_eq!(JButton::A.display_name(ControllerType::PlayStation), "Cross");
    /// assert_eq!(JButton::CROSS.display_name(ControllerType::Xbox), "A");
    /// assert_eq!(JButton::Start.display_name(ControllerType::NintendoSwitch), "+");
    /// ```
    #[must_use]
    pub fn display_name(self, family: ControllerType) -> &'static str {
        match (family, self) {
            (ControllerType::PlayStation, JButton::A) => "Cross",
            (ControllerType::PlayStation, JButton::B) => "Circle",
            (ControllerType::PlayStation, JButton::X) => "Square",
            (ControllerType::PlayStation, JButton::Y) => "Triangle",
            (ControllerType::PlayStation, JButton::Back) => "Share",
            (ControllerType::PlayStation, JButton::Start) => "Options",
            (ControllerType::PlayStation, JButton::Guide) => "PS",
            (ControllerType::PlayStation, JButton::LeftBumper) => "L1",
            (ControllerType::PlayStation, JButton::RightBumper) => "R1",
            (ControllerType::PlayStation, JButton::LeftStick) => "L3",
            (ControllerType::PlayStation, JButton::RightStick) => "R3",
            (ControllerType::NintendoSwitch, JButton::Back) => "-",
            (ControllerType::NintendoSwitch, JButton::Start) => "+",
            (ControllerType::NintendoSwitch, JButton::Guide) => "Home",
            (ControllerType::NintendoSwitch, JButton::LeftBumper) => "L",
            (ControllerType::NintendoSwitch, JButton::RightBumper) => "R",
            (ControllerType::Xbox, JButton::Back) => "View",
            (ControllerType::Xbox, JButton::Start) => "Menu",
            (_, button) => button.canonical_name(),
        }
    }

    fn canonical_name(self) -> &'static str {
        match self {
            JButton::A => "A",
            JButton::B => "B",
            JButton::X => "X",
            JButton::Y => "Y",
            JButton::Back => "Back",
            JButton::Guide => "Guide",
            JButton::Start => "Start",
            JButton::LeftStick => "LS",
            JButton::RightStick => "RS",
            JButton::LeftBumper => "LB",
            JButton::RightBumper => "RB",
            JButton::DpadUp => "Up",
            JButton::DpadDown => "Down",
            JButton::DpadLeft => "Left",
            JButton::DpadRight => "Right",
            JButton::Touchpad => "Touchpad",
        }
    }
}

/// Logical analog axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
    GyroX,
    GyroY,
    GyroZ,
    AccelX,
    AccelY,
    AccelZ,
}

impl Axis {
    /// Stick and trigger axes, the ones subject to the deadzone.
    pub const MOVEMENT: [Axis; 6] = [
        Axis::LeftX,
        Axis::LeftY,
        Axis::RightX,
        Axis::RightY,
        Axis::LeftTrigger,
        Axis::RightTrigger,
    ];
}

/// One finger on a touchpad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TouchPoint {
    /// Normalized 0..1
    pub x: f32,
    /// Normalized 0..1
    pub y: f32,
    pub pressure: f32,
    pub finger_id: u32,
}

/// Live snapshot of one controller, overwritten every frame.
///
/// # Examples
///
/// ```
/// use joyhub::controller::types::ControllerState;
///
/// let state = ControllerState::default();
/// assert!(state.buttons.is_empty());
/// assert_eq!(state.hat, (0, 0));
/// assert_eq!(state.gyro, (0.0, 0.0, 0.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ControllerState {
    /// Pressed state of every button seen so far
    pub buttons: BTreeMap<JButton, bool>,
    /// Latest value of every mapped axis, roughly -1.0..1.0
    pub axes: BTreeMap<Axis, f32>,
    /// Hat vector, x right positive, y up positive
    pub hat: (i32, i32),
    /// Always empty, see [`Controller::get_touch_points`](super::Controller::get_touch_points)
    pub touch_points: Vec<TouchPoint>,
    pub gyro: (f32, f32, f32),
    pub accelerometer: (f32, f32, f32),
    /// Clock time of the last press of each button
    pub last_button_time: BTreeMap<JButton, Duration>,
}

impl ControllerState {
    /// Checks if any button is currently pressed.
    #[must_use]
    pub fn any_button_pressed(&self) -> bool {
        self.buttons.values().any(|&pressed| pressed)
    }

    /// Checks if any stick or trigger is deflected beyond a threshold.
    #[must_use]
    pub fn any_axis_moved(&self, threshold: f32) -> bool {
        Axis::MOVEMENT
            .iter()
            .filter_map(|axis| self.axes.get(axis))
            .any(|value| value.abs() > threshold)
    }
}
