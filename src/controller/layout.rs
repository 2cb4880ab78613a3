//! # Controller Layout Module
//!
//! Default logical-to-physical control tables per controller family.
//!
//! Physical indices follow the common SDL joystick ordering.
//!
//! | Logical | Xbox | PlayStation | Switch |
//! |---------|------|-------------|--------|
//! | A/B/X/Y | 0/1/2/3 | 0/1/2/3 | 0/1/2/3 |
//! | LeftBumper/RightBumper | 4/5 | 9/10 | 4/5 |
//! | Back/Start | 6/7 | 4/6 | 6/7 |
//! | Guide | 8 | 5 | 10 |
//! | LeftStick/RightStick | 9/10 | 7/8 | 8/9 |
//! | D-Pad Up/Down/Left/Right | - | 11/12/13/14 | - |
//! | Touchpad | - | 15 | - |
//! | LeftX/LeftY/RightX/RightY | 0/1/2/3 | 0/1/2/3 | 0/1/2/3 |
//! | LeftTrigger/RightTrigger | 4/5 | 4/5 | 4/5 |
//! | Gyro X/Y/Z | - | 6/7/8 | - |
//!
//! Stick Y axes are inverted in every layout so that pushing a stick up reads
//! positive.
//!
//! Generic controllers get a partial Xbox-like table sized by the number of
//! axes and buttons the device reports.

use std::collections::{BTreeMap, BTreeSet};

use super::types::{Axis, ControllerType, JButton};

/// Static control table for one controller family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerLayout {
    pub buttons: &'static [(JButton, usize)],
    pub axes: &'static [(Axis, usize)],
    pub inverted: &'static [Axis],
}

const STICK_Y_INVERTED: &[Axis] = &[Axis::LeftY, Axis::RightY];

const STANDARD_AXES: &[(Axis, usize)] = &[
    (Axis::LeftX, 0),
    (Axis::LeftY, 1),
    (Axis::RightX, 2),
    (Axis::RightY, 3),
    (Axis::LeftTrigger, 4),
    (Axis::RightTrigger, 5),
];

/// Xbox 360 / One.
pub const XBOX_LAYOUT: ControllerLayout = ControllerLayout {
    buttons: &[
        (JButton::A, 0),
        (JButton::B, 1),
        (JButton::X, 2),
        (JButton::Y, 3),
        (JButton::LeftBumper, 4),
        (JButton::RightBumper, 5),
        (JButton::Back, 6),
        (JButton::Start, 7),
        (JButton::Guide, 8),
        (JButton::LeftStick, 9),
        (JButton::RightStick, 10),
    ],
    axes: STANDARD_AXES,
    inverted: STICK_Y_INVERTED,
};

/// DualShock 4 / DualSense.
pub const PLAYSTATION_LAYOUT: ControllerLayout = ControllerLayout {
    buttons: &[
        (JButton::A, 0),           // Cross
        (JButton::B, 1),           // Circle
        (JButton::X, 2),           // Square
        (JButton::Y, 3),           // Triangle
        (JButton::Back, 4),        // Share
        (JButton::Guide, 5),       // PS
        (JButton::Start, 6),       // Options
        (JButton::LeftStick, 7),   // L3
        (JButton::RightStick, 8),  // R3
        (JButton::LeftBumper, 9),  // L1
        (JButton::RightBumper, 10), // R1
        (JButton::DpadUp, 11),
        (JButton::DpadDown, 12),
        (JButton::DpadLeft, 13),
        (JButton::DpadRight, 14),
        (JButton::Touchpad, 15),
    ],
    axes: &[
        (Axis::LeftX, 0),
        (Axis::LeftY, 1),
        (Axis::RightX, 2),
        (Axis::RightY, 3),
        (Axis::LeftTrigger, 4),
        (Axis::RightTrigger, 5),
        (Axis::GyroX, 6),
        (Axis::GyroY, 7),
        (Axis::GyroZ, 8),
    ],
    inverted: STICK_Y_INVERTED,
};

/// Switch Pro Controller. ZL/ZR are analog only.
pub const SWITCH_LAYOUT: ControllerLayout = ControllerLayout {
    buttons: &[
        (JButton::A, 0),
        (JButton::B, 1),
        (JButton::X, 2),
        (JButton::Y, 3),
        (JButton::LeftBumper, 4),
        (JButton::RightBumper, 5),
        (JButton::Back, 6),  // Minus
        (JButton::Start, 7), // Plus
        (JButton::LeftStick, 8),
        (JButton::RightStick, 9),
        (JButton::Guide, 10), // Home
    ],
    axes: STANDARD_AXES,
    inverted: STICK_Y_INVERTED,
};

/// Generic button tiers: (minimum reported buttons, controls added).
const GENERIC_BUTTON_TIERS: &[(usize, &[(JButton, usize)])] = &[
    (4, &[(JButton::A, 0), (JButton::B, 1), (JButton::X, 2), (JButton::Y, 3)]),
    (6, &[(JButton::LeftBumper, 4), (JButton::RightBumper, 5)]),
    (8, &[(JButton::Back, 6), (JButton::Start, 7)]),
    (9, &[(JButton::Guide, 8)]),
    (11, &[(JButton::LeftStick, 9), (JButton::RightStick, 10)]),
];

/// Generic axis tiers: (minimum reported axes, controls added).
const GENERIC_AXIS_TIERS: &[(usize, &[(Axis, usize)])] = &[
    (2, &[(Axis::LeftX, 0), (Axis::LeftY, 1)]),
    (4, &[(Axis::RightX, 2), (Axis::RightY, 3)]),
    (6, &[(Axis::LeftTrigger, 4), (Axis::RightTrigger, 5)]),
    (9, &[(Axis::GyroX, 6), (Axis::GyroY, 7), (Axis::GyroZ, 8)]),
];

impl ControllerLayout {
    /// Fixed layout for a known family, `None` for [`ControllerType::Generic`].
    #[must_use]
    pub fn for_type(controller_type: ControllerType) -> Option<&'static ControllerLayout> {
        match controller_type {
            ControllerType::Xbox => Some(&XBOX_LAYOUT),
            ControllerType::PlayStation => Some(&PLAYSTATION_LAYOUT),
            ControllerType::NintendoSwitch => Some(&SWITCH_LAYOUT),
            ControllerType::Generic => None,
        }
    }
}

/// Mutable logical-to-physical map owned by one controller.
///
/// # Examples
///
/// ```
/// use joyhub::controller::layout::ControlMap;
/// use joyhub::controller::types::{Axis, ControllerType, JButton};
///
/// let map = ControlMap::for_device(ControllerType::Xbox, 6, 11);
/// assert_eq!(map.button_index(JButton::Guide), Some(8));
/// assert_eq!(map.axis_for_index(1), Some(Axis::LeftY));
/// assert!(map.is_inverted(Axis::LeftY));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlMap {
    buttons: BTreeMap<JButton, usize>,
    axes: BTreeMap<Axis, usize>,
    inverted: BTreeSet<Axis>,
}

impl ControlMap {
    /// Builds an owned map from a static layout.
    #[must_use]
    pub fn from_layout(layout: &ControllerLayout) -> Self {
        Self {
            buttons: layout.buttons.iter().copied().collect(),
            axes: layout.axes.iter().copied().collect(),
            inverted: layout.inverted.iter().copied().collect(),
        }
    }

    /// Partial Xbox-like map sized by what the device reports.
    #[must_use]
    pub fn generic(num_axes: usize, num_buttons: usize) -> Self {
        let buttons = GENERIC_BUTTON_TIERS
            .iter()
            .filter(|(min, _)| num_buttons >= *min)
            .flat_map(|(_, controls)| controls.iter().copied())
            .collect();
        let axes: BTreeMap<Axis, usize> = GENERIC_AXIS_TIERS
            .iter()
            .filter(|(min, _)| num_axes >= *min)
            .flat_map(|(_, controls)| controls.iter().copied())
            .collect();
        let inverted = STICK_Y_INVERTED
            .iter()
            .copied()
            .filter(|axis| axes.contains_key(axis))
            .collect();

        Self {
            buttons,
            axes,
            inverted,
        }
    }

    /// Default map for a detected family and reported capabilities.
    #[must_use]
    pub fn for_device(
        controller_type: ControllerType,
        num_axes: usize,
        num_buttons: usize,
    ) -> Self {
        match ControllerLayout::for_type(controller_type) {
            Some(layout) => Self::from_layout(layout),
            None => Self::generic(num_axes, num_buttons),
        }
    }

    #[must_use]
    pub fn button_index(&self, button: JButton) -> Option<usize> {
        self.buttons.get(&button).copied()
    }

    #[must_use]
    pub fn axis_index(&self, axis: Axis) -> Option<usize> {
        self.axes.get(&axis).copied()
    }

    #[must_use]
    pub fn is_inverted(&self, axis: Axis) -> bool {
        self.inverted.contains(&axis)
    }

    /// First logical button mapped to a physical index.
    #[must_use]
    pub fn button_for_index(&self, index: usize) -> Option<JButton> {
        self.buttons
            .iter()
            .find(|&(_, &physical)| physical == index)
            .map(|(&button, _)| button)
    }

    /// First logical axis mapped to a physical index.
    #[must_use]
    pub fn axis_for_index(&self, index: usize) -> Option<Axis> {
        self.axes
            .iter()
            .find(|&(_, &physical)| physical == index)
            .map(|(&axis, _)| axis)
    }

    /// Mapped axes with their physical index and inversion flag.
    pub fn axes(&self) -> impl Iterator<Item = (Axis, usize, bool)> + '_ {
        self.axes
            .iter()
            .map(|(&axis, &index)| (axis, index, self.inverted.contains(&axis)))
    }

    /// Mapped buttons with their physical index.
    pub fn buttons(&self) -> impl Iterator<Item = (JButton, usize)> + '_ {
        self.buttons.iter().map(|(&button, &index)| (button, index))
    }

    pub fn set_button(&mut self, button: JButton, index: usize) {
        self.buttons.insert(button, index);
    }

    pub fn set_axis(&mut self, axis: Axis, index: usize, invert: bool) {
        self.axes.insert(axis, index);
        if invert {
            self.inverted.insert(axis);
        } else {
            self.inverted.remove(&axis);
        }
    }
}
