//! # Controller Module
//!
//! Game controller input normalized into one logical control space.
//!
//! This module handles:
//! - Controller family and connection detection from the device name
//! - Default control tables per family and runtime remapping
//! - Deadzones, axis inversion and mouse emulation
//! - The per-frame update of a single [`Controller`]

pub mod calibration;
pub mod detect;
pub mod gamepad;
pub mod layout;
pub mod types;

pub use gamepad::Controller;
pub use types::{Axis, ConnectionType, ControllerState, ControllerType, JButton, TouchPoint};
