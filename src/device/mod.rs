//! # Device Module
//!
//! Physical joystick access.
//!
//! This module handles:
//! - The [`DeviceHandle`] / [`JoystickBackend`] seam the controller layer is written against
//! - Linux joystick enumeration, axis polling and rumble via evdev
//! - Building the per-frame controller event batch, hot-plug included

pub mod device_trait;
pub mod evdev_backend;

pub use device_trait::{DeviceHandle, JoystickBackend};
pub use evdev_backend::{EvdevBackend, EvdevHandle};
