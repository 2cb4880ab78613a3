//! # Joyhub Library
//!
//! Game controller input for interactive applications.
//!
//! This library discovers connected controllers, classifies them by family
//! (Xbox, PlayStation, Nintendo Switch, generic) and connection medium,
//! normalizes their buttons and axes into one logical layout, tracks hot-plug
//! and decides whether the keyboard, the mouse or a controller is the active
//! input source.
//!
//! The entry point is [`manager::ControllerManager`]; Linux devices are read
//! through [`device::EvdevBackend`].

pub mod clock;
pub mod config;
pub mod controller;
pub mod cursor;
pub mod device;
pub mod error;
pub mod event;
pub mod manager;
