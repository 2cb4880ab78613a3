//! # Controller Module
//!
//! One physical controller normalized into the logical control space.
//!
//! On construction the controller opens its device, detects the family and
//! connection medium from the name, picks the default control map, looks for a
//! companion touchpad device (PlayStation only) and checks for rumble.
//!
//! Every frame [`Controller::update`] runs the same pipeline:
//!
//! 1. Apply this device's axis, button and hat events from the batch
//! 2. Poll every mapped axis directly from the device (authoritative)
//! 3. Snap stick and trigger values inside the deadzone to zero
//! 4. Mirror gyro/accelerometer axes into their vectors
//! 5. Move the cursor if mouse emulation is on
//!
//! ## Usage
//!
//! ```no_run
//! use joyhub::controller::{Controller, JButton, Axis};
//! use joyhub::cursor::VirtualCursor;
//! use joyhub::device::EvdevBackend;
//! use std::time::Duration;
//!
//! let mut backend = EvdevBackend::new()?;
//! let mut cursor = VirtualCursor::default();
//! let mut controller = Controller::open(&mut backend, 0)?;
//!
//! let events = backend.poll_events();
//! controller.update(&events, Duration::ZERO, &mut cursor);
//! if controller.get_button_pressed(JButton::A) {
//!     println!("Left stick X: {}", controller.get_axis(Axis::LeftX));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use super::calibration::{apply_deadzone, MouseEmulation, DEFAULT_DEADZONE};
use super::detect::{detect_type, guess_connection};
use super::layout::ControlMap;
use super::types::{Axis, ConnectionType, ControllerState, ControllerType, JButton, TouchPoint};
use crate::cursor::CursorControl;
use crate::device::{DeviceHandle, JoystickBackend};
use crate::error::Result;
use crate::event::{EventKind, InputEvent};

/// Name fragment identifying a companion touchpad device
const TOUCHPAD_KEYWORD: &str = "touchpad";

/// A connected game controller.
///
/// Owns its device handle; the handle is released by [`Controller::close`] or
/// on drop.
pub struct Controller {
    joystick_id: usize,
    instance_id: u32,
    name: String,
    guid: String,
    controller_type: ControllerType,
    connection: ConnectionType,
    num_axes: usize,
    num_buttons: usize,
    num_hats: usize,
    map: ControlMap,
    deadzone: f32,
    state: ControllerState,
    device: Option<Box<dyn DeviceHandle>>,
    touchpad: Option<Box<dyn DeviceHandle>>,
    has_rumble: bool,
    mouse: MouseEmulation,
}

impl Controller {
    /// Open the device at `index` and build its default mapping.
    ///
    /// # Errors
    ///
    /// Returns `DeviceOpen` if the backend cannot open the device. No
    /// controller exists in that case.
    pub fn open(backend: &mut dyn JoystickBackend, index: usize) -> Result<Self> {
        let device = backend.open(index)?;
        Ok(Self::from_handle(backend, index, device))
    }

    fn from_handle(
        backend: &mut dyn JoystickBackend,
        index: usize,
        mut device: Box<dyn DeviceHandle>,
    ) -> Self {
        let name = device.name().to_string();
        let controller_type = detect_type(&name);
        let num_axes = device.num_axes();
        let num_buttons = device.num_buttons();

        let touchpad = if controller_type == ControllerType::PlayStation {
            backend.open_companion(index, TOUCHPAD_KEYWORD)
        } else {
            None
        };

        let has_rumble = device.rumble(0.0, 0.0, 0).is_ok();

        let controller = Self {
            joystick_id: index,
            instance_id: device.instance_id(),
            guid: device.guid().to_string(),
            connection: guess_connection(&name),
            num_hats: device.num_hats(),
            map: ControlMap::for_device(controller_type, num_axes, num_buttons),
            deadzone: DEFAULT_DEADZONE,
            state: ControllerState::default(),
            device: Some(device),
            touchpad,
            has_rumble,
            mouse: MouseEmulation::default(),
            name,
            controller_type,
            num_axes,
            num_buttons,
        };

        info!(
            "Opened {} (type: {:?}, connection: {:?}, axes: {}, buttons: {}, hats: {}, rumble: {})",
            controller,
            controller.controller_type,
            controller.connection,
            controller.num_axes,
            controller.num_buttons,
            controller.num_hats,
            controller.has_rumble
        );
        controller
    }

    /// Refresh the state from this frame's events and a direct device poll.
    ///
    /// Events for other devices are ignored. Polling a device that has gone
    /// away keeps the previous values.
    ///
    /// # Arguments
    ///
    /// * `events` - The full event batch of the frame
    /// * `now` - Frame time, recorded for button presses
    /// * `cursor` - Cursor moved by mouse emulation
    pub fn update(
        &mut self,
        events: &[InputEvent],
        now: Duration,
        cursor: &mut dyn CursorControl,
    ) {
        if self.device.is_none() {
            return;
        }

        for event in events {
            if event.kind.joystick_id() != Some(self.joystick_id) {
                continue;
            }
            match event.kind {
                EventKind::JoyAxisMotion { axis, value, .. } => {
                    self.process_axis_event(axis, value)
                }
                EventKind::JoyButtonDown { button, .. } => {
                    self.process_button_event(button, true, now)
                }
                EventKind::JoyButtonUp { button, .. } => {
                    self.process_button_event(button, false, now)
                }
                EventKind::JoyHatMotion { value, .. } => self.state.hat = value,
                _ => {}
            }
        }

        self.poll_axes();
        self.apply_deadzone();
        self.mirror_motion_sensors();

        if self.mouse.enabled {
            self.update_mouse_emulation(cursor);
        }
    }

    fn process_axis_event(&mut self, index: usize, value: f32) {
        if let Some(axis) = self.map.axis_for_index(index) {
            let value = if self.map.is_inverted(axis) { -value } else { value };
            self.state.axes.insert(axis, value);
        }
    }

    fn process_button_event(&mut self, index: usize, pressed: bool, now: Duration) {
        if let Some(button) = self.map.button_for_index(index) {
            self.state.buttons.insert(button, pressed);
            if pressed {
                self.state.last_button_time.insert(button, now);
            }
        }
    }

    fn poll_axes(&mut self) {
        let Some(device) = self.device.as_ref() else {
            return;
        };
        for (axis, index, inverted) in self.map.axes() {
            // Stale or out-of-range reads keep the last value
            if let Ok(raw) = device.axis(index) {
                self.state.axes.insert(axis, if inverted { -raw } else { raw });
            }
        }
    }

    fn apply_deadzone(&mut self) {
        for axis in Axis::MOVEMENT {
            if let Some(value) = self.state.axes.get_mut(&axis) {
                *value = apply_deadzone(*value, self.deadzone);
            }
        }
    }

    fn mirror_motion_sensors(&mut self) {
        self.state.gyro = (
            self.get_axis(Axis::GyroX),
            self.get_axis(Axis::GyroY),
            self.get_axis(Axis::GyroZ),
        );
        self.state.accelerometer = (
            self.get_axis(Axis::AccelX),
            self.get_axis(Axis::AccelY),
            self.get_axis(Axis::AccelZ),
        );
    }

    fn update_mouse_emulation(&mut self, cursor: &mut dyn CursorControl) {
        let lx = self.get_axis(Axis::LeftX);
        let ly = self.get_axis(Axis::LeftY);

        if let Some((dx, dy)) = self.mouse.cursor_delta(lx, ly) {
            let (x, y) = cursor.position();
            cursor.set_position(x + dx, y + dy);
        }
    }

    /// Point a logical button at a different physical index.
    ///
    /// Indices the device does not have simply never match.
    pub fn remap_button(&mut self, button: JButton, index: usize) {
        self.map.set_button(button, index);
    }

    /// Point a logical axis at a different physical index.
    pub fn remap_axis(&mut self, axis: Axis, index: usize, invert: bool) {
        self.map.set_axis(axis, index, invert);
    }

    /// Set the stick/trigger deadzone, clamped to 0.0..=1.0.
    pub fn set_deadzone(&mut self, deadzone: f32) {
        self.deadzone = deadzone.clamp(0.0, 1.0);
    }

    pub fn set_mouse_emulation(&mut self, enabled: bool) {
        self.mouse.enabled = enabled;
    }

    pub fn set_mouse_speed(&mut self, speed: f32) {
        self.mouse.set_speed(speed);
    }

    pub fn set_mouse_deadzone(&mut self, deadzone: f32) {
        self.mouse.set_deadzone(deadzone);
    }

    /// Start a rumble effect.
    ///
    /// Returns `false` if the device has no rumble motor or the driver
    /// rejects the effect.
    pub fn rumble(&mut self, low_frequency: f32, high_frequency: f32, duration_ms: u32) -> bool {
        if !self.has_rumble {
            return false;
        }
        match self.device.as_mut() {
            Some(device) => match device.rumble(low_frequency, high_frequency, duration_ms) {
                Ok(()) => true,
                Err(e) => {
                    debug!("Rumble on joystick {} failed: {}", self.joystick_id, e);
                    false
                }
            },
            None => false,
        }
    }

    /// Stop any running rumble effect. Failures are logged and otherwise ignored.
    pub fn stop_rumble(&mut self) {
        if !self.has_rumble {
            return;
        }
        if let Some(device) = self.device.as_mut() {
            if let Err(e) = device.stop_rumble() {
                debug!("Stopping rumble on joystick {} failed: {}", self.joystick_id, e);
            }
        }
    }

    /// Release the device and touchpad handles. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.close();
            info!("Closed {}", self);
        }
        if let Some(mut touchpad) = self.touchpad.take() {
            touchpad.close();
        }
    }

    /// Device index this controller was opened from.
    #[must_use]
    pub fn joystick_id(&self) -> usize {
        self.joystick_id
    }

    /// Connection instance id reported by removal events.
    #[must_use]
    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    #[must_use]
    pub fn get_name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn get_guid(&self) -> &str {
        &self.guid
    }

    #[must_use]
    pub fn controller_type(&self) -> ControllerType {
        self.controller_type
    }

    #[must_use]
    pub fn connection_type(&self) -> ConnectionType {
        self.connection
    }

    #[must_use]
    pub fn num_axes(&self) -> usize {
        self.num_axes
    }

    #[must_use]
    pub fn num_buttons(&self) -> usize {
        self.num_buttons
    }

    #[must_use]
    pub fn num_hats(&self) -> usize {
        self.num_hats
    }

    #[must_use]
    pub fn deadzone(&self) -> f32 {
        self.deadzone
    }

    #[must_use]
    pub fn has_rumble(&self) -> bool {
        self.has_rumble
    }

    /// Whether a companion touchpad device was found.
    #[must_use]
    pub fn has_touchpad(&self) -> bool {
        self.touchpad.is_some()
    }

    #[must_use]
    pub fn mouse_emulation(&self) -> &MouseEmulation {
        &self.mouse
    }

    #[must_use]
    pub fn control_map(&self) -> &ControlMap {
        &self.map
    }

    #[must_use]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Logical button currently mapped to a physical button index.
    #[must_use]
    pub fn logical_button(&self, index: usize) -> Option<JButton> {
        self.map.button_for_index(index)
    }

    /// Whether the device is open and still present.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.device.as_ref().map_or(false, |device| device.is_attached())
    }

    /// Pressed state, `false` for buttons never seen or not mapped.
    #[must_use]
    pub fn get_button_pressed(&self, button: JButton) -> bool {
        self.state.buttons.get(&button).copied().unwrap_or(false)
    }

    /// Axis value, `0.0` for axes not mapped.
    #[must_use]
    pub fn get_axis(&self, axis: Axis) -> f32 {
        self.state.axes.get(&axis).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn get_hat(&self) -> (i32, i32) {
        self.state.hat
    }

    /// Frame time of the last press of `button`.
    #[must_use]
    pub fn last_press_time(&self, button: JButton) -> Option<Duration> {
        self.state.last_button_time.get(&button).copied()
    }

    /// Touchpad fingers.
    ///
    /// Always empty: no backend exposes finger positions, even when a
    /// touchpad device is attached.
    #[must_use]
    pub fn get_touch_points(&self) -> Vec<TouchPoint> {
        Vec::new()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "controller {} '{}' ({})",
            self.joystick_id, self.name, self.controller_type
        )
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("joystick_id", &self.joystick_id)
            .field("name", &self.name)
            .field("type", &self.controller_type)
            .field("connection", &self.connection)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
