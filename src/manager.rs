//! # Controller Manager Module
//!
//! Registry of connected controllers, hot-plug handling and active input
//! source arbitration.
//!
//! ## Frame Processing
//!
//! [`ControllerManager::handle_events`] is called once per frame with the
//! whole event batch and runs in this order:
//!
//! 1. Stamp the keyboard, mouse and controller activity buckets
//! 2. Open controllers for device-added events
//! 3. Drop controllers for device-removed events
//! 4. Update every remaining controller
//! 5. Forward emulated mouse clicks to the cursor
//! 6. Recompute the active input source
//!
//! ## Active Source
//!
//! The source with the most recent activity becomes active, but only while
//! that activity is younger than the source timeout (500 ms by default).
//! Otherwise the current source is held, so a quiet frame never flickers the
//! UI back to a different prompt style.

use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ControllerConfig};
use crate::controller::calibration::MouseEmulation;
use crate::controller::{Controller, ControllerType};
use crate::cursor::{CursorControl, VirtualCursor};
use crate::device::JoystickBackend;
use crate::event::{EventKind, InputEvent, InputSource};

/// Default freshness window for switching the active source
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_millis(500);

type ControllerCallback = Box<dyn FnMut(&Controller)>;

/// Owns every connected [`Controller`], keyed by device index.
///
/// # Examples
///
/// ```no_run
/// use joyhub::device::EvdevBackend;
/// use joyhub::manager::ControllerManager;
///
/// let mut manager = ControllerManager::new(EvdevBackend::new()?);
/// manager.on_connect(|controller| println!("Connected: {}", controller));
///
/// loop {
///     let events = manager.backend_mut().poll_events();
///     manager.handle_events(&events);
///     if manager.is_using_controller() {
///         // show controller prompts
///     }
/// #   break;
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ControllerManager<B: JoystickBackend> {
    backend: B,
    clock: Box<dyn Clock>,
    cursor: Box<dyn CursorControl>,
    controllers: BTreeMap<usize, Controller>,
    on_connect: Vec<ControllerCallback>,
    on_disconnect: Vec<ControllerCallback>,
    global_mouse_emulation: bool,
    defaults: ControllerConfig,
    last_input: [Option<Duration>; 3],
    active_source: InputSource,
    source_timeout: Duration,
}

impl<B: JoystickBackend> ControllerManager<B> {
    /// Create a manager on the system clock and a virtual cursor, then scan.
    pub fn new(backend: B) -> Self {
        Self::with_parts(
            backend,
            Box::new(SystemClock::new()),
            Box::new(VirtualCursor::default()),
        )
    }

    /// Create a manager with an explicit clock and cursor, then scan.
    ///
    /// Controllers found by this first scan do not fire `on_connect`, since
    /// no callbacks can be registered yet.
    pub fn with_parts(backend: B, clock: Box<dyn Clock>, cursor: Box<dyn CursorControl>) -> Self {
        let mut manager = Self {
            backend,
            clock,
            cursor,
            controllers: BTreeMap::new(),
            on_connect: Vec::new(),
            on_disconnect: Vec::new(),
            global_mouse_emulation: false,
            defaults: ControllerConfig::default(),
            last_input: [None; 3],
            active_source: InputSource::Keyboard,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
        };
        manager.scan_controllers();
        manager
    }

    /// Apply a configuration to current and future controllers.
    #[must_use]
    pub fn with_config(mut self, config: &Config) -> Self {
        self.defaults = config.controller.clone();
        self.set_source_timeout(config.manager.source_timeout());
        for controller in self.controllers.values_mut() {
            Self::apply_defaults(&self.defaults, controller);
        }
        self.set_mouse_emulation(config.controller.mouse_emulation, None);
        self
    }

    fn apply_defaults(defaults: &ControllerConfig, controller: &mut Controller) {
        controller.set_deadzone(defaults.deadzone);
        controller.set_mouse_speed(defaults.mouse_speed);
        controller.set_mouse_deadzone(defaults.mouse_deadzone);
    }

    /// Open every enumerated device that is not tracked yet.
    ///
    /// Devices that fail to open are logged and skipped.
    pub fn scan_controllers(&mut self) {
        for index in self.backend.device_indices() {
            self.connect(index);
        }
    }

    fn connect(&mut self, index: usize) {
        if let Some(controller) = self.controllers.get(&index) {
            if controller.is_connected() {
                debug!("Joystick {} already tracked", index);
                return;
            }
            // The index was reused before the old device's removal arrived
            self.release(index);
        }

        let mut controller = match Controller::open(&mut self.backend, index) {
            Ok(controller) => controller,
            Err(e) => {
                warn!("Failed to initialize joystick {}: {}", index, e);
                return;
            }
        };

        Self::apply_defaults(&self.defaults, &mut controller);
        controller.set_mouse_emulation(self.global_mouse_emulation);

        for callback in self.on_connect.iter_mut() {
            callback(&controller);
        }
        self.controllers.insert(index, controller);
    }

    fn disconnect(&mut self, instance_id: u32) {
        let Some(index) = self
            .controllers
            .iter()
            .find(|(_, controller)| controller.instance_id() == instance_id)
            .map(|(&index, _)| index)
        else {
            debug!("Removal of untracked instance {}", instance_id);
            return;
        };

        self.release(index);
    }

    fn release(&mut self, index: usize) {
        if let Some(mut controller) = self.controllers.remove(&index) {
            info!("Controller disconnected: {}", controller);
            for callback in self.on_disconnect.iter_mut() {
                callback(&controller);
            }
            controller.close();
        }
    }

    /// Process one frame's event batch.
    pub fn handle_events(&mut self, events: &[InputEvent]) {
        let now = self.clock.now();

        for event in events {
            if let Some(source) = event.kind.source() {
                self.last_input[source.slot()] = Some(event.timestamp.unwrap_or(now));
            }
        }

        for event in events {
            if let EventKind::JoyDeviceAdded { device_index } = event.kind {
                self.connect(device_index);
            }
        }

        for event in events {
            if let EventKind::JoyDeviceRemoved { instance_id } = event.kind {
                self.disconnect(instance_id);
            }
        }

        for controller in self.controllers.values_mut() {
            controller.update(events, now, self.cursor.as_mut());
        }

        self.emulate_clicks(events);
        self.update_active_source(now);
    }

    fn emulate_clicks(&mut self, events: &[InputEvent]) {
        for event in events {
            let (joy, button, pressed) = match event.kind {
                EventKind::JoyButtonDown { joy, button } => (joy, button, true),
                EventKind::JoyButtonUp { joy, button } => (joy, button, false),
                _ => continue,
            };

            let click = self
                .controllers
                .get(&joy)
                .filter(|controller| controller.mouse_emulation().enabled)
                .and_then(|controller| controller.logical_button(button))
                .and_then(MouseEmulation::click_button);

            if let Some(mouse_button) = click {
                self.cursor.click(mouse_button, pressed);
            }
        }
    }

    fn update_active_source(&mut self, now: Duration) {
        let Some(latest) = self.last_input.iter().flatten().copied().max() else {
            return;
        };

        let tied = |source: InputSource| self.last_input[source.slot()] == Some(latest);
        let winner = if tied(self.active_source) {
            self.active_source
        } else {
            match InputSource::ALL.into_iter().find(|&source| tied(source)) {
                Some(source) => source,
                None => return,
            }
        };

        if now.saturating_sub(latest) < self.source_timeout && winner != self.active_source {
            debug!("Active input source: {} -> {}", self.active_source, winner);
            self.active_source = winner;
        }
    }

    /// Register a callback fired after a controller connects.
    pub fn on_connect<F>(&mut self, callback: F)
    where
        F: FnMut(&Controller) + 'static,
    {
        self.on_connect.push(Box::new(callback));
    }

    /// Register a callback fired before a removed controller is closed.
    pub fn on_disconnect<F>(&mut self, callback: F)
    where
        F: FnMut(&Controller) + 'static,
    {
        self.on_disconnect.push(Box::new(callback));
    }

    /// Enable or disable mouse emulation.
    ///
    /// With `index` of `None` the setting becomes the global default and is
    /// applied to every current controller and every controller connected
    /// later. Otherwise only that controller changes; unknown indices are
    /// ignored.
    pub fn set_mouse_emulation(&mut self, enabled: bool, index: Option<usize>) {
        match index {
            None => {
                self.global_mouse_emulation = enabled;
                for controller in self.controllers.values_mut() {
                    controller.set_mouse_emulation(enabled);
                }
            }
            Some(index) => {
                if let Some(controller) = self.controllers.get_mut(&index) {
                    controller.set_mouse_emulation(enabled);
                }
            }
        }
    }

    pub fn set_source_timeout(&mut self, timeout: Duration) {
        self.source_timeout = timeout;
    }

    #[must_use]
    pub fn source_timeout(&self) -> Duration {
        self.source_timeout
    }

    #[must_use]
    pub fn active_source(&self) -> InputSource {
        self.active_source
    }

    /// Whether a controller is the active input source.
    #[must_use]
    pub fn is_using_controller(&self) -> bool {
        self.active_source == InputSource::Controller
    }

    /// Last recorded activity time of a source.
    #[must_use]
    pub fn last_input_time(&self, source: InputSource) -> Option<Duration> {
        self.last_input[source.slot()]
    }

    #[must_use]
    pub fn get_controller(&self, index: usize) -> Option<&Controller> {
        self.controllers.get(&index)
    }

    pub fn get_controller_mut(&mut self, index: usize) -> Option<&mut Controller> {
        self.controllers.get_mut(&index)
    }

    #[must_use]
    pub fn get_controllers_by_type(&self, controller_type: ControllerType) -> Vec<&Controller> {
        self.controllers
            .values()
            .filter(|controller| controller.controller_type() == controller_type)
            .collect()
    }

    /// All controllers in ascending index order.
    #[must_use]
    pub fn get_all_controllers(&self) -> Vec<&Controller> {
        self.controllers.values().collect()
    }

    /// Controller with the lowest index.
    #[must_use]
    pub fn get_first_connected(&self) -> Option<&Controller> {
        self.controllers.values().next()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Backend access for the frame loop, e.g. to poll events.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Close every controller and empty the registry. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        if self.controllers.is_empty() {
            return;
        }
        info!("Shutting down {} controller(s)", self.controllers.len());
        for (_, mut controller) in std::mem::take(&mut self.controllers) {
            controller.close();
        }
    }
}

impl<B: JoystickBackend> Drop for ControllerManager<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
