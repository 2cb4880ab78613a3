//! Trait abstraction for joystick devices to enable testing

use tracing::debug;

use crate::error::Result;

/// One opened physical controller.
///
/// Axis and button indices are the backend's raw physical indices.
pub trait DeviceHandle {
    /// Human-readable device name
    fn name(&self) -> &str;

    /// Stable identifier for the device model (SDL-style GUID string)
    fn guid(&self) -> &str;

    /// Identifier unique to this connection, reported by removal events
    fn instance_id(&self) -> u32;

    fn num_axes(&self) -> usize;

    fn num_buttons(&self) -> usize;

    fn num_hats(&self) -> usize;

    /// Current value of a raw axis, normalized to -1.0..1.0
    ///
    /// Fails for out-of-range indices and for devices that went away.
    fn axis(&self, index: usize) -> Result<f32>;

    /// Starts a rumble effect. Magnitudes are 0.0..1.0.
    fn rumble(&mut self, low_frequency: f32, high_frequency: f32, duration_ms: u32) -> Result<()>;

    /// Stops any running rumble effect
    fn stop_rumble(&mut self) -> Result<()>;

    /// Whether the device is still physically present
    fn is_attached(&self) -> bool;

    /// Releases the OS handle. Further reads fail.
    fn close(&mut self);
}

/// Enumerates and opens joystick devices.
pub trait JoystickBackend {
    /// Indices of all currently enumerated devices, ascending
    fn device_indices(&self) -> Vec<usize>;

    /// Name of an enumerated device without opening it
    fn device_name(&self, index: usize) -> Option<String>;

    /// Opens the device at `index`
    ///
    /// # Errors
    ///
    /// Returns `DeviceOpen` if the index is unknown or the OS refuses access.
    fn open(&mut self, index: usize) -> Result<Box<dyn DeviceHandle>>;

    /// Opens an auxiliary device belonging to the joystick at `index`
    ///
    /// The default looks for another enumerated device whose name contains
    /// `keyword` (case-insensitive). Failures are logged and yield `None`.
    fn open_companion(&mut self, index: usize, keyword: &str) -> Option<Box<dyn DeviceHandle>> {
        let keyword = keyword.to_lowercase();
        let candidate = self.device_indices().into_iter().find(|&other| {
            other != index
                && self
                    .device_name(other)
                    .map_or(false, |name| name.to_lowercase().contains(&keyword))
        })?;

        match self.open(candidate) {
            Ok(companion) => {
                debug!("Joystick {} uses {} device {}", index, keyword, candidate);
                Some(companion)
            }
            Err(e) => {
                debug!("Could not open {} device {}: {}", keyword, candidate, e);
                None
            }
        }
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::error::InputError;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    /// Description of a fake device plugged into a [`MockBackend`]
    #[derive(Clone, Debug)]
    pub struct MockDevice {
        pub name: String,
        pub guid: String,
        pub instance_id: u32,
        pub axes: Vec<f32>,
        pub num_buttons: usize,
        pub num_hats: usize,
        pub rumble_supported: bool,
        pub fail_open: bool,
    }

    impl MockDevice {
        pub fn new(name: &str, instance_id: u32, num_axes: usize, num_buttons: usize) -> Self {
            Self {
                name: name.to_string(),
                guid: format!("030000005e0400008e02000000{:06x}", instance_id),
                instance_id,
                axes: vec![0.0; num_axes],
                num_buttons,
                num_hats: 1,
                rumble_supported: false,
                fail_open: false,
            }
        }

        pub fn xbox(instance_id: u32) -> Self {
            Self::new("Xbox Wireless Controller", instance_id, 6, 11)
        }

        pub fn dualsense(instance_id: u32) -> Self {
            Self::new("Wireless Controller", instance_id, 9, 16)
        }

        pub fn with_rumble(mut self) -> Self {
            self.rumble_supported = true;
            self
        }

        pub fn failing(mut self) -> Self {
            self.fail_open = true;
            self
        }
    }

    #[derive(Default)]
    pub struct MockBackendState {
        pub devices: BTreeMap<usize, MockDevice>,
        pub open_handles: usize,
        pub rumbles: Vec<(u32, f32, f32, u32)>,
    }

    /// In-memory backend; clones share the same devices
    #[derive(Clone, Default)]
    pub struct MockBackend {
        pub state: Rc<RefCell<MockBackendState>>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn plug(&self, index: usize, device: MockDevice) {
            self.state.borrow_mut().devices.insert(index, device);
        }

        pub fn unplug(&self, index: usize) {
            self.state.borrow_mut().devices.remove(&index);
        }

        pub fn set_axis(&self, index: usize, axis: usize, value: f32) {
            if let Some(device) = self.state.borrow_mut().devices.get_mut(&index) {
                if axis < device.axes.len() {
                    device.axes[axis] = value;
                }
            }
        }

        pub fn open_handles(&self) -> usize {
            self.state.borrow().open_handles
        }

        pub fn get_rumbles(&self) -> Vec<(u32, f32, f32, u32)> {
            self.state.borrow().rumbles.clone()
        }
    }

    impl JoystickBackend for MockBackend {
        fn device_indices(&self) -> Vec<usize> {
            self.state.borrow().devices.keys().copied().collect()
        }

        fn device_name(&self, index: usize) -> Option<String> {
            self.state.borrow().devices.get(&index).map(|d| d.name.clone())
        }

        fn open(&mut self, index: usize) -> Result<Box<dyn DeviceHandle>> {
            let mut state = self.state.borrow_mut();
            let device = state
                .devices
                .get(&index)
                .cloned()
                .ok_or_else(|| InputError::DeviceOpen {
                    index,
                    reason: "no such device".to_string(),
                })?;

            if device.fail_open {
                return Err(InputError::DeviceOpen {
                    index,
                    reason: "Mock open error".to_string(),
                });
            }

            state.open_handles += 1;
            Ok(Box::new(MockHandle {
                index,
                device,
                backend: Rc::clone(&self.state),
                open: true,
            }))
        }
    }

    /// Handle onto a [`MockDevice`]; axis reads go through the shared backend
    pub struct MockHandle {
        index: usize,
        device: MockDevice,
        backend: Rc<RefCell<MockBackendState>>,
        open: bool,
    }

    impl MockHandle {
        fn live_device(&self) -> Option<MockDevice> {
            let state = self.backend.borrow();
            state
                .devices
                .get(&self.index)
                .filter(|d| d.instance_id == self.device.instance_id)
                .cloned()
        }
    }

    impl DeviceHandle for MockHandle {
        fn name(&self) -> &str {
            &self.device.name
        }

        fn guid(&self) -> &str {
            &self.device.guid
        }

        fn instance_id(&self) -> u32 {
            self.device.instance_id
        }

        fn num_axes(&self) -> usize {
            self.device.axes.len()
        }

        fn num_buttons(&self) -> usize {
            self.device.num_buttons
        }

        fn num_hats(&self) -> usize {
            self.device.num_hats
        }

        fn axis(&self, index: usize) -> Result<f32> {
            if !self.open {
                return Err(InputError::Device("Mock handle closed".to_string()));
            }
            let device = self
                .live_device()
                .ok_or_else(|| InputError::Device("Mock device unplugged".to_string()))?;
            device
                .axes
                .get(index)
                .copied()
                .ok_or_else(|| InputError::Device(format!("Mock axis {} out of range", index)))
        }

        fn rumble(
            &mut self,
            low_frequency: f32,
            high_frequency: f32,
            duration_ms: u32,
        ) -> Result<()> {
            if !self.device.rumble_supported {
                return Err(InputError::Device("Mock rumble unsupported".to_string()));
            }
            self.backend.borrow_mut().rumbles.push((
                self.device.instance_id,
                low_frequency,
                high_frequency,
                duration_ms,
            ));
            Ok(())
        }

        fn stop_rumble(&mut self) -> Result<()> {
            if !self.device.rumble_supported {
                return Err(InputError::Device("Mock rumble unsupported".to_string()));
            }
            Ok(())
        }

        fn is_attached(&self) -> bool {
            self.open && self.live_device().is_some()
        }

        fn close(&mut self) {
            if self.open {
                self.open = false;
                self.backend.borrow_mut().open_handles -= 1;
            }
        }
    }
}
