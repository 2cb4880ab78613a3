//! # Evdev Joystick Backend
//!
//! Linux implementation of [`JoystickBackend`] on top of `/dev/input/event*`.
//!
//! ## Device Detection
//!
//! An event device counts as a joystick when it reports an `ABS_X` axis and a
//! gamepad or joystick trigger button (`BTN_SOUTH` or `BTN_TRIGGER`).
//! Each joystick gets the lowest free device index when it first appears and
//! keeps it until it is unplugged. An index freed by a rescan is not handed out
//! again in that same rescan, so a removal and an addition in one batch never
//! share an index.
//!
//! Other event nodes are remembered by name. A PlayStation pad's touchpad is a
//! separate node named after the pad (`... Wireless Controller Touchpad`) and
//! is found through [`JoystickBackend::open_companion`].
//!
//! ## Physical Indices
//!
//! - Axes: supported absolute axes in ascending code order, hats excluded,
//!   normalized from their abs-info range to -1.0..1.0
//! - Buttons: supported keys from `BTN_MISC` (0x100) upwards, ascending
//! - Hats: `ABS_HAT0X`/`ABS_HAT0Y` through `ABS_HAT3X`/`ABS_HAT3Y`, y up positive
//!
//! ## Events
//!
//! [`EvdevBackend::poll_events`] builds the per-frame batch without blocking:
//! it diffs the kernel's key and axis state against the previous frame and
//! rescans `/dev/input` for hot-plug at a fixed interval.
//!
//! Because state snapshots are diffed, a button pressed and released again
//! within one poll interval produces no events. The same holds for an axis
//! that leaves and returns to its value between two polls.

use evdev::{
    AbsoluteAxisType, Device, FFEffect, FFEffectData, FFEffectKind, FFEffectType, FFReplay,
    FFTrigger, Key,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::device_trait::{DeviceHandle, JoystickBackend};
use crate::error::{InputError, Result};
use crate::event::{EventKind, InputEvent};

/// Directory scanned for event devices
const INPUT_DIR: &str = "/dev/input";

/// First key code that is a button rather than a keyboard key
const FIRST_BUTTON_CODE: u16 = 0x100;

/// `ABS_HAT0X`
const FIRST_HAT_CODE: u16 = 0x10;

/// Up to four hats, two axes each
const MAX_HATS: usize = 4;

/// Axis changes smaller than this are not reported as motion events
const AXIS_EPSILON: f32 = 1.0 / 512.0;

/// How often `/dev/input` is rescanned for added or removed devices
const DEFAULT_RESCAN_INTERVAL: Duration = Duration::from_secs(1);

fn is_hat(axis: AbsoluteAxisType) -> bool {
    (FIRST_HAT_CODE..FIRST_HAT_CODE + 2 * MAX_HATS as u16).contains(&axis.0)
}

fn is_joystick(device: &Device) -> bool {
    let has_stick = device
        .supported_absolute_axes()
        .map_or(false, |axes| axes.contains(AbsoluteAxisType::ABS_X));
    let has_buttons = device.supported_keys().map_or(false, |keys| {
        keys.contains(Key::BTN_SOUTH) || keys.contains(Key::BTN_TRIGGER)
    });
    has_stick && has_buttons
}

/// Whether `candidate` names an auxiliary node of the joystick `owner`
fn is_companion_name(owner: &str, candidate: &str, keyword: &str) -> bool {
    let owner = owner.to_lowercase();
    let candidate = candidate.to_lowercase();
    candidate != owner
        && candidate.starts_with(&owner)
        && candidate.contains(&keyword.to_lowercase())
}

/// Lowest index not in `in_use`
fn lowest_free_index(in_use: &BTreeSet<usize>) -> usize {
    (0..).find(|index| !in_use.contains(index)).unwrap_or(0)
}

/// Scale a raw abs value into -1.0..1.0
fn normalize(value: i32, minimum: i32, maximum: i32) -> f32 {
    if maximum <= minimum {
        return 0.0;
    }
    let span = (maximum - minimum) as f32;
    (2.0 * (value - minimum) as f32 / span - 1.0).clamp(-1.0, 1.0)
}

/// SDL-style GUID: bus, vendor, product and version as little-endian 16-bit words
fn sdl_guid(device: &Device) -> String {
    let id = device.input_id();
    let words = [id.bus_type().0, id.vendor(), id.product(), id.version()];
    words
        .iter()
        .map(|word| format!("{:02x}{:02x}0000", word & 0xff, word >> 8))
        .collect()
}

/// Physical control layout of one evdev device
#[derive(Debug, Clone)]
struct DeviceLayout {
    axes: Vec<AbsoluteAxisType>,
    buttons: Vec<Key>,
    hats: usize,
}

impl DeviceLayout {
    fn inspect(device: &Device) -> Self {
        let (axes, hats) = match device.supported_absolute_axes() {
            Some(supported) => {
                let axes = supported.iter().filter(|axis| !is_hat(*axis)).collect();
                let hats = (0..MAX_HATS)
                    .filter(|hat| {
                        supported.contains(AbsoluteAxisType(FIRST_HAT_CODE + 2 * *hat as u16))
                    })
                    .count();
                (axes, hats)
            }
            None => (Vec::new(), 0),
        };

        let buttons = device
            .supported_keys()
            .map(|keys| {
                keys.iter()
                    .filter(|key| key.code() >= FIRST_BUTTON_CODE)
                    .collect()
            })
            .unwrap_or_default();

        Self { axes, buttons, hats }
    }

    fn read_axes(&self, device: &Device) -> std::io::Result<Vec<f32>> {
        let abs = device.get_abs_state()?;
        Ok(self
            .axes
            .iter()
            .map(|axis| {
                let info = abs[axis.0 as usize];
                normalize(info.value, info.minimum, info.maximum)
            })
            .collect())
    }

    fn read_hats(&self, device: &Device) -> std::io::Result<Vec<(i32, i32)>> {
        let abs = device.get_abs_state()?;
        Ok((0..self.hats)
            .map(|hat| {
                let x = abs[FIRST_HAT_CODE as usize + 2 * hat].value.signum();
                let y = abs[FIRST_HAT_CODE as usize + 2 * hat + 1].value.signum();
                (x, -y)
            })
            .collect())
    }

    fn read_buttons(&self, device: &Device) -> std::io::Result<Vec<bool>> {
        let keys = device.get_key_state()?;
        Ok(self.buttons.iter().map(|key| keys.contains(*key)).collect())
    }
}

/// A joystick tracked by the backend for event generation
struct Slot {
    path: PathBuf,
    instance_id: u32,
    name: String,
    device: Device,
    layout: DeviceLayout,
    buttons: Vec<bool>,
    axes: Vec<f32>,
    hats: Vec<(i32, i32)>,
}

impl Slot {
    fn new(path: PathBuf, instance_id: u32, device: Device) -> Self {
        let layout = DeviceLayout::inspect(&device);
        let buttons = layout.read_buttons(&device).unwrap_or_default();
        let axes = layout.read_axes(&device).unwrap_or_default();
        let hats = layout.read_hats(&device).unwrap_or_default();
        let name = device.name().unwrap_or("Unknown Joystick").to_string();

        Self {
            path,
            instance_id,
            name,
            device,
            layout,
            buttons,
            axes,
            hats,
        }
    }

    /// Appends events for everything that changed since the last call
    fn diff(&mut self, joy: usize, events: &mut Vec<InputEvent>) {
        if let Ok(buttons) = self.layout.read_buttons(&self.device) {
            let changes = buttons.iter().zip(self.buttons.iter_mut()).enumerate();
            for (button, (&now, was)) in changes {
                if now != *was {
                    *was = now;
                    let kind = if now {
                        EventKind::JoyButtonDown { joy, button }
                    } else {
                        EventKind::JoyButtonUp { joy, button }
                    };
                    events.push(InputEvent::new(kind));
                }
            }
        }

        if let Ok(axes) = self.layout.read_axes(&self.device) {
            for (axis, (&value, last)) in axes.iter().zip(self.axes.iter_mut()).enumerate() {
                if (value - *last).abs() >= AXIS_EPSILON {
                    *last = value;
                    events.push(InputEvent::new(EventKind::JoyAxisMotion { joy, axis, value }));
                }
            }
        }

        if let Ok(hats) = self.layout.read_hats(&self.device) {
            for (hat, (&value, last)) in hats.iter().zip(self.hats.iter_mut()).enumerate() {
                if value != *last {
                    *last = value;
                    events.push(InputEvent::new(EventKind::JoyHatMotion { joy, hat, value }));
                }
            }
        }
    }
}

/// Joystick backend over Linux evdev
///
/// # Examples
///
/// ```no_run
/// use joyhub::device::{EvdevBackend, JoystickBackend};
///
/// let mut backend = EvdevBackend::new()?;
/// for index in backend.device_indices() {
///     println!("{}: {:?}", index, backend.device_name(index));
/// }
/// let events = backend.poll_events();
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct EvdevBackend {
    input_dir: PathBuf,
    slots: BTreeMap<usize, Slot>,
    /// Non-joystick nodes with their names, `None` if they could not be opened
    others: BTreeMap<PathBuf, Option<String>>,
    next_instance_id: u32,
    rescan_interval: Duration,
    last_scan: Option<Instant>,
}

impl std::fmt::Debug for EvdevBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevBackend")
            .field("input_dir", &self.input_dir)
            .field("devices", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl EvdevBackend {
    /// Create a backend and enumerate the joysticks already attached
    ///
    /// # Errors
    ///
    /// Returns `Io` if `/dev/input` cannot be read.
    pub fn new() -> Result<Self> {
        Self::with_input_dir(INPUT_DIR)
    }

    /// Create a backend scanning a custom directory
    pub fn with_input_dir<P: AsRef<Path>>(input_dir: P) -> Result<Self> {
        let mut backend = Self {
            input_dir: input_dir.as_ref().to_path_buf(),
            slots: BTreeMap::new(),
            others: BTreeMap::new(),
            next_instance_id: 0,
            rescan_interval: DEFAULT_RESCAN_INTERVAL,
            last_scan: None,
        };
        backend.rescan(&mut Vec::new())?;
        Ok(backend)
    }

    /// Change how often hot-plug rescans happen
    pub fn set_rescan_interval(&mut self, interval: Duration) {
        self.rescan_interval = interval;
    }

    /// Collect this frame's controller events, including hot-plug notifications
    ///
    /// Never blocks. Scan failures are logged and retried on the next interval.
    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        let due = self
            .last_scan
            .map_or(true, |last| last.elapsed() >= self.rescan_interval);
        if due {
            if let Err(e) = self.rescan(&mut events) {
                debug!("Rescan of {} failed: {}", self.input_dir.display(), e);
            }
        }

        for (&joy, slot) in self.slots.iter_mut() {
            slot.diff(joy, &mut events);
        }

        events
    }

    fn event_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.input_dir)?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .map_or(false, |name| name.to_string_lossy().starts_with("event"))
            })
            .collect();

        // Sort entries for deterministic index assignment
        paths.sort();
        Ok(paths)
    }

    fn rescan(&mut self, events: &mut Vec<InputEvent>) -> Result<()> {
        self.last_scan = Some(Instant::now());
        let paths = self.event_paths()?;
        let present: HashSet<&PathBuf> = paths.iter().collect();

        let removed: Vec<usize> = self
            .slots
            .iter()
            .filter(|(_, slot)| !present.contains(&slot.path))
            .map(|(&index, _)| index)
            .collect();
        for index in &removed {
            if let Some(slot) = self.slots.remove(index) {
                info!("Joystick {} removed: {}", index, slot.name);
                events.push(InputEvent::new(EventKind::JoyDeviceRemoved {
                    instance_id: slot.instance_id,
                }));
            }
        }
        self.others.retain(|path, _| present.contains(path));

        // Indices freed above stay reserved until the next rescan
        let mut in_use: BTreeSet<usize> = removed.into_iter().collect();
        in_use.extend(self.slots.keys().copied());

        for path in paths {
            if self.others.contains_key(&path) || self.slots.values().any(|s| s.path == path) {
                continue;
            }

            match Device::open(&path) {
                Ok(device) if is_joystick(&device) => {
                    let index = lowest_free_index(&in_use);
                    let slot = Slot::new(path, self.next_instance_id, device);
                    info!("Joystick {} found at {}: {}", index, slot.path.display(), slot.name);
                    self.next_instance_id += 1;
                    in_use.insert(index);
                    self.slots.insert(index, slot);
                    events.push(InputEvent::new(EventKind::JoyDeviceAdded {
                        device_index: index,
                    }));
                }
                Ok(device) => {
                    debug!("Ignoring non-joystick device {}", path.display());
                    self.others.insert(path, device.name().map(str::to_string));
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                    self.others.insert(path, None);
                }
            }
        }

        Ok(())
    }
}

impl JoystickBackend for EvdevBackend {
    fn device_indices(&self) -> Vec<usize> {
        self.slots.keys().copied().collect()
    }

    fn device_name(&self, index: usize) -> Option<String> {
        self.slots.get(&index).map(|slot| slot.name.clone())
    }

    fn open(&mut self, index: usize) -> Result<Box<dyn DeviceHandle>> {
        let slot = self.slots.get(&index).ok_or_else(|| InputError::DeviceOpen {
            index,
            reason: "no joystick at this index".to_string(),
        })?;

        let device = Device::open(&slot.path).map_err(|e| InputError::DeviceOpen {
            index,
            reason: format!("{}: {}", slot.path.display(), e),
        })?;

        Ok(Box::new(EvdevHandle::new(
            device,
            slot.path.clone(),
            slot.instance_id,
        )))
    }

    fn open_companion(&mut self, index: usize, keyword: &str) -> Option<Box<dyn DeviceHandle>> {
        let slot = self.slots.get(&index)?;
        let path = self
            .others
            .iter()
            .find(|(_, name)| {
                name.as_deref()
                    .map_or(false, |name| is_companion_name(&slot.name, name, keyword))
            })
            .map(|(path, _)| path.clone())?;

        match Device::open(&path) {
            Ok(device) => {
                debug!("Joystick {} uses {} device {}", index, keyword, path.display());
                Some(Box::new(EvdevHandle::new(device, path, slot.instance_id)))
            }
            Err(e) => {
                debug!("Could not open {} device {}: {}", keyword, path.display(), e);
                None
            }
        }
    }
}

/// Opened evdev joystick
pub struct EvdevHandle {
    device: Option<Device>,
    path: PathBuf,
    name: String,
    guid: String,
    instance_id: u32,
    layout: DeviceLayout,
    rumble_supported: bool,
    effect: Option<FFEffect>,
}

impl EvdevHandle {
    fn new(device: Device, path: PathBuf, instance_id: u32) -> Self {
        let layout = DeviceLayout::inspect(&device);
        let rumble_supported = device
            .supported_ff()
            .map_or(false, |ff| ff.contains(FFEffectType::FF_RUMBLE));

        Self {
            name: device.name().unwrap_or("Unknown Joystick").to_string(),
            guid: sdl_guid(&device),
            device: Some(device),
            path,
            instance_id,
            layout,
            rumble_supported,
            effect: None,
        }
    }

    fn device(&self) -> Result<&Device> {
        self.device
            .as_ref()
            .ok_or_else(|| InputError::Device(format!("{} is closed", self.path.display())))
    }

    fn device_mut(&mut self) -> Result<&mut Device> {
        let path = &self.path;
        self.device
            .as_mut()
            .ok_or_else(|| InputError::Device(format!("{} is closed", path.display())))
    }
}

/// Scale 0.0..1.0 to a force feedback magnitude
fn ff_magnitude(value: f32) -> u16 {
    (value.clamp(0.0, 1.0) * f32::from(u16::MAX)) as u16
}

impl DeviceHandle for EvdevHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn guid(&self) -> &str {
        &self.guid
    }

    fn instance_id(&self) -> u32 {
        self.instance_id
    }

    fn num_axes(&self) -> usize {
        self.layout.axes.len()
    }

    fn num_buttons(&self) -> usize {
        self.layout.buttons.len()
    }

    fn num_hats(&self) -> usize {
        self.layout.hats
    }

    fn axis(&self, index: usize) -> Result<f32> {
        let axis = *self
            .layout
            .axes
            .get(index)
            .ok_or_else(|| InputError::Device(format!("axis {} out of range", index)))?;
        let abs = self.device()?.get_abs_state()?;
        let info = abs[axis.0 as usize];
        Ok(normalize(info.value, info.minimum, info.maximum))
    }

    fn rumble(&mut self, low_frequency: f32, high_frequency: f32, duration_ms: u32) -> Result<()> {
        if !self.rumble_supported {
            return Err(InputError::Device(format!("{} has no rumble motor", self.name)));
        }

        let data = FFEffectData {
            direction: 0,
            trigger: FFTrigger {
                button: 0,
                interval: 0,
            },
            replay: FFReplay {
                length: duration_ms.min(u32::from(u16::MAX)) as u16,
                delay: 0,
            },
            kind: FFEffectKind::Rumble {
                strong_magnitude: ff_magnitude(low_frequency),
                weak_magnitude: ff_magnitude(high_frequency),
            },
        };

        // Dropping the previous effect removes it from the device
        self.effect = None;
        let mut effect = self.device_mut()?.upload_ff_effect(data)?;
        effect.play(1)?;
        self.effect = Some(effect);
        Ok(())
    }

    fn stop_rumble(&mut self) -> Result<()> {
        if let Some(mut effect) = self.effect.take() {
            effect.stop()?;
        }
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.device.is_some() && self.path.exists()
    }

    fn close(&mut self) {
        self.effect = None;
        if self.device.take().is_some() {
            debug!("Closed {}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_full_range() {
        assert_eq!(normalize(0, 0, 255), -1.0);
        assert_eq!(normalize(255, 0, 255), 1.0);
        assert!(normalize(128, 0, 255).abs() < 0.01);
        assert!(normalize(0, -32768, 32767).abs() < 0.001);
    }

    #[test]
    fn test_normalize_degenerate_range() {
        assert_eq!(normalize(5, 0, 0), 0.0);
        assert_eq!(normalize(5, 10, 0), 0.0);
    }

    #[test]
    fn test_normalize_clamps() {
        assert_eq!(normalize(300, 0, 255), 1.0);
        assert_eq!(normalize(-20, 0, 255), -1.0);
    }

    #[test]
    fn test_hat_codes() {
        assert!(is_hat(AbsoluteAxisType::ABS_HAT0X));
        assert!(is_hat(AbsoluteAxisType::ABS_HAT3Y));
        assert!(!is_hat(AbsoluteAxisType::ABS_X));
        assert!(!is_hat(AbsoluteAxisType::ABS_RZ));
    }

    #[test]
    fn test_companion_name_matching() {
        assert!(is_companion_name(
            "Sony Interactive Entertainment Wireless Controller",
            "Sony Interactive Entertainment Wireless Controller Touchpad",
            "touchpad"
        ));
        assert!(is_companion_name(
            "DualSense Wireless Controller",
            "DualSense Wireless Controller Touchpad",
            "touchpad"
        ));
        assert!(is_companion_name(
            "Wireless Controller",
            "Wireless Controller Touchpad",
            "TOUCHPAD"
        ));

        // Motion sensor node of the same pad
        assert!(!is_companion_name(
            "Wireless Controller",
            "Wireless Controller Motion Sensors",
            "touchpad"
        ));
        // Touchpad of an unrelated device
        assert!(!is_companion_name(
            "Wireless Controller",
            "SynPS/2 Synaptics TouchPad",
            "touchpad"
        ));
        // A touchpad-named joystick is not its own companion
        assert!(!is_companion_name("Touchpad Pro", "Touchpad Pro", "touchpad"));
    }

    #[test]
    fn test_lowest_free_index() {
        assert_eq!(lowest_free_index(&BTreeSet::new()), 0);
        assert_eq!(lowest_free_index(&BTreeSet::from([0, 1, 3])), 2);
        assert_eq!(lowest_free_index(&BTreeSet::from([1, 2])), 0);
    }

    #[test]
    fn test_freed_index_not_reused_in_same_rescan() {
        // Index 0 was just freed and index 1 is still plugged in
        let mut in_use: BTreeSet<usize> = vec![0].into_iter().collect();
        in_use.extend([1]);
        assert_eq!(lowest_free_index(&in_use), 2);
    }

    #[test]
    fn test_ff_magnitude() {
        assert_eq!(ff_magnitude(0.0), 0);
        assert_eq!(ff_magnitude(1.0), u16::MAX);
        assert_eq!(ff_magnitude(2.0), u16::MAX);
        assert_eq!(ff_magnitude(-1.0), 0);
    }

    #[test]
    fn test_missing_input_dir_fails() {
        let result = EvdevBackend::with_input_dir("/nonexistent/input/dir/12345");
        assert!(matches!(result, Err(InputError::Io(_))));
    }

    #[test]
    fn test_empty_input_dir_has_no_devices() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut backend = EvdevBackend::with_input_dir(dir.path()).expect("backend");
        assert!(backend.device_indices().is_empty());
        assert!(backend.device_name(0).is_none());
        assert!(backend.open(0).is_err());
        assert!(backend.poll_events().is_empty());
    }

    #[test]
    fn test_non_event_files_are_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("js0"), b"").expect("write");
        std::fs::write(dir.path().join("mice"), b"").expect("write");
        let backend = EvdevBackend::with_input_dir(dir.path()).expect("backend");
        assert!(backend.device_indices().is_empty());
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_enumerate_with_real_hardware() {
        // This test requires a connected controller
        let mut backend = EvdevBackend::new().expect("Failed to read /dev/input");
        let indices = backend.device_indices();
        assert!(!indices.is_empty(), "Should detect a connected controller");

        let handle = backend.open(indices[0]).expect("Controller should open");
        assert!(handle.num_axes() >= 2);
        assert_eq!(handle.guid().len(), 32);
    }
}
