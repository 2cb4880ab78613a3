//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every key is optional; missing keys and sections take their defaults.
//!
//! ```toml
//! [controller]
//! deadzone = 0.15
//! mouse_emulation = false
//! mouse_speed = 5.0
//! mouse_deadzone = 0.2
//!
//! [manager]
//! source_timeout_ms = 500
//! frame_rate_hz = 60
//! ```

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::controller::calibration::{DEFAULT_DEADZONE, DEFAULT_MOUSE_DEADZONE, DEFAULT_MOUSE_SPEED};
use crate::error::{InputError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerConfig,

    #[serde(default)]
    pub manager: ManagerConfig,
}

/// Per-controller defaults applied when a controller connects
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ControllerConfig {
    #[serde(default = "default_deadzone")]
    pub deadzone: f32,

    #[serde(default)]
    pub mouse_emulation: bool,

    #[serde(default = "default_mouse_speed")]
    pub mouse_speed: f32,

    #[serde(default = "default_mouse_deadzone")]
    pub mouse_deadzone: f32,
}

/// Manager configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ManagerConfig {
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,

    #[serde(default = "default_frame_rate_hz")]
    pub frame_rate_hz: u32,
}

// Default value functions
fn default_deadzone() -> f32 { DEFAULT_DEADZONE }
fn default_mouse_speed() -> f32 { DEFAULT_MOUSE_SPEED }
fn default_mouse_deadzone() -> f32 { DEFAULT_MOUSE_DEADZONE }

fn default_source_timeout_ms() -> u64 { 500 }
fn default_frame_rate_hz() -> u32 { 60 }

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            deadzone: default_deadzone(),
            mouse_emulation: false,
            mouse_speed: default_mouse_speed(),
            mouse_deadzone: default_mouse_deadzone(),
        }
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            source_timeout_ms: default_source_timeout_ms(),
            frame_rate_hz: default_frame_rate_hz(),
        }
    }
}

impl ManagerConfig {
    /// Freshness window for active source switching
    #[must_use]
    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }

    /// Time between frames of the polling loop
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate_hz.max(1)
    }
}

fn invalid(message: impl std::fmt::Display) -> InputError {
    InputError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joyhub::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns `Config` errors for malformed TOML or out-of-range values.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("deadzone", self.controller.deadzone),
            ("mouse_deadzone", self.controller.mouse_deadzone),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{} must be between 0.0 and 1.0", name)));
            }
        }

        if !(self.controller.mouse_speed > 0.0 && self.controller.mouse_speed <= 100.0) {
            return Err(invalid("mouse_speed must be greater than 0.0 and at most 100.0"));
        }

        if self.manager.source_timeout_ms == 0 || self.manager.source_timeout_ms > 10000 {
            return Err(invalid("source_timeout_ms must be between 1 and 10000"));
        }

        if self.manager.frame_rate_hz == 0 || self.manager.frame_rate_hz > 1000 {
            return Err(invalid("frame_rate_hz must be between 1 and 1000"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(config: &Config, field: &str) {
        let err = config.validate().expect_err("config should be rejected");
        assert!(
            err.to_string().contains(field),
            "Error '{}' should mention {}",
            err,
            field
        );
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.controller.deadzone, 0.15);
        assert!(!config.controller.mouse_emulation);
        assert_eq!(config.controller.mouse_speed, 5.0);
        assert_eq!(config.controller.mouse_deadzone, 0.2);
        assert_eq!(config.manager.source_timeout(), Duration::from_millis(500));
        assert_eq!(config.manager.frame_rate_hz, 60);
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = Config::parse(include_str!("../config/default.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_partial_sections() {
        let config = Config::parse(
            r#"
[controller]
deadzone = 0.3
mouse_emulation = true

[manager]
source_timeout_ms = 250
"#,
        )
        .unwrap();

        assert_eq!(config.controller.deadzone, 0.3);
        assert!(config.controller.mouse_emulation);
        assert_eq!(config.controller.mouse_speed, 5.0);
        assert_eq!(config.manager.source_timeout_ms, 250);
        assert_eq!(config.manager.frame_rate_hz, 60);
    }

    #[test]
    fn test_parse_malformed_toml() {
        let result = Config::parse("[controller\ndeadzone = ");
        assert!(matches!(result, Err(InputError::Config(_))));
    }

    #[test]
    fn test_parse_wrong_type() {
        let result = Config::parse("[controller]\ndeadzone = \"high\"\n");
        assert!(matches!(result, Err(InputError::Config(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[controller]
mouse_speed = 12.5

[manager]
frame_rate_hz = 120
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.controller.mouse_speed, 12.5);
        assert_eq!(config.manager.frame_rate_hz, 120);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(InputError::Io(_))));
    }

    #[test]
    fn test_load_invalid_values_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[manager]\nsource_timeout_ms = 0\n").unwrap();
        temp_file.flush().unwrap();

        assert!(matches!(Config::load(temp_file.path()), Err(InputError::Config(_))));
    }

    #[test]
    fn test_deadzone_negative() {
        let mut config = Config::default();
        config.controller.deadzone = -0.1;
        assert_invalid(&config, "deadzone");
    }

    #[test]
    fn test_deadzone_too_high() {
        let mut config = Config::default();
        config.controller.deadzone = 1.5;
        assert_invalid(&config, "deadzone");
    }

    #[test]
    fn test_deadzone_bounds_accepted() {
        let mut config = Config::default();
        config.controller.deadzone = 0.0;
        assert!(config.validate().is_ok());
        config.controller.deadzone = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deadzone_nan() {
        let mut config = Config::default();
        config.controller.deadzone = f32::NAN;
        assert_invalid(&config, "deadzone");
    }

    #[test]
    fn test_mouse_deadzone_too_high() {
        let mut config = Config::default();
        config.controller.mouse_deadzone = 1.01;
        assert_invalid(&config, "mouse_deadzone");
    }

    #[test]
    fn test_mouse_speed_zero() {
        let mut config = Config::default();
        config.controller.mouse_speed = 0.0;
        assert_invalid(&config, "mouse_speed");
    }

    #[test]
    fn test_mouse_speed_too_high() {
        let mut config = Config::default();
        config.controller.mouse_speed = 100.5;
        assert_invalid(&config, "mouse_speed");
    }

    #[test]
    fn test_source_timeout_zero() {
        let mut config = Config::default();
        config.manager.source_timeout_ms = 0;
        assert_invalid(&config, "source_timeout_ms");
    }

    #[test]
    fn test_source_timeout_too_high() {
        let mut config = Config::default();
        config.manager.source_timeout_ms = 10001;
        assert_invalid(&config, "source_timeout_ms");
    }

    #[test]
    fn test_frame_rate_zero() {
        let mut config = Config::default();
        config.manager.frame_rate_hz = 0;
        assert_invalid(&config, "frame_rate_hz");
    }

    #[test]
    fn test_frame_rate_too_high() {
        let mut config = Config::default();
        config.manager.frame_rate_hz = 1001;
        assert_invalid(&config, "frame_rate_hz");
    }

    #[test]
    fn test_frame_interval() {
        let config = ManagerConfig {
            source_timeout_ms: 500,
            frame_rate_hz: 50,
        };
        assert_eq!(config.frame_interval(), Duration::from_millis(20));
    }
}
