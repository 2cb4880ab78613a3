//! # Error Types
//!
//! Custom error types for Joyhub using `thiserror`.

use thiserror::Error;

/// Main error type for Joyhub
#[derive(Debug, Error)]
pub enum InputError {
    /// A device could not be opened or initialized
    #[error("Cannot open joystick {index}: {reason}")]
    DeviceOpen {
        /// Device index that failed to open
        index: usize,
        /// Backend-provided failure description
        reason: String,
    },

    /// Runtime device errors (stale handle, unsupported capability, driver failure)
    #[error("Device error: {0}")]
    Device(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Joyhub
pub type Result<T> = std::result::Result<T, InputError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_open_message() {
        let err = InputError::DeviceOpen {
            index: 3,
            reason: "permission denied".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot open joystick 3: permission denied");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: InputError = io.into();
        assert!(matches!(err, InputError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }
}
