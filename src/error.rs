//! Error types for camera session operations.

use thiserror::Error;

use crate::device::StatusCode;

/// Primary error type for camera operations.
#[derive(Error, Debug)]
pub enum CameraError {
    // Device errors
    #[error("{message}: {} ({status})", status.description())]
    DeviceOperationFailed { status: StatusCode, message: String },

    #[error("Camera resource has already been disposed")]
    ResourceDisposed,

    // Caller errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Value for {property} is {len} bytes encoded, maximum is {max}")]
    ValueTooLarge {
        property: String,
        len: usize,
        max: usize,
    },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    // Host filesystem errors
    #[error("Failed to create picture directory {path}: {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl CameraError {
    /// Build a `DeviceOperationFailed` from a status and context message.
    pub fn device(status: StatusCode, message: impl Into<String>) -> Self {
        Self::DeviceOperationFailed {
            status,
            message: message.into(),
        }
    }

    /// Native status carried by the error, if it came from the device.
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::DeviceOperationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        match self {
            Self::InvalidArgument(_)
            | Self::ValueTooLarge { .. }
            | Self::ConfigNotFound { .. }
            | Self::CreateDirectory { .. } => true,
            Self::DeviceOperationFailed { status, .. } => status.is_transient(),
            _ => false,
        }
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ResourceDisposed => Some("Reconnect the camera and create a new session"),
            Self::ValueTooLarge { .. } => Some("Shorten the value to fit the property budget"),
            Self::ConfigNotFound { .. } => Some("Check the --config path or CAMSESSION_CONFIG"),
            Self::CreateDirectory { .. } => Some("Check the picture path and its permissions"),
            Self::DeviceOperationFailed { status, .. } => status.hint(),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using CameraError.
pub type Result<T> = std::result::Result<T, CameraError>;
