//! Decoded value types exchanged with the native layer.

use std::fmt;

use serde::Serialize;

use super::codes::{ObjectEventKind, PropertyEventKind, StateEventKind};

/// Opaque reference to one physical device.
///
/// Not `Clone`: the owner hands it back to the SDK by value on release, so a
/// reference can only ever be released once.
#[derive(PartialEq, Eq, Hash)]
pub struct CameraRef(u64);

impl CameraRef {
    /// Wrap a raw native reference.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw native reference, for logging and backend bookkeeping.
    #[must_use]
    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for CameraRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CameraRef({:#x})", self.0)
    }
}

/// Device generation reported in the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceSubType {
    /// Older bodies speaking the legacy protocol (subtype 0).
    Legacy,
    /// Current generation (any non-zero subtype).
    Current,
}

impl DeviceSubType {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        if raw == 0 { Self::Legacy } else { Self::Current }
    }
}

/// Immutable snapshot of the device info record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor {
    /// Human-readable model description
    pub description: String,
    /// Port the device is attached to
    pub port_name: String,
    /// Protocol generation
    pub sub_type: DeviceSubType,
}

impl DeviceDescriptor {
    #[must_use]
    pub const fn is_legacy(&self) -> bool {
        matches!(self.sub_type, DeviceSubType::Legacy)
    }
}

/// Storage capacity record pushed to the device when saving to host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capacity {
    pub free_clusters: i32,
    pub bytes_per_sector: i32,
    pub reset: bool,
}

impl Capacity {
    /// Sentinel meaning "effectively unlimited".
    pub const UNLIMITED: Self = Self {
        free_clusters: 0x7FFF_FFFF,
        bytes_per_sector: 512,
        reset: true,
    };
}

/// Decoded directory item attached to an object event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryItem {
    pub file_name: String,
    pub size: u64,
    pub is_folder: bool,
    /// Native file format code
    pub format: u32,
    /// Device-side timestamp, seconds since the Unix epoch
    pub date_time: u32,
}

/// State-channel notification as delivered by the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawStateEvent {
    pub kind: StateEventKind,
    pub param: u32,
}

/// Object-channel notification as delivered by the SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObjectEvent {
    pub kind: ObjectEventKind,
    pub item: Option<DirectoryItem>,
}

/// Property-channel notification as delivered by the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPropertyEvent {
    pub kind: PropertyEventKind,
    /// Native property identifier; may be outside the known table
    pub property: u32,
    pub param: u32,
}
