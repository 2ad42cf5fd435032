//! Native status codes, command codes, property identifiers and raw event ids.
//!
//! Numeric values follow the EDSDK tables so a thin FFI backend can pass them
//! through without translation.

use std::fmt;

use serde::Serialize;

/// Raw status returned by every native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StatusCode(pub u32);

impl StatusCode {
    pub const OK: Self = Self(0x0000_0000);
    pub const INTERNAL_ERROR: Self = Self(0x0000_0002);
    pub const OPERATION_CANCELLED: Self = Self(0x0000_0005);
    pub const NOT_SUPPORTED: Self = Self(0x0000_0007);
    pub const INVALID_PARAMETER: Self = Self(0x0000_0060);
    pub const INVALID_HANDLE: Self = Self(0x0000_0061);
    pub const DEVICE_NOT_FOUND: Self = Self(0x0000_0080);
    pub const DEVICE_BUSY: Self = Self(0x0000_0081);
    pub const COMM_DISCONNECTED: Self = Self(0x0000_00C1);
    pub const SESSION_NOT_OPEN: Self = Self(0x0000_2003);
    pub const TAKE_PICTURE_AF_NG: Self = Self(0x0000_8D01);
    pub const TAKE_PICTURE_NO_CARD_NG: Self = Self(0x0000_8D06);
    pub const TAKE_PICTURE_NO_LENS_NG: Self = Self(0x0000_8D0B);
    pub const LOW_BATTERY: Self = Self(0x0000_A101);
    pub const OBJECT_NOTREADY: Self = Self(0x0000_A102);

    /// True for the single success code.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == Self::OK.0
    }

    /// Conditions that usually clear up if the caller tries again later.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            Self::DEVICE_BUSY | Self::OBJECT_NOTREADY | Self::TAKE_PICTURE_AF_NG
        )
    }

    /// Human-readable description of the code.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::OK => "OK",
            Self::INTERNAL_ERROR => "Internal error",
            Self::OPERATION_CANCELLED => "Operation cancelled",
            Self::NOT_SUPPORTED => "Not supported",
            Self::INVALID_PARAMETER => "Invalid parameter",
            Self::INVALID_HANDLE => "Invalid handle",
            Self::DEVICE_NOT_FOUND => "Device not found",
            Self::DEVICE_BUSY => "Device busy",
            Self::COMM_DISCONNECTED => "Communication disconnected",
            Self::SESSION_NOT_OPEN => "Session not open",
            Self::TAKE_PICTURE_AF_NG => "Auto-focus failed",
            Self::TAKE_PICTURE_NO_CARD_NG => "No memory card",
            Self::TAKE_PICTURE_NO_LENS_NG => "No lens attached",
            Self::LOW_BATTERY => "Low battery",
            Self::OBJECT_NOTREADY => "Object not ready",
            _ => "Unknown error",
        }
    }

    /// Suggested remedy, where one exists.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::DEVICE_BUSY | Self::OBJECT_NOTREADY => Some("Wait for the camera and retry"),
            Self::TAKE_PICTURE_AF_NG => Some("Point at a subject with more contrast or use manual focus"),
            Self::TAKE_PICTURE_NO_CARD_NG => Some("Insert a memory card or save to host"),
            Self::TAKE_PICTURE_NO_LENS_NG => Some("Attach a lens"),
            Self::LOW_BATTERY => Some("Charge or replace the battery"),
            Self::COMM_DISCONNECTED | Self::DEVICE_NOT_FOUND => Some("Check the USB connection"),
            _ => None,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Commands accepted by `send_command`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CameraCommand {
    TakePicture,
    ExtendShutDownTimer,
    BulbStart,
    BulbEnd,
    PressShutterButton,
}

impl CameraCommand {
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::TakePicture => 0x0000_0000,
            Self::ExtendShutDownTimer => 0x0000_0001,
            Self::BulbStart => 0x0000_0002,
            Self::BulbEnd => 0x0000_0003,
            Self::PressShutterButton => 0x0000_0004,
        }
    }
}

/// Parameter for [`CameraCommand::PressShutterButton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShutterButton {
    Off,
    Halfway,
    Completely,
    HalfwayNonAf,
    CompletelyNonAf,
}

impl ShutterButton {
    #[must_use]
    pub const fn param(self) -> i32 {
        match self {
            Self::Off => 0x0000_0000,
            Self::Halfway => 0x0000_0001,
            Self::Completely => 0x0000_0003,
            Self::HalfwayNonAf => 0x0001_0001,
            Self::CompletelyNonAf => 0x0001_0003,
        }
    }
}

/// Commands accepted by `send_status_command`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatusCommand {
    UiLock,
    UiUnlock,
    EnterDirectTransfer,
    ExitDirectTransfer,
}

impl StatusCommand {
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::UiLock => 0,
            Self::UiUnlock => 1,
            Self::EnterDirectTransfer => 2,
            Self::ExitDirectTransfer => 3,
        }
    }
}

/// Value category of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropertyKind {
    Integer,
    Text { max_bytes: usize },
}

macro_rules! property_ids {
    ($($variant:ident = $code:literal => $kind:expr,)*) => {
        /// Closed set of device property identifiers understood by this crate.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum PropertyId {
            $($variant,)*
        }

        impl PropertyId {
            /// Every known identifier, in table order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];

            /// Native identifier.
            #[must_use]
            pub const fn code(self) -> u32 {
                match self {
                    $(Self::$variant => $code,)*
                }
            }

            /// Value category fixed by the identifier table.
            #[must_use]
            pub const fn kind(self) -> PropertyKind {
                match self {
                    $(Self::$variant => $kind,)*
                }
            }

            /// Reverse lookup from a native identifier.
            #[must_use]
            pub const fn from_code(code: u32) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

const fn text(max_bytes: usize) -> PropertyKind {
    PropertyKind::Text { max_bytes }
}

const INT: PropertyKind = PropertyKind::Integer;

property_ids! {
    ProductName = 0x0000_0002 => text(256),
    OwnerName = 0x0000_0004 => text(32),
    MakerName = 0x0000_0005 => text(256),
    FirmwareVersion = 0x0000_0007 => text(32),
    BatteryLevel = 0x0000_0008 => INT,
    SaveTo = 0x0000_000B => INT,
    CurrentStorage = 0x0000_000C => text(256),
    CurrentFolder = 0x0000_000D => text(256),
    BodyIdEx = 0x0000_0015 => text(256),
    ImageQuality = 0x0000_0100 => INT,
    WhiteBalance = 0x0000_0106 => INT,
    AeMode = 0x0000_0400 => INT,
    DriveMode = 0x0000_0401 => INT,
    IsoSpeed = 0x0000_0402 => INT,
    MeteringMode = 0x0000_0403 => INT,
    AfMode = 0x0000_0404 => INT,
    Av = 0x0000_0405 => INT,
    Tv = 0x0000_0406 => INT,
    ExposureCompensation = 0x0000_0407 => INT,
    AvailableShots = 0x0000_040A => INT,
    Artist = 0x0000_0418 => text(64),
    Copyright = 0x0000_0419 => text(64),
    EvfOutputDevice = 0x0000_0500 => INT,
    EvfMode = 0x0000_0501 => INT,
    EvfWhiteBalance = 0x0000_0502 => INT,
    EvfZoom = 0x0000_0507 => INT,
    EvfHistogramStatus = 0x0000_050C => INT,
    EvfAfMode = 0x0000_050E => INT,
}

impl PropertyId {
    /// Properties whose change notifications accompany a new live-view frame.
    #[must_use]
    pub const fn is_frame_coupled(self) -> bool {
        matches!(self, Self::EvfHistogramStatus | Self::EvfZoom)
    }

    /// Properties that describe the storage volume the camera writes to.
    #[must_use]
    pub const fn is_volume_related(self) -> bool {
        matches!(
            self,
            Self::AvailableShots | Self::CurrentStorage | Self::CurrentFolder
        )
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Event codes delivered on the state channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StateEventKind {
    Shutdown,
    JobStatusChanged,
    WillSoonShutDown,
    ShutDownTimerUpdate,
    CaptureError,
    InternalError,
    AfResultNotice,
    BulbExposureTime,
    Unknown(u32),
}

impl StateEventKind {
    /// Registration mask covering every state event.
    pub const ALL: u32 = 0x0000_0300;

    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            0x0000_0301 => Self::Shutdown,
            0x0000_0302 => Self::JobStatusChanged,
            0x0000_0303 => Self::WillSoonShutDown,
            0x0000_0304 => Self::ShutDownTimerUpdate,
            0x0000_0305 => Self::CaptureError,
            0x0000_0306 => Self::InternalError,
            0x0000_0309 => Self::AfResultNotice,
            0x0000_0310 => Self::BulbExposureTime,
            other => Self::Unknown(other),
        }
    }
}

/// Event codes delivered on the object channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectEventKind {
    VolumeInfoChanged,
    VolumeUpdateItems,
    FolderUpdateItems,
    DirItemCreated,
    DirItemRemoved,
    DirItemInfoChanged,
    DirItemContentChanged,
    DirItemRequestTransfer,
    DirItemRequestTransferDt,
    DirItemCancelTransferDt,
    VolumeAdded,
    VolumeRemoved,
    Unknown(u32),
}

impl ObjectEventKind {
    /// Registration mask covering every object event.
    pub const ALL: u32 = 0x0000_0200;

    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            0x0000_0201 => Self::VolumeInfoChanged,
            0x0000_0202 => Self::VolumeUpdateItems,
            0x0000_0203 => Self::FolderUpdateItems,
            0x0000_0204 => Self::DirItemCreated,
            0x0000_0205 => Self::DirItemRemoved,
            0x0000_0206 => Self::DirItemInfoChanged,
            0x0000_0207 => Self::DirItemContentChanged,
            0x0000_0208 => Self::DirItemRequestTransfer,
            0x0000_0209 => Self::DirItemRequestTransferDt,
            0x0000_020A => Self::DirItemCancelTransferDt,
            0x0000_020C => Self::VolumeAdded,
            0x0000_020D => Self::VolumeRemoved,
            other => Self::Unknown(other),
        }
    }
}

/// Event codes delivered on the property channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropertyEventKind {
    PropertyChanged,
    PropertyDescChanged,
    Unknown(u32),
}

impl PropertyEventKind {
    /// Registration mask covering every property event.
    pub const ALL: u32 = 0x0000_0100;

    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            0x0000_0101 => Self::PropertyChanged,
            0x0000_0102 => Self::PropertyDescChanged,
            other => Self::Unknown(other),
        }
    }
}
