//! Native SDK seam for tethered cameras.
//!
//! This module defines the trait the camera resource consumes, along with the
//! decoded value types and code tables it exchanges with the native layer.
//! Marshaling of the SDK's wire structures lives behind the trait; the
//! [`mock`] backend records calls and simulates device behavior for tests and
//! the demo CLI.

mod codes;
mod info;
pub mod mock;

pub use codes::{
    CameraCommand, ObjectEventKind, PropertyEventKind, PropertyId, PropertyKind, ShutterButton,
    StateEventKind, StatusCode, StatusCommand,
};
pub use info::{
    Capacity, CameraRef, DeviceDescriptor, DeviceSubType, DirectoryItem, RawObjectEvent,
    RawPropertyEvent, RawStateEvent,
};

use std::sync::Weak;

/// Callback invoked by the SDK for state-channel events.
pub type StateHandler = dyn Fn(&RawStateEvent) -> StatusCode + Send + Sync;
/// Callback invoked by the SDK for object-channel events.
pub type ObjectHandler = dyn Fn(&RawObjectEvent) -> StatusCode + Send + Sync;
/// Callback invoked by the SDK for property-channel events.
pub type PropertyHandler = dyn Fn(&RawPropertyEvent) -> StatusCode + Send + Sync;

/// Operations consumed from the native device layer.
///
/// Every call is a blocking round-trip to the device. Handlers are handed
/// over as `Weak` references: the caller keeps the strong reference alive for
/// as long as the registration should stay valid, and the SDK must upgrade
/// before each invocation.
///
/// # Implementation Notes
///
/// - Handlers may be invoked from any thread, including from inside
///   [`CameraSdk::get_event`]
/// - Passing `None` as a handler removes the registration for that channel
/// - [`CameraSdk::release`] consumes the reference; it is never called twice
///   for the same device
pub trait CameraSdk: Send + Sync {
    /// Read the device info record. Does not require an open session.
    fn get_device_info(&self, camera: &CameraRef) -> Result<DeviceDescriptor, StatusCode>;

    /// Open the logical session.
    fn open_session(&self, camera: &CameraRef) -> StatusCode;

    /// Close the logical session.
    fn close_session(&self, camera: &CameraRef) -> StatusCode;

    /// Issue a camera command.
    fn send_command(&self, camera: &CameraRef, command: CameraCommand, param: i32) -> StatusCode;

    /// Issue a status command (UI lock/unlock, direct transfer).
    fn send_status_command(
        &self,
        camera: &CameraRef,
        command: StatusCommand,
        param: i32,
    ) -> StatusCode;

    /// Read raw property bytes.
    fn get_property_data(
        &self,
        camera: &CameraRef,
        property: PropertyId,
        param: i32,
    ) -> Result<Vec<u8>, StatusCode>;

    /// Write raw property bytes.
    fn set_property_data(
        &self,
        camera: &CameraRef,
        property: PropertyId,
        param: i32,
        data: &[u8],
    ) -> StatusCode;

    /// Tell the device how much host-side storage is available.
    fn set_capacity(&self, camera: &CameraRef, capacity: Capacity) -> StatusCode;

    /// Register (or clear, with `None`) the state-channel handler.
    fn set_state_handler(
        &self,
        camera: &CameraRef,
        mask: u32,
        handler: Option<Weak<StateHandler>>,
    ) -> StatusCode;

    /// Register (or clear, with `None`) the object-channel handler.
    fn set_object_handler(
        &self,
        camera: &CameraRef,
        mask: u32,
        handler: Option<Weak<ObjectHandler>>,
    ) -> StatusCode;

    /// Register (or clear, with `None`) the property-channel handler.
    fn set_property_handler(
        &self,
        camera: &CameraRef,
        mask: u32,
        handler: Option<Weak<PropertyHandler>>,
    ) -> StatusCode;

    /// Pump pending SDK events on the calling thread.
    fn get_event(&self) -> StatusCode;

    /// Release the native reference.
    fn release(&self, camera: CameraRef);
}
