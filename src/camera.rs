//! The camera resource: one device, one session, one set of event handlers.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::capture::EvfOutputDevice;
use crate::command::CommandChannel;
use crate::device::{CameraRef, CameraSdk, DeviceDescriptor, PropertyId, ShutterButton};
use crate::error::{CameraError, Result};
use crate::events::{CameraEvents, EventRegistry};
use crate::handle::NativeHandle;
use crate::property::{PropertyStore, PropertyValue, TextProperty};
use crate::session::{Session, SessionState};

/// Exclusive owner of one tethered camera.
///
/// Owner operations take `&mut self` and must come from a single thread.
/// Device events arrive on the SDK's thread and are delivered through
/// [`Camera::events`].
///
/// Teardown runs in a fixed order, from [`Camera::dispose`] or on drop:
/// close the session, unregister event handlers, release the native handle.
pub struct Camera {
    pub(crate) handle: NativeHandle,
    pub(crate) session: Session,
    pub(crate) registry: EventRegistry,
    pub(crate) picture_path: Option<PathBuf>,
    descriptor: DeviceDescriptor,
}

impl Camera {
    /// Take ownership of `camera_ref`, read its descriptor and register
    /// event handlers. The session is opened lazily.
    pub fn new(sdk: Arc<dyn CameraSdk>, camera_ref: CameraRef) -> Result<Self> {
        let handle = NativeHandle::new(sdk, camera_ref);

        let descriptor = handle
            .sdk()
            .get_device_info(handle.camera()?)
            .map_err(|status| CameraError::device(status, "Failed to read device info"))?;
        let registry = EventRegistry::register(&handle)?;

        info!(
            description = %descriptor.description,
            port = %descriptor.port_name,
            legacy = descriptor.is_legacy(),
            "Camera connected"
        );
        Ok(Self {
            handle,
            session: Session::new(),
            registry,
            picture_path: None,
            descriptor,
        })
    }

    // === Descriptor ===

    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    pub fn description(&self) -> &str {
        &self.descriptor.description
    }

    pub fn port_name(&self) -> &str {
        &self.descriptor.port_name
    }

    pub fn is_legacy(&self) -> bool {
        self.descriptor.is_legacy()
    }

    // === State ===

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_disposed()
    }

    /// Event channels. Subscribers run on the SDK's event thread.
    pub fn events(&self) -> &Arc<CameraEvents> {
        self.registry.events()
    }

    // === Properties ===

    pub fn artist(&mut self) -> Result<String> {
        self.text(TextProperty::ARTIST)
    }

    pub fn set_artist(&mut self, value: &str) -> Result<()> {
        self.set_text(TextProperty::ARTIST, value)
    }

    pub fn copyright(&mut self) -> Result<String> {
        self.text(TextProperty::COPYRIGHT)
    }

    pub fn set_copyright(&mut self, value: &str) -> Result<()> {
        self.set_text(TextProperty::COPYRIGHT, value)
    }

    pub fn owner_name(&mut self) -> Result<String> {
        self.text(TextProperty::OWNER_NAME)
    }

    pub fn set_owner_name(&mut self, value: &str) -> Result<()> {
        self.set_text(TextProperty::OWNER_NAME, value)
    }

    pub fn product_name(&mut self) -> Result<String> {
        self.open_store()?.get_text(PropertyId::ProductName)
    }

    /// Battery charge in percent.
    pub fn battery_level(&mut self) -> Result<u32> {
        self.integer(PropertyId::BatteryLevel)
    }

    /// Shots that still fit on the current volume.
    pub fn available_shots(&mut self) -> Result<u32> {
        self.integer(PropertyId::AvailableShots)
    }

    pub fn is_evf_mode(&mut self) -> Result<bool> {
        Ok(self.integer(PropertyId::EvfMode)? != 0)
    }

    pub fn evf_output_device(&mut self) -> Result<EvfOutputDevice> {
        self.integer(PropertyId::EvfOutputDevice)
            .map(EvfOutputDevice::from_bits_retain)
    }

    /// Read any property as a tagged value.
    pub fn property(&mut self, id: PropertyId) -> Result<PropertyValue> {
        self.open_store()?.get(id)
    }

    /// Write any property. Text values are bounded by the id's budget.
    pub fn set_property(&mut self, id: PropertyId, value: &PropertyValue) -> Result<()> {
        self.open_store()?.set(id, value)
    }

    pub(crate) fn integer(&mut self, id: PropertyId) -> Result<u32> {
        self.open_store()?.get_integer(id)
    }

    fn text(&mut self, property: TextProperty) -> Result<String> {
        property.get(&self.open_store()?)
    }

    fn set_text(&mut self, property: TextProperty, value: &str) -> Result<()> {
        // Reject oversize values before opening a session for them.
        property.validate(value)?;
        property.set(&self.open_store()?, value)
    }

    fn open_store(&mut self) -> Result<PropertyStore<'_>> {
        self.handle.check_disposed()?;
        self.session.ensure_open(&self.handle)?;
        Ok(PropertyStore::new(&self.handle))
    }

    // === Commands ===

    /// Keep the camera from auto powering off.
    pub fn extend_shutdown_timer(&mut self) -> Result<()> {
        CommandChannel::new(&self.handle, &mut self.session).extend_shutdown_timer()
    }

    /// Drive the shutter button remotely.
    pub fn press_shutter(&mut self, button: ShutterButton) -> Result<()> {
        CommandChannel::new(&self.handle, &mut self.session).press_shutter(button)
    }

    /// Run `action` with the camera's physical controls locked.
    pub fn run_locked<T>(&mut self, action: impl FnOnce(&NativeHandle) -> Result<T>) -> Result<T> {
        CommandChannel::new(&self.handle, &mut self.session).run_locked(action)
    }

    // === Teardown ===

    /// Release the camera. Later calls are no-ops.
    pub fn dispose(&mut self) {
        if self.handle.is_disposed() {
            return;
        }
        debug!(description = %self.descriptor.description, "Disposing camera");

        self.session.close(&self.handle);
        self.registry.unregister(&self.handle);
        self.handle.dispose();

        info!(description = %self.descriptor.description, "Camera released");
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor.description)
    }
}

impl fmt::Debug for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Camera")
            .field("descriptor", &self.descriptor)
            .field("session", &self.session.state())
            .field("picture_path", &self.picture_path)
            .field("disposed", &self.handle.is_disposed())
            .finish_non_exhaustive()
    }
}
