//! Save-location selection, live view and picture capture.

use std::fmt;
use std::path::{Path, PathBuf};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::camera::Camera;
use crate::command::CommandChannel;
use crate::device::{CameraCommand, Capacity, PropertyId};
use crate::error::{CameraError, Result};
use crate::events::PropertyEvent;
use crate::handle::NativeHandle;
use crate::property::PropertyStore;

/// Where captured images are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveDestination {
    /// Memory card in the body
    #[default]
    Device = 1,
    /// Transferred to the host filesystem
    Host = 2,
}

impl SaveDestination {
    pub const fn code(self) -> u32 {
        self as u32
    }

    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Device),
            2 => Some(Self::Host),
            _ => None,
        }
    }
}

impl fmt::Display for SaveDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => write!(f, "device"),
            Self::Host => write!(f, "host"),
        }
    }
}

bitflags! {
    /// Live-view output targets.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EvfOutputDevice: u32 {
        /// Rear screen of the body
        const TFT = 0x01;
        /// Host computer
        const PC = 0x02;
    }
}

impl Serialize for EvfOutputDevice {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl Camera {
    /// Select where the device stores captures.
    ///
    /// Every change also resets the reported host capacity to
    /// [`Capacity::UNLIMITED`], under the UI lock.
    pub fn change_save_location(&mut self, destination: SaveDestination) -> Result<()> {
        self.handle.check_disposed()?;
        self.session.ensure_open(&self.handle)?;

        PropertyStore::new(&self.handle).set_integer(PropertyId::SaveTo, destination.code())?;
        CommandChannel::new(&self.handle, &mut self.session).run_locked(|handle| {
            let status = handle
                .sdk()
                .set_capacity(handle.camera()?, Capacity::UNLIMITED);
            NativeHandle::assert(status, "Failed to set capacity")
        })?;

        info!(%destination, "Save location changed");
        Ok(())
    }

    /// Store captures on the memory card.
    pub fn save_to_device(&mut self) -> Result<()> {
        self.set_picture_path(None);
        self.change_save_location(SaveDestination::Device)
    }

    /// Transfer captures to `path` on the host, creating it if needed.
    pub fn save_to_host(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(CameraError::InvalidArgument(
                "picture path must not be empty".to_string(),
            ));
        }
        self.handle.check_disposed()?;

        if !path.is_dir() {
            debug!(path = %path.display(), "Creating picture directory");
            std::fs::create_dir_all(path).map_err(|source| CameraError::CreateDirectory {
                path: path.display().to_string(),
                source,
            })?;
        }
        self.set_picture_path(Some(path.to_path_buf()));
        self.change_save_location(SaveDestination::Host)
    }

    /// Host directory receiving captures, if saving to host.
    pub fn picture_path(&self) -> Option<&Path> {
        self.picture_path.as_deref()
    }

    /// Read the save destination back from the device.
    pub fn save_destination(&mut self) -> Result<SaveDestination> {
        let code = self.integer(PropertyId::SaveTo)?;
        SaveDestination::from_code(code)
            .ok_or_else(|| CameraError::Other(format!("unknown save destination code {code}")))
    }

    /// Enter view-finder mode if needed and route frames to the host.
    pub fn start_live_view(&mut self) -> Result<()> {
        self.handle.check_disposed()?;
        self.session.ensure_open(&self.handle)?;

        let store = PropertyStore::new(&self.handle);
        if store.get_integer(PropertyId::EvfMode)? == 0 {
            store.set_integer(PropertyId::EvfMode, 1)?;
        }
        let outputs = EvfOutputDevice::from_bits_retain(store.get_integer(PropertyId::EvfOutputDevice)?);
        store.set_integer(PropertyId::EvfOutputDevice, (outputs | EvfOutputDevice::PC).bits())?;

        info!("Live view started");
        self.registry.events().property().emit(&PropertyEvent::LiveViewStarted);
        Ok(())
    }

    /// Stop routing frames to the host. Other outputs stay as they are.
    pub fn stop_live_view(&mut self) -> Result<()> {
        self.handle.check_disposed()?;
        self.session.ensure_open(&self.handle)?;

        let store = PropertyStore::new(&self.handle);
        let outputs = EvfOutputDevice::from_bits_retain(store.get_integer(PropertyId::EvfOutputDevice)?);
        store.set_integer(PropertyId::EvfOutputDevice, (outputs - EvfOutputDevice::PC).bits())?;

        info!("Live view stopped");
        self.registry.events().property().emit(&PropertyEvent::LiveViewStopped);
        Ok(())
    }

    /// Whether frames are currently routed to the host.
    pub fn is_live_view_active(&mut self) -> Result<bool> {
        Ok(self.evf_output_device()?.contains(EvfOutputDevice::PC))
    }

    /// Trigger a capture.
    ///
    /// The resulting [`crate::events::ObjectEvent::PictureTaken`] arrives
    /// through the event channels.
    pub fn take_picture(&mut self) -> Result<()> {
        let status = CommandChannel::new(&self.handle, &mut self.session)
            .send_command(CameraCommand::TakePicture, 0)?;
        NativeHandle::assert(status, "Failed to take picture")?;
        debug!("Capture command accepted");
        Ok(())
    }

    /// Pump pending device events on the calling thread.
    pub fn process_events(&mut self) -> Result<()> {
        self.handle.check_disposed()?;
        let status = self.handle.sdk().get_event();
        NativeHandle::assert(status, "Failed to process device events")
    }

    fn set_picture_path(&mut self, path: Option<PathBuf>) {
        self.registry.events().set_picture_path(path.clone());
        self.picture_path = path;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::device::mock::{FailPoint, MockConfig, MockSdk, Operation};
    use crate::device::{StateEventKind, StatusCode, StatusCommand};

    fn camera() -> (Arc<MockSdk>, Camera) {
        let sdk = Arc::new(MockSdk::eos().with_config(MockConfig::quiet()));
        let camera = Camera::new(sdk.clone(), sdk.camera_ref()).unwrap();
        (sdk, camera)
    }

    #[test]
    fn test_save_destination_codes() {
        assert_eq!(SaveDestination::Device.code(), 1);
        assert_eq!(SaveDestination::Host.code(), 2);
        assert_eq!(SaveDestination::from_code(2), Some(SaveDestination::Host));
        assert_eq!(SaveDestination::from_code(3), None);
    }

    #[test]
    fn test_change_save_location_resets_capacity_under_lock() {
        let (sdk, mut camera) = camera();
        camera.save_to_device().unwrap();

        let capacity = Operation::SetCapacity {
            capacity: Capacity::UNLIMITED,
        };
        let lock = Operation::SendStatusCommand {
            command: StatusCommand::UiLock,
            param: 0,
        };
        let unlock = Operation::SendStatusCommand {
            command: StatusCommand::UiUnlock,
            param: 0,
        };
        sdk.assert_before(&Operation::OpenSession, &Operation::SetProperty {
            property: PropertyId::SaveTo,
            data: 1u32.to_le_bytes().to_vec(),
        });
        sdk.assert_before(&lock, &capacity);
        sdk.assert_before(&capacity, &unlock);
        assert_eq!(sdk.integer(PropertyId::SaveTo), Some(1));
        assert!(camera.picture_path().is_none());
    }

    #[test]
    fn test_capacity_failure_still_unlocks() {
        let (sdk, mut camera) = camera();
        sdk.fail_next(FailPoint::SetCapacity, StatusCode::INTERNAL_ERROR);

        let err = camera.save_to_device().unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_ERROR));
        sdk.assert_contains(&Operation::SendStatusCommand {
            command: StatusCommand::UiUnlock,
            param: 0,
        });
    }

    #[test]
    fn test_save_to_host_rejects_blank_paths() {
        let (sdk, mut camera) = camera();
        sdk.clear_operations();

        for path in ["", "   "] {
            let err = camera.save_to_host(path).unwrap_err();
            assert!(matches!(err, CameraError::InvalidArgument(_)));
        }
        sdk.assert_no_operations();
    }

    #[test]
    fn test_save_to_host_creates_directory() {
        let (sdk, mut camera) = camera();
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("shots").join("today");

        camera.save_to_host(&target).unwrap();

        assert!(target.is_dir());
        assert_eq!(camera.picture_path(), Some(target.as_path()));
        assert_eq!(sdk.integer(PropertyId::SaveTo), Some(2));
        assert_eq!(camera.save_destination().unwrap(), SaveDestination::Host);
    }

    #[test]
    fn test_save_to_host_reports_directory_failure() {
        let (sdk, mut camera) = camera();
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        sdk.clear_operations();

        let err = camera.save_to_host(blocker.join("shots")).unwrap_err();

        assert!(matches!(err, CameraError::CreateDirectory { .. }));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.is_user_recoverable());
        assert_eq!(camera.picture_path(), None);
        sdk.assert_no_operations();
    }

    #[test]
    fn test_live_view_preserves_other_outputs() {
        let (sdk, mut camera) = camera();
        sdk.preset_integer(PropertyId::EvfOutputDevice, EvfOutputDevice::TFT.bits());

        camera.start_live_view().unwrap();
        assert_eq!(sdk.integer(PropertyId::EvfMode), Some(1));
        assert!(camera.is_live_view_active().unwrap());

        camera.stop_live_view().unwrap();
        assert_eq!(sdk.integer(PropertyId::EvfMode), Some(1));
        assert_eq!(
            sdk.integer(PropertyId::EvfOutputDevice),
            Some(EvfOutputDevice::TFT.bits())
        );
        assert!(!camera.is_live_view_active().unwrap());
    }

    #[test]
    fn test_start_live_view_skips_enabled_evf_mode() {
        let (sdk, mut camera) = camera();
        sdk.preset_integer(PropertyId::EvfMode, 1);

        camera.start_live_view().unwrap();
        assert!(sdk.operations().iter().all(|op| !matches!(
            op,
            Operation::SetProperty {
                property: PropertyId::EvfMode,
                ..
            }
        )));
    }

    #[test]
    fn test_take_picture_failure_surfaces_status() {
        let (sdk, mut camera) = camera();
        sdk.fail_next(
            FailPoint::Command(CameraCommand::TakePicture),
            StatusCode::TAKE_PICTURE_AF_NG,
        );

        let err = camera.take_picture().unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::TAKE_PICTURE_AF_NG));
        camera.take_picture().unwrap();
    }

    #[test]
    fn test_take_picture_ignores_pending_jobs() {
        let (sdk, mut camera) = camera();
        let tmp = tempfile::tempdir().unwrap();
        camera.save_to_host(tmp.path()).unwrap();
        camera.take_picture().unwrap();

        // Transfers are left to the application; the next shot still goes out.
        sdk.fire_state(StateEventKind::JobStatusChanged, 1);
        camera.take_picture().unwrap();

        assert_eq!(
            sdk.count_of(&Operation::SendCommand {
                command: CameraCommand::TakePicture,
                param: 0,
            }),
            2
        );
    }

    #[test]
    fn test_operations_after_dispose() {
        let (_sdk, mut camera) = camera();
        camera.dispose();

        assert!(matches!(camera.take_picture(), Err(CameraError::ResourceDisposed)));
        assert!(matches!(camera.start_live_view(), Err(CameraError::ResourceDisposed)));
        assert!(matches!(camera.save_to_device(), Err(CameraError::ResourceDisposed)));
        assert!(matches!(camera.process_events(), Err(CameraError::ResourceDisposed)));
    }
}
