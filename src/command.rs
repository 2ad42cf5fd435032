//! Command execution and the scoped UI lock.

use tracing::{debug, warn};

use crate::device::{CameraCommand, ShutterButton, StatusCode, StatusCommand};
use crate::error::Result;
use crate::handle::NativeHandle;
use crate::session::Session;

/// Issues commands against an open session.
///
/// Provides no exclusion between threads; callers serialize their own use.
pub struct CommandChannel<'a> {
    handle: &'a NativeHandle,
    session: &'a mut Session,
}

impl<'a> CommandChannel<'a> {
    pub fn new(handle: &'a NativeHandle, session: &'a mut Session) -> Self {
        Self { handle, session }
    }

    /// Open the session if needed and issue `command`, returning the raw status.
    pub fn send_command(&mut self, command: CameraCommand, param: i32) -> Result<StatusCode> {
        self.handle.check_disposed()?;
        self.session.ensure_open(self.handle)?;

        let camera = self.handle.camera()?;
        debug!(?command, param, "Sending command");
        Ok(self.handle.sdk().send_command(camera, command, param))
    }

    /// Run `action` with the camera UI locked.
    ///
    /// A failed lock aborts before `action` runs. The unlock is always
    /// attempted afterwards, and its own result is never reported.
    pub fn run_locked<T>(&mut self, action: impl FnOnce(&NativeHandle) -> Result<T>) -> Result<T> {
        self.handle.check_disposed()?;
        let _lock = UiLock::acquire(self.handle)?;
        action(self.handle)
    }

    /// Keep the camera from auto powering off.
    pub fn extend_shutdown_timer(&mut self) -> Result<()> {
        let status = self.send_command(CameraCommand::ExtendShutDownTimer, 0)?;
        NativeHandle::assert(status, "Failed to extend shutdown timer")
    }

    /// Drive the shutter button remotely.
    pub fn press_shutter(&mut self, button: ShutterButton) -> Result<()> {
        let status = self.send_command(CameraCommand::PressShutterButton, button.param())?;
        NativeHandle::assert(status, "Failed to press shutter button")
    }
}

/// Holds the camera UI lock until dropped.
pub struct UiLock<'a> {
    handle: &'a NativeHandle,
}

impl<'a> UiLock<'a> {
    /// Lock the camera's physical controls.
    pub fn acquire(handle: &'a NativeHandle) -> Result<Self> {
        let camera = handle.camera()?;
        let status = handle
            .sdk()
            .send_status_command(camera, StatusCommand::UiLock, 0);
        NativeHandle::assert(status, "Failed to lock camera UI")?;
        debug!("Camera UI locked");
        Ok(Self { handle })
    }
}

impl Drop for UiLock<'_> {
    fn drop(&mut self) {
        let Ok(camera) = self.handle.camera() else {
            return;
        };
        let status = self
            .handle
            .sdk()
            .send_status_command(camera, StatusCommand::UiUnlock, 0);
        if status.is_success() {
            debug!("Camera UI unlocked");
        } else {
            warn!(status = %status, "Camera UI unlock failed, ignoring");
        }
    }
}
