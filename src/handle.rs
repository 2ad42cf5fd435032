//! Exclusive owner of one native device reference.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::device::{CameraRef, CameraSdk, StatusCode};
use crate::error::{CameraError, Result};

/// Owns a device reference and its disposal state.
///
/// The reference is released exactly once, either through [`NativeHandle::dispose`]
/// or on drop. Every accessor fails with [`CameraError::ResourceDisposed`]
/// afterwards.
pub struct NativeHandle {
    sdk: Arc<dyn CameraSdk>,
    camera: Option<CameraRef>,
}

impl NativeHandle {
    /// Take ownership of `camera`, to be released through `sdk`.
    pub fn new(sdk: Arc<dyn CameraSdk>, camera: CameraRef) -> Self {
        debug!(camera = ?camera, "Acquired native handle");
        Self {
            sdk,
            camera: Some(camera),
        }
    }

    /// Turn a native status into a result.
    pub fn assert(status: StatusCode, message: &str) -> Result<()> {
        if status.is_success() {
            Ok(())
        } else {
            Err(CameraError::device(status, message))
        }
    }

    /// Fail fast once the handle has been released.
    pub fn check_disposed(&self) -> Result<()> {
        self.camera().map(|_| ())
    }

    /// Whether the handle has been released.
    pub const fn is_disposed(&self) -> bool {
        self.camera.is_none()
    }

    /// Borrow the live reference.
    pub fn camera(&self) -> Result<&CameraRef> {
        self.camera.as_ref().ok_or(CameraError::ResourceDisposed)
    }

    /// The SDK this handle talks through.
    pub fn sdk(&self) -> &dyn CameraSdk {
        self.sdk.as_ref()
    }

    /// Release the reference. Returns true if this call performed the release.
    pub fn dispose(&mut self) -> bool {
        match self.camera.take() {
            Some(camera) => {
                debug!(camera = ?camera, "Releasing native handle");
                self.sdk.release(camera);
                true
            }
            None => {
                trace!("Native handle already released");
                false
            }
        }
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHandle")
            .field("camera", &self.camera)
            .finish_non_exhaustive()
    }
}
