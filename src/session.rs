//! Logical session atop the native handle.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::handle::NativeHandle;

/// Whether the device session is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Closed,
    Open,
}

/// Tracks the session and drives its only two transitions.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    pub const fn new() -> Self {
        Self {
            state: SessionState::Closed,
        }
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub const fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Open)
    }

    /// Open the session unless it already is.
    pub fn ensure_open(&mut self, handle: &NativeHandle) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }

        let camera = handle.camera()?;
        let status = handle.sdk().open_session(camera);
        NativeHandle::assert(status, "Failed to open session")?;

        self.state = SessionState::Open;
        info!(camera = ?camera, "Session opened");
        Ok(())
    }

    /// Close an open session during teardown.
    ///
    /// Best-effort: a failed close is logged and not retried, and the session
    /// counts as closed either way.
    pub(crate) fn close(&mut self, handle: &NativeHandle) {
        if !self.is_open() {
            return;
        }
        self.state = SessionState::Closed;

        let Ok(camera) = handle.camera() else {
            debug!("Handle already released, skipping session close");
            return;
        };
        let status = handle.sdk().close_session(camera);
        if status.is_success() {
            info!(camera = ?camera, "Session closed");
        } else {
            warn!(status = %status, reason = status.description(), "Session close failed, ignoring");
        }
    }
}
