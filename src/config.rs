//! Settings file for `camctl` and embedding applications.
//!
//! ```toml
//! save_to = "host"
//! picture_dir = "~/Pictures/tethered"
//! artist = "Jane Doe"
//!
//! [live_view]
//! frames = 30
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::camera::Camera;
use crate::capture::SaveDestination;
use crate::error::{CameraError, Result};

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV: &str = "CAMSESSION_CONFIG";

/// Live-view session parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiveViewSettings {
    /// Frames to wait for before stopping
    pub frames: u32,
}

impl Default for LiveViewSettings {
    fn default() -> Self {
        Self { frames: 10 }
    }
}

/// Session defaults applied after connecting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub save_to: SaveDestination,
    /// Required when `save_to` is `host`. Supports `~`.
    pub picture_dir: Option<PathBuf>,
    pub live_view: LiveViewSettings,
    pub owner_name: Option<String>,
    pub artist: Option<String>,
    pub copyright: Option<String>,
}

impl Settings {
    /// `<config dir>/camsession/config.toml`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("camsession").join("config.toml"))
    }

    /// Load settings from `explicit`, or from the default location.
    ///
    /// A missing default file yields defaults. A missing explicit file is an
    /// error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(CameraError::ConfigNotFound {
                    path: path.display().to_string(),
                });
            }
            return Self::load_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_file(&path),
            _ => {
                debug!("No settings file, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let settings = Self::from_toml(&contents)
            .map_err(|e| CameraError::ConfigParse(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let settings: Self =
            toml::from_str(contents).map_err(|e| CameraError::ConfigParse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.save_to == SaveDestination::Host && self.picture_dir.is_none() {
            return Err(CameraError::ConfigParse(
                "save_to = \"host\" requires picture_dir".to_string(),
            ));
        }
        Ok(())
    }

    /// `picture_dir` with `~` expanded.
    pub fn resolved_picture_dir(&self) -> Result<Option<PathBuf>> {
        self.picture_dir.as_deref().map(expand_home).transpose()
    }

    /// Push these defaults to a connected camera.
    pub fn apply(&self, camera: &mut Camera) -> Result<()> {
        if let Some(owner) = &self.owner_name {
            camera.set_owner_name(owner)?;
        }
        if let Some(artist) = &self.artist {
            camera.set_artist(artist)?;
        }
        if let Some(copyright) = &self.copyright {
            camera.set_copyright(copyright)?;
        }

        match (self.save_to, self.resolved_picture_dir()?) {
            (SaveDestination::Host, Some(dir)) => camera.save_to_host(dir),
            (SaveDestination::Host, None) => Err(CameraError::ConfigParse(
                "save_to = \"host\" requires picture_dir".to_string(),
            )),
            (SaveDestination::Device, _) => camera.save_to_device(),
        }
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    if raw != "~" && !raw.starts_with("~/") {
        return Ok(path.to_path_buf());
    }

    let home = dirs::home_dir()
        .ok_or_else(|| CameraError::Other("Could not determine home directory".to_string()))?;
    let resolved = match raw.strip_prefix("~/") {
        Some(rest) if !rest.is_empty() => home.join(rest),
        _ => home,
    };
    trace!(original = %path.display(), resolved = %resolved.display(), "Expanded home directory");
    Ok(resolved)
}
