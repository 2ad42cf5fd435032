//! Session and resource lifecycle management for tethered cameras.
//!
//! A [`Camera`] exclusively owns one native device reference. It opens the
//! device session lazily, serializes scripted operations against the body's
//! UI lock, and re-emits device-originated events to subscribers.
//!
//! The native layer is consumed through [`device::CameraSdk`];
//! [`device::mock::MockSdk`] implements it in memory for tests and the
//! `camctl` demo.
//!
//! # Modules
//!
//! - `device`: native SDK seam, code tables, and the mock backend
//! - `handle`: exclusive owner of the native reference
//! - `property`: typed property reads and writes
//! - `events`: handler registration and broadcast channels
//! - `session`: open/close state machine
//! - `command`: command execution and the scoped UI lock
//! - `capture`: save location, live view, capture
//! - `camera`: the composed resource and its teardown
//! - `config`: settings file
//! - `logging`: tracing subscriber setup
#![forbid(unsafe_code)]

pub mod camera;
pub mod capture;
pub mod command;
pub mod config;
pub mod device;
pub mod error;
pub mod events;
pub mod handle;
pub mod logging;
pub mod property;
pub mod session;

pub use camera::Camera;
pub use capture::{EvfOutputDevice, SaveDestination};
pub use config::Settings;
pub use error::{CameraError, Result};
pub use events::{CameraEvents, ObjectEvent, PictureInfo, PropertyEvent, StateEvent};
pub use property::{PropertyValue, TextProperty};
pub use session::SessionState;
