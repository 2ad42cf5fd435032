//! Typed accessors over the device property table.
//!
//! Nothing is cached: every read and write is a round-trip to the device, so
//! repeated reads observe changes made on the camera body itself.
//!
//! Wire encoding: integers are 4-byte little-endian, text is UTF-8 followed by
//! a terminating NUL. A text budget counts the terminator.

use serde::Serialize;
use tracing::{debug, trace};

use crate::device::{PropertyId, PropertyKind};
use crate::error::{CameraError, Result};
use crate::handle::NativeHandle;

/// A property value tagged with its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Integer(u32),
    Text(String),
}

/// Bounded-length text property with its byte budget fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextProperty {
    id: PropertyId,
    max_bytes: usize,
}

impl TextProperty {
    pub const ARTIST: Self = Self::of(PropertyId::Artist);
    pub const COPYRIGHT: Self = Self::of(PropertyId::Copyright);
    pub const OWNER_NAME: Self = Self::of(PropertyId::OwnerName);

    const fn of(id: PropertyId) -> Self {
        match id.kind() {
            PropertyKind::Text { max_bytes } => Self { id, max_bytes },
            PropertyKind::Integer => panic!("not a text property"),
        }
    }

    pub const fn id(self) -> PropertyId {
        self.id
    }

    pub const fn max_bytes(self) -> usize {
        self.max_bytes
    }

    /// Check `value` against the budget without touching the device.
    pub fn validate(self, value: &str) -> Result<()> {
        check_text(self.id, value, self.max_bytes)
    }

    pub fn get(self, store: &PropertyStore<'_>) -> Result<String> {
        store.get_text(self.id)
    }

    pub fn set(self, store: &PropertyStore<'_>, value: &str) -> Result<()> {
        store.set_text(self.id, value, self.max_bytes)
    }
}

/// Property reads and writes against one native handle.
pub struct PropertyStore<'a> {
    handle: &'a NativeHandle,
}

impl<'a> PropertyStore<'a> {
    pub const fn new(handle: &'a NativeHandle) -> Self {
        Self { handle }
    }

    /// Read an integer property.
    pub fn get_integer(&self, id: PropertyId) -> Result<u32> {
        self.handle.check_disposed()?;
        expect_kind(id, false)?;
        let bytes = self.read(id)?;
        let raw: [u8; 4] = bytes
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| {
                CameraError::Other(format!(
                    "{id} returned {} bytes, expected 4",
                    bytes.len()
                ))
            })?;
        Ok(u32::from_le_bytes(raw))
    }

    /// Write an integer property.
    pub fn set_integer(&self, id: PropertyId, value: u32) -> Result<()> {
        self.handle.check_disposed()?;
        expect_kind(id, false)?;
        debug!(property = %id, value, "Setting integer property");
        self.write(id, &value.to_le_bytes())
    }

    /// Read a text property.
    pub fn get_text(&self, id: PropertyId) -> Result<String> {
        self.handle.check_disposed()?;
        expect_kind(id, true)?;
        let bytes = self.read(id)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Write a text property, refusing values whose encoding exceeds `max_bytes`.
    pub fn set_text(&self, id: PropertyId, value: &str, max_bytes: usize) -> Result<()> {
        self.handle.check_disposed()?;
        expect_kind(id, true)?;
        check_text(id, value, max_bytes)?;

        debug!(property = %id, value, "Setting text property");
        let mut encoded = Vec::with_capacity(value.len() + 1);
        encoded.extend_from_slice(value.as_bytes());
        encoded.push(0);
        self.write(id, &encoded)
    }

    /// Read a property as the variant its identifier dictates.
    pub fn get(&self, id: PropertyId) -> Result<PropertyValue> {
        match id.kind() {
            PropertyKind::Integer => self.get_integer(id).map(PropertyValue::Integer),
            PropertyKind::Text { .. } => self.get_text(id).map(PropertyValue::Text),
        }
    }

    /// Write a property; the variant must match the identifier table.
    pub fn set(&self, id: PropertyId, value: &PropertyValue) -> Result<()> {
        match (id.kind(), value) {
            (PropertyKind::Integer, PropertyValue::Integer(v)) => self.set_integer(id, *v),
            (PropertyKind::Text { max_bytes }, PropertyValue::Text(v)) => {
                self.set_text(id, v, max_bytes)
            }
            (kind, _) => Err(CameraError::InvalidArgument(format!(
                "{id} holds {kind:?} values"
            ))),
        }
    }

    fn read(&self, id: PropertyId) -> Result<Vec<u8>> {
        let camera = self.handle.camera()?;
        trace!(property = %id, "Reading property");
        self.handle
            .sdk()
            .get_property_data(camera, id, 0)
            .map_err(|status| CameraError::device(status, format!("Failed to read {id}")))
    }

    fn write(&self, id: PropertyId, data: &[u8]) -> Result<()> {
        let camera = self.handle.camera()?;
        let status = self.handle.sdk().set_property_data(camera, id, 0, data);
        NativeHandle::assert(status, &format!("Failed to write {id}"))
    }
}

fn expect_kind(id: PropertyId, text: bool) -> Result<()> {
    let is_text = matches!(id.kind(), PropertyKind::Text { .. });
    if is_text == text {
        Ok(())
    } else {
        Err(CameraError::InvalidArgument(format!(
            "{id} is not a {} property",
            if text { "text" } else { "integer" }
        )))
    }
}

fn check_text(id: PropertyId, value: &str, max_bytes: usize) -> Result<()> {
    if value.contains('\0') {
        return Err(CameraError::InvalidArgument(format!(
            "{id} value contains a NUL byte"
        )));
    }
    let len = value.len() + 1;
    if len > max_bytes {
        return Err(CameraError::ValueTooLarge {
            property: id.to_string(),
            len,
            max: max_bytes,
        });
    }
    Ok(())
}
