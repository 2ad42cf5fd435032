//! Mock SDK implementation for unit testing and simulation.
//!
//! This module provides a mock camera backend that records every native call,
//! keeps an in-memory property table, and lets tests inject failures and
//! deliver device-originated events.
//!
//! # Example
//!
//! ```rust,ignore
//! use camsession::device::mock::{MockSdk, Operation};
//! use camsession::Camera;
//!
//! let sdk = MockSdk::arc();
//! let mut camera = Camera::new(sdk.clone(), sdk.camera_ref()).unwrap();
//!
//! camera.take_picture().unwrap();
//!
//! sdk.assert_contains(&Operation::OpenSession);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, trace};

use super::{
    CameraCommand, CameraRef, CameraSdk, Capacity, DeviceDescriptor, DeviceSubType,
    DirectoryItem, ObjectEventKind, ObjectHandler, PropertyEventKind, PropertyHandler,
    PropertyId, RawObjectEvent, RawPropertyEvent, RawStateEvent, StateEventKind, StateHandler,
    StatusCode, StatusCommand,
};

/// Raw reference handed out by [`MockSdk::camera_ref`].
pub const MOCK_CAMERA_REF: u64 = 0xCA11_0001;

/// Native format code the mock reports for captured JPEGs.
pub const MOCK_JPEG_FORMAT: u32 = 0x3801;

/// Recorded operation for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    GetDeviceInfo,
    OpenSession,
    CloseSession,
    SendCommand {
        command: CameraCommand,
        param: i32,
    },
    SendStatusCommand {
        command: StatusCommand,
        param: i32,
    },
    GetProperty {
        property: PropertyId,
    },
    SetProperty {
        property: PropertyId,
        data: Vec<u8>,
    },
    SetCapacity {
        capacity: Capacity,
    },
    SetStateHandler {
        registered: bool,
    },
    SetObjectHandler {
        registered: bool,
    },
    SetPropertyHandler {
        registered: bool,
    },
    GetEvent,
    Release,
}

/// Native call that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    GetDeviceInfo,
    OpenSession,
    CloseSession,
    Command(CameraCommand),
    StatusCommand(StatusCommand),
    GetProperty(PropertyId),
    SetProperty(PropertyId),
    SetCapacity,
    RegisterHandler,
}

#[derive(Debug, Clone, Copy)]
struct Failure {
    point: FailPoint,
    status: StatusCode,
    once: bool,
}

#[derive(Debug)]
enum PendingEvent {
    State(RawStateEvent),
    Object(RawObjectEvent),
    Property(RawPropertyEvent),
}

/// Configuration for mock behavior.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Reject device calls with `SESSION_NOT_OPEN` while no session is open.
    pub require_session: bool,
    /// Queue a `PropertyChanged` event after every successful property write.
    pub echo_property_events: bool,
    /// Queue a transfer request for a new JPEG after every successful capture.
    pub auto_capture_events: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            require_session: true,
            echo_property_events: true,
            auto_capture_events: true,
        }
    }
}

impl MockConfig {
    /// Configuration that never generates events on its own.
    #[must_use]
    pub fn quiet() -> Self {
        Self {
            echo_property_events: false,
            auto_capture_events: false,
            ..Default::default()
        }
    }
}

/// Mock camera SDK for testing without real hardware.
///
/// Records all native calls for later assertion. Events queued with the
/// `queue_*` methods are delivered by [`CameraSdk::get_event`], mirroring the
/// SDK's message pump; the `fire_*` methods invoke the registered handler
/// immediately on the calling thread.
pub struct MockSdk {
    descriptor: DeviceDescriptor,
    config: MockConfig,
    properties: Mutex<HashMap<PropertyId, Vec<u8>>>,
    operation_log: Mutex<Vec<Operation>>,
    failures: Mutex<Vec<Failure>>,
    state_handler: Mutex<Option<Weak<StateHandler>>>,
    object_handler: Mutex<Option<Weak<ObjectHandler>>>,
    property_handler: Mutex<Option<Weak<PropertyHandler>>>,
    pending: Mutex<VecDeque<PendingEvent>>,
    session_open: AtomicBool,
    release_count: AtomicUsize,
    shot_counter: AtomicU32,
}

impl MockSdk {
    /// Create a new mock for the given descriptor.
    #[must_use]
    pub fn new(descriptor: DeviceDescriptor) -> Self {
        debug!(description = %descriptor.description, "Creating mock camera");

        let mut properties = HashMap::new();
        properties.insert(
            PropertyId::ProductName,
            encode_text(&descriptor.description),
        );
        properties.insert(PropertyId::MakerName, encode_text("Canon Inc."));
        properties.insert(PropertyId::FirmwareVersion, encode_text("1.0.0-mock"));
        properties.insert(PropertyId::BodyIdEx, encode_text("MOCK000001"));
        properties.insert(PropertyId::OwnerName, encode_text(""));
        properties.insert(PropertyId::Artist, encode_text(""));
        properties.insert(PropertyId::Copyright, encode_text(""));
        properties.insert(PropertyId::CurrentStorage, encode_text("SD"));
        properties.insert(PropertyId::CurrentFolder, encode_text("100CANON"));
        properties.insert(PropertyId::BatteryLevel, encode_int(80));
        properties.insert(PropertyId::SaveTo, encode_int(1));
        properties.insert(PropertyId::AvailableShots, encode_int(999));
        properties.insert(PropertyId::IsoSpeed, encode_int(0x48));
        properties.insert(PropertyId::Av, encode_int(0x28));
        properties.insert(PropertyId::Tv, encode_int(0x60));
        properties.insert(PropertyId::EvfMode, encode_int(0));
        properties.insert(PropertyId::EvfOutputDevice, encode_int(0));

        Self {
            descriptor,
            config: MockConfig::default(),
            properties: Mutex::new(properties),
            operation_log: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            state_handler: Mutex::new(None),
            object_handler: Mutex::new(None),
            property_handler: Mutex::new(None),
            pending: Mutex::new(VecDeque::new()),
            session_open: AtomicBool::new(false),
            release_count: AtomicUsize::new(0),
            shot_counter: AtomicU32::new(0),
        }
    }

    /// Current-generation body (most common for testing).
    #[must_use]
    pub fn eos() -> Self {
        Self::new(DeviceDescriptor {
            description: "Canon EOS R6".to_string(),
            port_name: "usb:001,004".to_string(),
            sub_type: DeviceSubType::Current,
        })
    }

    /// Legacy-protocol body.
    #[must_use]
    pub fn legacy() -> Self {
        Self::new(DeviceDescriptor {
            description: "Canon EOS 5D".to_string(),
            port_name: "usb:001,002".to_string(),
            sub_type: DeviceSubType::Legacy,
        })
    }

    /// Shared current-generation mock, ready to hand to a camera.
    #[must_use]
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::eos())
    }

    /// The reference a camera resource should be built over.
    #[must_use]
    pub const fn camera_ref(&self) -> CameraRef {
        CameraRef::from_raw(MOCK_CAMERA_REF)
    }

    // === Configuration ===

    /// Configure mock behavior.
    #[must_use]
    pub fn with_config(mut self, config: MockConfig) -> Self {
        self.config = config;
        self
    }

    /// Fail the next matching call with `status`.
    pub fn fail_next(&self, point: FailPoint, status: StatusCode) {
        self.failures.lock().unwrap().push(Failure {
            point,
            status,
            once: true,
        });
    }

    /// Fail every matching call with `status` until cleared.
    pub fn fail_always(&self, point: FailPoint, status: StatusCode) {
        self.failures.lock().unwrap().push(Failure {
            point,
            status,
            once: false,
        });
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    // === Device State ===

    /// Change an integer property out-of-band, as the device itself would.
    pub fn preset_integer(&self, property: PropertyId, value: u32) {
        self.properties
            .lock()
            .unwrap()
            .insert(property, encode_int(value));
    }

    /// Change a text property out-of-band.
    pub fn preset_text(&self, property: PropertyId, value: &str) {
        self.properties
            .lock()
            .unwrap()
            .insert(property, encode_text(value));
    }

    /// Raw bytes currently stored for a property.
    #[must_use]
    pub fn property_bytes(&self, property: PropertyId) -> Option<Vec<u8>> {
        self.properties.lock().unwrap().get(&property).cloned()
    }

    /// Integer currently stored for a property.
    #[must_use]
    pub fn integer(&self, property: PropertyId) -> Option<u32> {
        self.property_bytes(property).and_then(|b| {
            let bytes: [u8; 4] = b.get(..4)?.try_into().ok()?;
            Some(u32::from_le_bytes(bytes))
        })
    }

    /// Whether the device believes a session is open.
    #[must_use]
    pub fn is_session_open(&self) -> bool {
        self.session_open.load(Ordering::SeqCst)
    }

    /// Number of times the reference was released.
    #[must_use]
    pub fn release_count(&self) -> usize {
        self.release_count.load(Ordering::SeqCst)
    }

    /// Whether a live handler is registered on each channel (state, object, property).
    #[must_use]
    pub fn handlers_registered(&self) -> (bool, bool, bool) {
        (
            live(&self.state_handler),
            live(&self.object_handler),
            live(&self.property_handler),
        )
    }

    // === Event Simulation ===

    /// Invoke the state handler immediately.
    pub fn fire_state(&self, kind: StateEventKind, param: u32) -> Option<StatusCode> {
        self.dispatch(PendingEvent::State(RawStateEvent { kind, param }))
    }

    /// Invoke the object handler immediately.
    pub fn fire_object(
        &self,
        kind: ObjectEventKind,
        item: Option<DirectoryItem>,
    ) -> Option<StatusCode> {
        self.dispatch(PendingEvent::Object(RawObjectEvent { kind, item }))
    }

    /// Invoke the property handler immediately.
    pub fn fire_property(
        &self,
        kind: PropertyEventKind,
        property: u32,
        param: u32,
    ) -> Option<StatusCode> {
        self.dispatch(PendingEvent::Property(RawPropertyEvent {
            kind,
            property,
            param,
        }))
    }

    /// Queue a state event for the next event pump.
    pub fn queue_state(&self, kind: StateEventKind, param: u32) {
        self.enqueue(PendingEvent::State(RawStateEvent { kind, param }));
    }

    /// Queue an object event for the next event pump.
    pub fn queue_object(&self, kind: ObjectEventKind, item: Option<DirectoryItem>) {
        self.enqueue(PendingEvent::Object(RawObjectEvent { kind, item }));
    }

    /// Queue a property event for the next event pump.
    pub fn queue_property(&self, kind: PropertyEventKind, property: u32, param: u32) {
        self.enqueue(PendingEvent::Property(RawPropertyEvent {
            kind,
            property,
            param,
        }));
    }

    /// Number of events waiting for the pump.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    // === Assertions ===

    /// Get all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.operation_log.lock().unwrap().clone()
    }

    /// Get the number of operations performed.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operation_log.lock().unwrap().len()
    }

    /// Count how many times an operation was recorded.
    #[must_use]
    pub fn count_of(&self, expected: &Operation) -> usize {
        self.operation_log
            .lock()
            .unwrap()
            .iter()
            .filter(|op| *op == expected)
            .count()
    }

    /// Index of the first occurrence of an operation.
    #[must_use]
    pub fn position_of(&self, expected: &Operation) -> Option<usize> {
        self.operation_log
            .lock()
            .unwrap()
            .iter()
            .position(|op| op == expected)
    }

    /// Assert specific operations were performed.
    ///
    /// # Panics
    ///
    /// Panics if the operations don't match.
    pub fn assert_operations(&self, expected: &[Operation]) {
        let actual = self.operations();
        assert_eq!(
            actual, expected,
            "Operation mismatch.\nExpected: {expected:#?}\nActual: {actual:#?}",
        );
    }

    /// Assert no operations were performed.
    ///
    /// # Panics
    ///
    /// Panics if any operations were recorded.
    pub fn assert_no_operations(&self) {
        let ops = self.operations();
        assert!(
            ops.is_empty(),
            "Expected no operations, but found: {ops:#?}",
        );
    }

    /// Assert a specific operation was performed at least once.
    ///
    /// # Panics
    ///
    /// Panics if the operation was not found.
    pub fn assert_contains(&self, expected: &Operation) {
        let ops = self.operations();
        assert!(
            ops.contains(expected),
            "Expected operation {expected:?} not found in: {ops:#?}",
        );
    }

    /// Assert `first` was recorded before `second`.
    ///
    /// # Panics
    ///
    /// Panics if either operation is missing or they are out of order.
    pub fn assert_before(&self, first: &Operation, second: &Operation) {
        let a = self.position_of(first);
        let b = self.position_of(second);
        match (a, b) {
            (Some(a), Some(b)) if a < b => {}
            _ => panic!(
                "Expected {first:?} before {second:?} in: {:#?}",
                self.operations()
            ),
        }
    }

    /// Clear the operation log for fresh assertions.
    pub fn clear_operations(&self) {
        self.operation_log.lock().unwrap().clear();
    }

    // === Internal Helpers ===

    fn record_op(&self, op: Operation) {
        trace!(?op, "Recording operation");
        self.operation_log.lock().unwrap().push(op);
    }

    fn check_failure(&self, point: FailPoint) -> Option<StatusCode> {
        let mut failures = self.failures.lock().unwrap();
        let idx = failures.iter().position(|f| f.point == point)?;
        let failure = failures[idx];
        if failure.once {
            failures.remove(idx);
        }
        Some(failure.status)
    }

    fn check_session(&self) -> Option<StatusCode> {
        (self.config.require_session && !self.is_session_open())
            .then_some(StatusCode::SESSION_NOT_OPEN)
    }

    fn enqueue(&self, event: PendingEvent) {
        trace!(?event, "Queueing device event");
        self.pending.lock().unwrap().push_back(event);
    }

    fn dispatch(&self, event: PendingEvent) -> Option<StatusCode> {
        // Upgrade under the lock, invoke outside it so handlers never
        // observe a held mock lock.
        match event {
            PendingEvent::State(e) => {
                let handler = upgrade(&self.state_handler)?;
                Some(handler(&e))
            }
            PendingEvent::Object(e) => {
                let handler = upgrade(&self.object_handler)?;
                Some(handler(&e))
            }
            PendingEvent::Property(e) => {
                let handler = upgrade(&self.property_handler)?;
                Some(handler(&e))
            }
        }
    }

    fn next_capture(&self) -> DirectoryItem {
        let n = self.shot_counter.fetch_add(1, Ordering::SeqCst) + 1;
        DirectoryItem {
            file_name: format!("IMG_{n:04}.JPG"),
            size: 4_194_304,
            is_folder: false,
            format: MOCK_JPEG_FORMAT,
            date_time: u32::try_from(chrono::Utc::now().timestamp()).unwrap_or(0),
        }
    }
}

impl CameraSdk for MockSdk {
    fn get_device_info(&self, _camera: &CameraRef) -> Result<DeviceDescriptor, StatusCode> {
        self.record_op(Operation::GetDeviceInfo);
        if let Some(status) = self.check_failure(FailPoint::GetDeviceInfo) {
            return Err(status);
        }
        Ok(self.descriptor.clone())
    }

    fn open_session(&self, _camera: &CameraRef) -> StatusCode {
        self.record_op(Operation::OpenSession);
        if let Some(status) = self.check_failure(FailPoint::OpenSession) {
            return status;
        }
        self.session_open.store(true, Ordering::SeqCst);
        StatusCode::OK
    }

    fn close_session(&self, _camera: &CameraRef) -> StatusCode {
        self.record_op(Operation::CloseSession);
        if let Some(status) = self.check_failure(FailPoint::CloseSession) {
            return status;
        }
        self.session_open.store(false, Ordering::SeqCst);
        StatusCode::OK
    }

    fn send_command(&self, _camera: &CameraRef, command: CameraCommand, param: i32) -> StatusCode {
        self.record_op(Operation::SendCommand { command, param });
        if let Some(status) = self
            .check_failure(FailPoint::Command(command))
            .or_else(|| self.check_session())
        {
            return status;
        }

        if command == CameraCommand::TakePicture && self.config.auto_capture_events {
            let item = self.next_capture();
            self.queue_object(ObjectEventKind::DirItemRequestTransfer, Some(item));
        }
        StatusCode::OK
    }

    fn send_status_command(
        &self,
        _camera: &CameraRef,
        command: StatusCommand,
        param: i32,
    ) -> StatusCode {
        self.record_op(Operation::SendStatusCommand { command, param });
        self.check_failure(FailPoint::StatusCommand(command))
            .or_else(|| self.check_session())
            .unwrap_or(StatusCode::OK)
    }

    fn get_property_data(
        &self,
        _camera: &CameraRef,
        property: PropertyId,
        _param: i32,
    ) -> Result<Vec<u8>, StatusCode> {
        self.record_op(Operation::GetProperty { property });
        if let Some(status) = self
            .check_failure(FailPoint::GetProperty(property))
            .or_else(|| self.check_session())
        {
            return Err(status);
        }
        self.property_bytes(property)
            .ok_or(StatusCode::NOT_SUPPORTED)
    }

    fn set_property_data(
        &self,
        _camera: &CameraRef,
        property: PropertyId,
        _param: i32,
        data: &[u8],
    ) -> StatusCode {
        self.record_op(Operation::SetProperty {
            property,
            data: data.to_vec(),
        });
        if let Some(status) = self
            .check_failure(FailPoint::SetProperty(property))
            .or_else(|| self.check_session())
        {
            return status;
        }

        self.properties
            .lock()
            .unwrap()
            .insert(property, data.to_vec());
        if self.config.echo_property_events {
            self.queue_property(PropertyEventKind::PropertyChanged, property.code(), 0);
        }
        StatusCode::OK
    }

    fn set_capacity(&self, _camera: &CameraRef, capacity: Capacity) -> StatusCode {
        self.record_op(Operation::SetCapacity { capacity });
        self.check_failure(FailPoint::SetCapacity)
            .or_else(|| self.check_session())
            .unwrap_or(StatusCode::OK)
    }

    fn set_state_handler(
        &self,
        _camera: &CameraRef,
        _mask: u32,
        handler: Option<Weak<StateHandler>>,
    ) -> StatusCode {
        self.record_op(Operation::SetStateHandler {
            registered: handler.is_some(),
        });
        if let Some(status) = self.check_failure(FailPoint::RegisterHandler) {
            return status;
        }
        *self.state_handler.lock().unwrap() = handler;
        StatusCode::OK
    }

    fn set_object_handler(
        &self,
        _camera: &CameraRef,
        _mask: u32,
        handler: Option<Weak<ObjectHandler>>,
    ) -> StatusCode {
        self.record_op(Operation::SetObjectHandler {
            registered: handler.is_some(),
        });
        if let Some(status) = self.check_failure(FailPoint::RegisterHandler) {
            return status;
        }
        *self.object_handler.lock().unwrap() = handler;
        StatusCode::OK
    }

    fn set_property_handler(
        &self,
        _camera: &CameraRef,
        _mask: u32,
        handler: Option<Weak<PropertyHandler>>,
    ) -> StatusCode {
        self.record_op(Operation::SetPropertyHandler {
            registered: handler.is_some(),
        });
        if let Some(status) = self.check_failure(FailPoint::RegisterHandler) {
            return status;
        }
        *self.property_handler.lock().unwrap() = handler;
        StatusCode::OK
    }

    fn get_event(&self) -> StatusCode {
        self.record_op(Operation::GetEvent);
        let drained: Vec<PendingEvent> = self.pending.lock().unwrap().drain(..).collect();
        for event in drained {
            self.dispatch(event);
        }
        StatusCode::OK
    }

    fn release(&self, _camera: CameraRef) {
        self.record_op(Operation::Release);
        self.release_count.fetch_add(1, Ordering::SeqCst);
    }
}

fn upgrade<H: ?Sized>(slot: &Mutex<Option<Weak<H>>>) -> Option<Arc<H>> {
    slot.lock().unwrap().as_ref().and_then(Weak::upgrade)
}

fn live<H: ?Sized>(slot: &Mutex<Option<Weak<H>>>) -> bool {
    upgrade(slot).is_some()
}

fn encode_int(value: u32) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

fn encode_text(value: &str) -> Vec<u8> {
    let mut bytes = value.as_bytes().to_vec();
    bytes.push(0);
    bytes
}
