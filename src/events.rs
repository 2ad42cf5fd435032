//! Device event registration and application-facing broadcast channels.
//!
//! One handler per channel (state, object, property) is registered with the
//! device for the lifetime of the camera resource. The registry owns those
//! handlers; the SDK only holds `Weak` references to them. Each handler
//! translates raw codes into typed events and re-emits them synchronously,
//! in delivery order, on the thread the SDK calls from.
//!
//! Handlers never call back into the device and never touch session or
//! disposal state. Subscribers that need to issue device calls should hand
//! the event to the owner thread, e.g. through [`Broadcast::subscribe_channel`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::device::{
    ObjectEventKind, ObjectHandler, PropertyEventKind, PropertyHandler, PropertyId,
    RawObjectEvent, RawPropertyEvent, RawStateEvent, StateEventKind, StateHandler, StatusCode,
};
use crate::error::Result;
use crate::handle::NativeHandle;

/// Identifies one subscriber on one channel.
pub type SubscriptionId = u64;

type Subscriber<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// A 1:N broadcast channel.
pub struct Broadcast<E> {
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber<E>)>>,
    next_id: AtomicU64,
}

impl<E> Default for Broadcast<E> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<E> Broadcast<E> {
    /// Add a subscriber. It is called on the SDK's event thread.
    pub fn subscribe(&self, f: impl Fn(&E) + Send + Sync + 'static) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, Arc::new(f)));
        id
    }

    /// Remove a subscriber. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.lock();
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        subs.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Deliver `event` to every subscriber, in subscription order.
    pub fn emit(&self, event: &E) {
        // Snapshot so subscribers may (un)subscribe without deadlocking.
        let snapshot: Vec<Subscriber<E>> = self.lock().iter().map(|(_, f)| Arc::clone(f)).collect();
        for subscriber in snapshot {
            subscriber(event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Subscriber<E>)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Clone + Send + 'static> Broadcast<E> {
    /// Subscribe through a channel, for handing events to another thread.
    ///
    /// The queue is unbounded: a consumer that stops draining it while the
    /// device keeps firing grows it without limit. Use
    /// [`Broadcast::subscribe_bounded`] when the consumer may fall behind.
    pub fn subscribe_channel(&self) -> (SubscriptionId, Receiver<E>) {
        let (tx, rx) = mpsc::channel();
        let id = self.subscribe(move |event: &E| {
            // Receiver gone means the consumer lost interest.
            let _ = tx.send(event.clone());
        });
        (id, rx)
    }

    /// Like [`Broadcast::subscribe_channel`], but holds at most `capacity`
    /// undelivered events. Events arriving while the queue is full are
    /// dropped so the device thread never blocks.
    pub fn subscribe_bounded(&self, capacity: usize) -> (SubscriptionId, Receiver<E>) {
        let (tx, rx) = mpsc::sync_channel(capacity);
        let id = self.subscribe(move |event: &E| match tx.try_send(event.clone()) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => warn!(capacity, "Event queue full, dropping event"),
        });
        (id, rx)
    }
}

/// Metadata for a newly captured picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PictureInfo {
    pub file_name: String,
    pub size: u64,
    /// Native file format code
    pub format: u32,
    /// Capture time reported by the device
    pub captured_at: Option<DateTime<Utc>>,
    /// Where the file lands when saving to host
    pub host_path: Option<PathBuf>,
    pub received_at: DateTime<Utc>,
}

/// A live-view frame became available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveViewFrameInfo {
    /// Frame-coupled property that signalled the frame
    pub property: PropertyId,
    pub param: u32,
    /// Frames seen since the camera resource was created, starting at 1
    pub sequence: u64,
    pub received_at: DateTime<Utc>,
}

/// The storage volume's reported state changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeInfo {
    pub property: PropertyId,
    pub param: u32,
    pub received_at: DateTime<Utc>,
}

/// Events on the state channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StateEvent {
    /// The device is powering off or disconnecting.
    Shutdown,
    WillSoonShutDown { seconds: u32 },
    BusyChanged { busy: bool },
    CaptureError { code: u32 },
    InternalError { code: u32 },
    Other { kind: StateEventKind, param: u32 },
}

/// Events on the object channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ObjectEvent {
    PictureTaken(PictureInfo),
    Removed { file_name: Option<String> },
    Other { kind: ObjectEventKind },
}

/// Events on the property channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PropertyEvent {
    LiveViewStarted,
    LiveViewStopped,
    LiveViewUpdate(LiveViewFrameInfo),
    VolumeInfoChanged(VolumeInfo),
    Changed { property: Option<PropertyId>, code: u32 },
    DescChanged { property: Option<PropertyId>, code: u32 },
}

/// Application-facing side of the event registry.
///
/// Shared between the owner thread and the SDK's event thread.
#[derive(Default)]
pub struct CameraEvents {
    state: Broadcast<StateEvent>,
    object: Broadcast<ObjectEvent>,
    property: Broadcast<PropertyEvent>,
    busy: AtomicBool,
    frames: AtomicU64,
    picture_path: RwLock<Option<PathBuf>>,
}

impl CameraEvents {
    pub fn state(&self) -> &Broadcast<StateEvent> {
        &self.state
    }

    pub fn object(&self) -> &Broadcast<ObjectEvent> {
        &self.object
    }

    pub fn property(&self) -> &Broadcast<PropertyEvent> {
        &self.property
    }

    /// Whether the device last reported jobs pending, such as captures
    /// waiting for transfer. Informational only; nothing is gated on it.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Live-view frames observed so far.
    pub fn frames_received(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }

    // === Named event shortcuts ===

    pub fn on_shutdown(&self, f: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.state.subscribe(move |e| {
            if matches!(e, StateEvent::Shutdown) {
                f();
            }
        })
    }

    pub fn on_picture_taken(
        &self,
        f: impl Fn(&PictureInfo) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.object.subscribe(move |e| {
            if let ObjectEvent::PictureTaken(info) = e {
                f(info);
            }
        })
    }

    pub fn on_live_view_started(&self, f: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.property.subscribe(move |e| {
            if matches!(e, PropertyEvent::LiveViewStarted) {
                f();
            }
        })
    }

    pub fn on_live_view_stopped(&self, f: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.property.subscribe(move |e| {
            if matches!(e, PropertyEvent::LiveViewStopped) {
                f();
            }
        })
    }

    pub fn on_live_view_update(
        &self,
        f: impl Fn(&LiveViewFrameInfo) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.property.subscribe(move |e| {
            if let PropertyEvent::LiveViewUpdate(frame) = e {
                f(frame);
            }
        })
    }

    pub fn on_volume_info_changed(
        &self,
        f: impl Fn(&VolumeInfo) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.property.subscribe(move |e| {
            if let PropertyEvent::VolumeInfoChanged(info) = e {
                f(info);
            }
        })
    }

    pub(crate) fn set_picture_path(&self, path: Option<PathBuf>) {
        *self
            .picture_path
            .write()
            .unwrap_or_else(PoisonError::into_inner) = path;
    }

    pub(crate) fn picture_path(&self) -> Option<PathBuf> {
        self.picture_path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // === Translation ===

    pub(crate) fn handle_state(&self, raw: &RawStateEvent) {
        trace!(?raw, "State event");
        let event = match raw.kind {
            StateEventKind::Shutdown => {
                info!("Camera shutdown/disconnect detected");
                self.busy.store(false, Ordering::SeqCst);
                StateEvent::Shutdown
            }
            StateEventKind::WillSoonShutDown => StateEvent::WillSoonShutDown {
                seconds: raw.param,
            },
            StateEventKind::JobStatusChanged => {
                let busy = raw.param != 0;
                if self.busy.swap(busy, Ordering::SeqCst) == busy {
                    return;
                }
                debug!(busy, "Camera busy state changed");
                StateEvent::BusyChanged { busy }
            }
            StateEventKind::CaptureError => {
                warn!(code = raw.param, "Camera reported capture error");
                StateEvent::CaptureError { code: raw.param }
            }
            StateEventKind::InternalError => StateEvent::InternalError { code: raw.param },
            kind => StateEvent::Other {
                kind,
                param: raw.param,
            },
        };
        self.state.emit(&event);
    }

    pub(crate) fn handle_object(&self, raw: &RawObjectEvent) {
        trace!(kind = ?raw.kind, "Object event");
        let event = match (raw.kind, &raw.item) {
            (
                ObjectEventKind::DirItemRequestTransfer | ObjectEventKind::DirItemCreated,
                Some(item),
            ) if !item.is_folder => {
                let info = PictureInfo {
                    file_name: item.file_name.clone(),
                    size: item.size,
                    format: item.format,
                    captured_at: DateTime::from_timestamp(i64::from(item.date_time), 0),
                    host_path: self.picture_path().map(|dir| dir.join(&item.file_name)),
                    received_at: Utc::now(),
                };
                info!(file = %info.file_name, size = info.size, "Picture taken");
                ObjectEvent::PictureTaken(info)
            }
            (ObjectEventKind::DirItemRemoved, item) => ObjectEvent::Removed {
                file_name: item.as_ref().map(|i| i.file_name.clone()),
            },
            (kind, _) => ObjectEvent::Other { kind },
        };
        self.object.emit(&event);
    }

    pub(crate) fn handle_property(&self, raw: &RawPropertyEvent) {
        trace!(?raw, "Property event");
        let property = PropertyId::from_code(raw.property);
        let event = match (raw.kind, property) {
            (PropertyEventKind::PropertyChanged, Some(id)) if id.is_frame_coupled() => {
                let sequence = self.frames.fetch_add(1, Ordering::SeqCst) + 1;
                PropertyEvent::LiveViewUpdate(LiveViewFrameInfo {
                    property: id,
                    param: raw.param,
                    sequence,
                    received_at: Utc::now(),
                })
            }
            (PropertyEventKind::PropertyChanged, Some(id)) if id.is_volume_related() => {
                PropertyEvent::VolumeInfoChanged(VolumeInfo {
                    property: id,
                    param: raw.param,
                    received_at: Utc::now(),
                })
            }
            (PropertyEventKind::PropertyDescChanged, property) => PropertyEvent::DescChanged {
                property,
                code: raw.property,
            },
            (_, property) => PropertyEvent::Changed {
                property,
                code: raw.property,
            },
        };
        self.property.emit(&event);
    }
}

/// Owns the three device-level handlers for one camera resource.
pub struct EventRegistry {
    events: Arc<CameraEvents>,
    state_handler: Arc<StateHandler>,
    object_handler: Arc<ObjectHandler>,
    property_handler: Arc<PropertyHandler>,
    registered: bool,
}

impl EventRegistry {
    /// Register one "all events" handler per channel with the device.
    ///
    /// On failure, channels registered so far are cleared again before the
    /// error is returned.
    pub fn register(handle: &NativeHandle) -> Result<Self> {
        let events = Arc::new(CameraEvents::default());

        let sink = Arc::clone(&events);
        let state_handler: Arc<StateHandler> = Arc::new(move |raw: &RawStateEvent| {
            sink.handle_state(raw);
            StatusCode::OK
        });
        let sink = Arc::clone(&events);
        let object_handler: Arc<ObjectHandler> = Arc::new(move |raw: &RawObjectEvent| {
            sink.handle_object(raw);
            StatusCode::OK
        });
        let sink = Arc::clone(&events);
        let property_handler: Arc<PropertyHandler> = Arc::new(move |raw: &RawPropertyEvent| {
            sink.handle_property(raw);
            StatusCode::OK
        });

        let mut registry = Self {
            events,
            state_handler,
            object_handler,
            property_handler,
            registered: true,
        };

        if let Err(e) = registry.register_all(handle) {
            registry.unregister(handle);
            return Err(e);
        }
        debug!("Event handlers registered");
        Ok(registry)
    }

    fn register_all(&self, handle: &NativeHandle) -> Result<()> {
        let camera = handle.camera()?;
        let sdk = handle.sdk();

        let status = sdk.set_state_handler(
            camera,
            StateEventKind::ALL,
            Some(Arc::downgrade(&self.state_handler)),
        );
        NativeHandle::assert(status, "Failed to register state event handler")?;

        let status = sdk.set_object_handler(
            camera,
            ObjectEventKind::ALL,
            Some(Arc::downgrade(&self.object_handler)),
        );
        NativeHandle::assert(status, "Failed to register object event handler")?;

        let status = sdk.set_property_handler(
            camera,
            PropertyEventKind::ALL,
            Some(Arc::downgrade(&self.property_handler)),
        );
        NativeHandle::assert(status, "Failed to register property event handler")
    }

    /// Application-facing channels.
    pub fn events(&self) -> &Arc<CameraEvents> {
        &self.events
    }

    pub const fn is_registered(&self) -> bool {
        self.registered
    }

    /// Clear all device registrations. Runs once; failures are ignored.
    pub(crate) fn unregister(&mut self, handle: &NativeHandle) {
        if !self.registered {
            return;
        }
        self.registered = false;
        self.events.busy.store(false, Ordering::SeqCst);

        let Ok(camera) = handle.camera() else {
            return;
        };
        let sdk = handle.sdk();
        let results = [
            sdk.set_state_handler(camera, StateEventKind::ALL, None),
            sdk.set_object_handler(camera, ObjectEventKind::ALL, None),
            sdk.set_property_handler(camera, PropertyEventKind::ALL, None),
        ];
        for status in results.iter().filter(|s| !s.is_success()) {
            warn!(status = %status, "Event handler unregistration failed, ignoring");
        }
        debug!("Event handlers unregistered");
    }
}
