//! Device events reaching application subscribers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use camsession::device::mock::MOCK_JPEG_FORMAT;
use camsession::device::{
    DirectoryItem, ObjectEventKind, PropertyEventKind, PropertyId, StateEventKind, StatusCode,
};
use camsession::{ObjectEvent, PropertyEvent, StateEvent};

use crate::common::connect_quiet;

fn picture(name: &str) -> DirectoryItem {
    DirectoryItem {
        file_name: name.to_string(),
        size: 2048,
        is_folder: false,
        format: MOCK_JPEG_FORMAT,
        date_time: 1_700_000_000,
    }
}

#[test]
fn test_events_delivered_in_device_order() {
    let (sdk, mut camera) = connect_quiet();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&seen);
    camera.events().object().subscribe(move |event| {
        if let ObjectEvent::PictureTaken(info) = event {
            log.lock().unwrap().push(info.file_name.clone());
        }
    });

    for name in ["A.JPG", "B.JPG", "C.JPG"] {
        sdk.queue_object(ObjectEventKind::DirItemRequestTransfer, Some(picture(name)));
    }
    assert_eq!(sdk.pending_events(), 3);
    camera.process_events().unwrap();
    assert_eq!(sdk.pending_events(), 0);

    assert_eq!(*seen.lock().unwrap(), vec!["A.JPG", "B.JPG", "C.JPG"]);
}

#[test]
fn test_fan_out_to_every_subscriber() {
    let (sdk, camera) = connect_quiet();
    let count = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let count = Arc::clone(&count);
        camera.events().on_shutdown(move || {
            count.fetch_add(1, Ordering::SeqCst);
        });
    }

    assert_eq!(sdk.fire_state(StateEventKind::Shutdown, 0), Some(StatusCode::OK));
    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[test]
fn test_unsubscribed_handler_is_not_called() {
    let (sdk, camera) = connect_quiet();
    let count = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&count);
    let id = camera.events().on_shutdown(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert!(camera.events().state().unsubscribe(id));

    sdk.fire_state(StateEventKind::Shutdown, 0);
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn test_events_from_foreign_thread() {
    let (sdk, camera) = connect_quiet();
    let (_id, rx) = camera.events().state().subscribe_channel();

    let device = Arc::clone(&sdk);
    thread::spawn(move || {
        device.fire_state(StateEventKind::WillSoonShutDown, 30);
        device.fire_state(StateEventKind::Shutdown, 0);
    })
    .join()
    .unwrap();

    let events: Vec<StateEvent> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![
            StateEvent::WillSoonShutDown { seconds: 30 },
            StateEvent::Shutdown
        ]
    );
}

#[test]
fn test_busy_flag_follows_job_status() {
    let (sdk, camera) = connect_quiet();
    assert!(!camera.events().is_busy());

    sdk.fire_state(StateEventKind::JobStatusChanged, 1);
    assert!(camera.events().is_busy());

    sdk.fire_state(StateEventKind::JobStatusChanged, 0);
    assert!(!camera.events().is_busy());
}

#[test]
fn test_volume_and_frame_notifications() {
    let (sdk, camera) = connect_quiet();
    let volumes = Arc::new(AtomicUsize::new(0));
    let frames = Arc::new(AtomicUsize::new(0));

    let v = Arc::clone(&volumes);
    camera.events().on_volume_info_changed(move |info| {
        assert_eq!(info.property, PropertyId::AvailableShots);
        v.fetch_add(1, Ordering::SeqCst);
    });
    let f = Arc::clone(&frames);
    camera.events().on_live_view_update(move |_| {
        f.fetch_add(1, Ordering::SeqCst);
    });

    sdk.fire_property(
        PropertyEventKind::PropertyChanged,
        PropertyId::AvailableShots.code(),
        0,
    );
    sdk.fire_property(
        PropertyEventKind::PropertyChanged,
        PropertyId::EvfZoom.code(),
        0,
    );
    sdk.fire_property(
        PropertyEventKind::PropertyChanged,
        PropertyId::IsoSpeed.code(),
        0,
    );

    assert_eq!(volumes.load(Ordering::SeqCst), 1);
    assert_eq!(frames.load(Ordering::SeqCst), 1);
}

#[test]
fn test_property_change_echo() {
    let sdk = camsession::device::mock::MockSdk::arc();
    let mut camera = camsession::Camera::new(sdk.clone(), sdk.camera_ref()).unwrap();
    let (_id, rx) = camera.events().property().subscribe_channel();

    camera.set_copyright("(c) 2024").unwrap();
    camera.process_events().unwrap();

    assert!(rx.try_iter().any(|event| event
        == PropertyEvent::Changed {
            property: Some(PropertyId::Copyright),
            code: PropertyId::Copyright.code(),
        }));
}
