//! Save location, live view and capture flows.

use std::sync::{Arc, Mutex};

use camsession::device::mock::{FailPoint, MOCK_JPEG_FORMAT, Operation};
use camsession::device::{CameraCommand, Capacity, PropertyId, StatusCode};
use camsession::{CameraError, EvfOutputDevice, PictureInfo, SaveDestination};

use crate::common::{connect, connect_quiet};

#[test]
fn test_capture_to_device_scenario() {
    let (sdk, mut camera) = connect();
    assert_eq!(camera.description(), "Canon EOS R6");

    let pictures: Arc<Mutex<Vec<PictureInfo>>> = Arc::default();
    let sink = Arc::clone(&pictures);
    camera
        .events()
        .on_picture_taken(move |info| sink.lock().unwrap().push(info.clone()));

    camera.save_to_device().unwrap();
    camera.take_picture().unwrap();
    sdk.assert_contains(&Operation::SendCommand {
        command: CameraCommand::TakePicture,
        param: 0,
    });

    // Nothing arrives until the event pump runs.
    assert!(pictures.lock().unwrap().is_empty());
    camera.process_events().unwrap();

    let pictures = pictures.lock().unwrap();
    assert_eq!(pictures.len(), 1);
    assert_eq!(pictures[0].file_name, "IMG_0001.JPG");
    assert_eq!(pictures[0].format, MOCK_JPEG_FORMAT);
    assert_eq!(pictures[0].host_path, None);
}

#[test]
fn test_capture_to_host_reports_target_path() {
    let (_sdk, mut camera) = connect();
    let tmp = tempfile::tempdir().unwrap();
    let (_id, rx) = camera.events().object().subscribe_channel();

    camera.save_to_host(tmp.path()).unwrap();
    camera.take_picture().unwrap();
    camera.take_picture().unwrap();
    camera.process_events().unwrap();

    let names: Vec<_> = rx
        .try_iter()
        .filter_map(|event| match event {
            camsession::ObjectEvent::PictureTaken(info) => info.host_path,
            _ => None,
        })
        .collect();
    assert_eq!(
        names,
        vec![tmp.path().join("IMG_0001.JPG"), tmp.path().join("IMG_0002.JPG")]
    );
}

#[test]
fn test_save_location_sequence() {
    let (sdk, mut camera) = connect_quiet();
    let tmp = tempfile::tempdir().unwrap();

    camera.save_to_host(tmp.path()).unwrap();
    assert_eq!(camera.save_destination().unwrap(), SaveDestination::Host);
    assert_eq!(camera.picture_path(), Some(tmp.path()));

    camera.save_to_device().unwrap();
    assert_eq!(camera.save_destination().unwrap(), SaveDestination::Device);
    assert_eq!(camera.picture_path(), None);

    // Capacity is reset on every change, whatever the destination.
    assert_eq!(
        sdk.count_of(&Operation::SetCapacity {
            capacity: Capacity::UNLIMITED
        }),
        2
    );
}

#[test]
fn test_save_to_host_blank_path() {
    let (sdk, mut camera) = connect_quiet();
    sdk.clear_operations();

    assert!(matches!(
        camera.save_to_host(""),
        Err(CameraError::InvalidArgument(_))
    ));
    assert!(matches!(
        camera.save_to_host("   "),
        Err(CameraError::InvalidArgument(_))
    ));
    assert_eq!(camera.picture_path(), None);
    sdk.assert_no_operations();
}

#[test]
fn test_save_to_host_creates_missing_directory() {
    let (_sdk, mut camera) = connect_quiet();
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("a").join("b");
    assert!(!target.exists());

    camera.save_to_host(&target).unwrap();

    assert!(target.is_dir());
    assert_eq!(camera.picture_path(), Some(target.as_path()));
}

#[test]
fn test_save_to_property_failure_skips_lock() {
    let (sdk, mut camera) = connect_quiet();
    sdk.fail_next(
        FailPoint::SetProperty(PropertyId::SaveTo),
        StatusCode::INTERNAL_ERROR,
    );

    let err = camera.save_to_device().unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_ERROR));
    assert_eq!(
        sdk.count_of(&Operation::SetCapacity {
            capacity: Capacity::UNLIMITED
        }),
        0
    );
}

#[test]
fn test_live_view_round_trip_keeps_screen_output() {
    let (sdk, mut camera) = connect_quiet();
    sdk.preset_integer(
        PropertyId::EvfOutputDevice,
        EvfOutputDevice::TFT.bits(),
    );

    camera.start_live_view().unwrap();
    assert!(camera.is_evf_mode().unwrap());
    assert_eq!(
        camera.evf_output_device().unwrap(),
        EvfOutputDevice::TFT | EvfOutputDevice::PC
    );

    camera.stop_live_view().unwrap();
    assert!(camera.is_evf_mode().unwrap());
    assert_eq!(camera.evf_output_device().unwrap(), EvfOutputDevice::TFT);
}

#[test]
fn test_live_view_events_and_frames() {
    let (sdk, mut camera) = connect_quiet();
    let (_id, rx) = camera.events().property().subscribe_channel();

    camera.start_live_view().unwrap();
    for n in 0..3 {
        sdk.queue_property(
            camsession::device::PropertyEventKind::PropertyChanged,
            PropertyId::EvfHistogramStatus.code(),
            n,
        );
    }
    camera.process_events().unwrap();
    camera.stop_live_view().unwrap();

    let events: Vec<_> = rx.try_iter().collect();
    assert!(matches!(
        events.first(),
        Some(camsession::PropertyEvent::LiveViewStarted)
    ));
    assert!(matches!(
        events.last(),
        Some(camsession::PropertyEvent::LiveViewStopped)
    ));
    assert_eq!(camera.events().frames_received(), 3);
}

#[test]
fn test_live_view_unknown_bits_preserved() {
    let (sdk, mut camera) = connect_quiet();
    sdk.preset_integer(PropertyId::EvfOutputDevice, 0x10 | 0x02);

    camera.stop_live_view().unwrap();
    assert_eq!(sdk.integer(PropertyId::EvfOutputDevice), Some(0x10));
}

#[test]
fn test_take_picture_reports_device_failure() {
    let (sdk, mut camera) = connect();
    sdk.fail_next(
        FailPoint::Command(CameraCommand::TakePicture),
        StatusCode::TAKE_PICTURE_NO_CARD_NG,
    );

    let err = camera.take_picture().unwrap_err();
    assert!(matches!(err, CameraError::DeviceOperationFailed { .. }));
    assert_eq!(err.suggestion(), Some("Insert a memory card or save to host"));

    // Resource stays usable.
    camera.take_picture().unwrap();
}
