//! Construction, session and teardown of the camera resource.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use camsession::device::mock::{FailPoint, MockSdk, Operation};
use camsession::device::{StateEventKind, StatusCode, StatusCommand};
use camsession::{Camera, CameraError, SessionState};

use crate::common::connect;

const LOCK: Operation = Operation::SendStatusCommand {
    command: StatusCommand::UiLock,
    param: 0,
};
const UNLOCK: Operation = Operation::SendStatusCommand {
    command: StatusCommand::UiUnlock,
    param: 0,
};

#[test]
fn test_session_opens_once() {
    let (sdk, mut camera) = connect();

    camera.battery_level().unwrap();
    camera.artist().unwrap();
    camera.take_picture().unwrap();

    assert_eq!(sdk.count_of(&Operation::OpenSession), 1);
    assert_eq!(camera.session_state(), SessionState::Open);
}

#[test]
fn test_failed_open_is_retried_on_next_call() {
    let (sdk, mut camera) = connect();
    sdk.fail_next(FailPoint::OpenSession, StatusCode::DEVICE_BUSY);

    let err = camera.take_picture().unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::DEVICE_BUSY));
    assert!(err.is_user_recoverable());
    assert_eq!(camera.session_state(), SessionState::Closed);

    camera.take_picture().unwrap();
    assert_eq!(sdk.count_of(&Operation::OpenSession), 2);
}

#[test]
fn test_dispose_closes_session_before_release() {
    let (sdk, mut camera) = connect();
    camera.take_picture().unwrap();

    camera.dispose();

    sdk.assert_before(&Operation::CloseSession, &Operation::Release);
    assert!(!sdk.is_session_open());
    assert_eq!(sdk.release_count(), 1);
}

#[test]
fn test_repeated_dispose_and_drop_release_once() {
    let (sdk, mut camera) = connect();
    camera.take_picture().unwrap();

    camera.dispose();
    camera.dispose();
    drop(camera);

    assert_eq!(sdk.release_count(), 1);
    assert_eq!(sdk.count_of(&Operation::CloseSession), 1);
}

#[test]
fn test_drop_runs_teardown() {
    let (sdk, mut camera) = connect();
    camera.battery_level().unwrap();
    drop(camera);

    sdk.assert_before(&Operation::CloseSession, &Operation::Release);
    assert_eq!(sdk.handlers_registered(), (false, false, false));
}

#[test]
fn test_failed_close_does_not_block_release() {
    let (sdk, mut camera) = connect();
    camera.battery_level().unwrap();
    sdk.fail_always(FailPoint::CloseSession, StatusCode::COMM_DISCONNECTED);

    camera.dispose();
    assert_eq!(sdk.release_count(), 1);
    assert!(camera.is_disposed());
}

#[test]
fn test_disposed_camera_fails_fast() {
    let (sdk, mut camera) = connect();
    camera.dispose();
    sdk.clear_operations();

    assert!(matches!(camera.take_picture(), Err(CameraError::ResourceDisposed)));
    assert!(matches!(camera.battery_level(), Err(CameraError::ResourceDisposed)));
    assert!(matches!(camera.save_to_device(), Err(CameraError::ResourceDisposed)));
    assert!(matches!(
        camera.run_locked(|_| Ok(())),
        Err(CameraError::ResourceDisposed)
    ));
    sdk.assert_no_operations();
}

#[test]
fn test_events_stop_after_dispose() {
    let (sdk, mut camera) = connect();
    camera.dispose();

    assert_eq!(sdk.fire_state(StateEventKind::Shutdown, 0), None);
}

#[test]
fn test_dispose_while_events_fire() {
    let (sdk, mut camera) = connect();
    camera.battery_level().unwrap();

    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    camera.events().on_shutdown(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let firing = Arc::clone(&sdk);
    let pump = thread::spawn(move || {
        let mut fired = 0usize;
        while firing.fire_state(StateEventKind::Shutdown, 0).is_some() {
            fired += 1;
        }
        fired
    });

    while delivered.load(Ordering::SeqCst) == 0 {
        thread::yield_now();
    }
    camera.dispose();

    let fired = pump.join().expect("event thread must not panic");
    let settled = delivered.load(Ordering::SeqCst);
    assert_eq!(settled, fired);

    assert_eq!(sdk.fire_state(StateEventKind::Shutdown, 0), None);
    assert_eq!(delivered.load(Ordering::SeqCst), settled);
    assert_eq!(sdk.release_count(), 1);
    assert!(camera.is_disposed());
}

#[test]
fn test_run_locked_unlocks_on_error() {
    let (sdk, mut camera) = connect();
    camera.battery_level().unwrap();
    sdk.clear_operations();

    let result: camsession::Result<()> = camera.run_locked(|_| {
        Err(CameraError::InvalidArgument("scripted failure".to_string()))
    });

    assert!(matches!(result, Err(CameraError::InvalidArgument(_))));
    sdk.assert_operations(&[LOCK, UNLOCK]);
}

#[test]
fn test_run_locked_unlock_failure_is_not_reported() {
    let (sdk, mut camera) = connect();
    camera.battery_level().unwrap();
    sdk.fail_next(
        FailPoint::StatusCommand(StatusCommand::UiUnlock),
        StatusCode::INTERNAL_ERROR,
    );

    let value = camera.run_locked(|_| Ok(7)).unwrap();
    assert_eq!(value, 7);
}

#[test]
fn test_lock_failure_skips_action() {
    let (sdk, mut camera) = connect();
    camera.battery_level().unwrap();
    sdk.fail_next(
        FailPoint::StatusCommand(StatusCommand::UiLock),
        StatusCode::DEVICE_BUSY,
    );

    let mut ran = false;
    let err = camera
        .run_locked(|_| {
            ran = true;
            Ok(())
        })
        .unwrap_err();

    assert!(!ran);
    assert_eq!(err.status(), Some(StatusCode::DEVICE_BUSY));
    assert_eq!(sdk.count_of(&UNLOCK), 0);
}

#[test]
fn test_connect_fails_when_registration_fails() {
    let sdk = MockSdk::arc();
    sdk.fail_always(FailPoint::RegisterHandler, StatusCode::INTERNAL_ERROR);

    let err = Camera::new(sdk.clone(), sdk.camera_ref()).unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_ERROR));
    assert_eq!(sdk.release_count(), 1);
}
