//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use camsession::Camera;
use camsession::device::mock::{MockConfig, MockSdk};
use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Mock body with event simulation enabled, plus a camera over it.
#[must_use]
pub fn connect() -> (Arc<MockSdk>, Camera) {
    init_test_logging();
    let sdk = MockSdk::arc();
    let camera = Camera::new(sdk.clone(), sdk.camera_ref()).expect("camera should connect");
    (sdk, camera)
}

/// Mock body that never generates events on its own.
#[must_use]
pub fn connect_quiet() -> (Arc<MockSdk>, Camera) {
    init_test_logging();
    let sdk = Arc::new(MockSdk::eos().with_config(MockConfig::quiet()));
    let camera = Camera::new(sdk.clone(), sdk.camera_ref()).expect("camera should connect");
    (sdk, camera)
}
