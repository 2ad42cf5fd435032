//! Settings files applied to a camera.

use camsession::device::PropertyId;
use camsession::{CameraError, SaveDestination, Settings};

use crate::common::connect_quiet;

#[test]
fn test_settings_file_applied() {
    let tmp = tempfile::tempdir().unwrap();
    let pictures = tmp.path().join("tethered");
    let config = tmp.path().join("config.toml");
    std::fs::write(
        &config,
        format!(
            "save_to = \"host\"\npicture_dir = {:?}\nowner_name = \"Studio 4\"\n",
            pictures.display().to_string()
        ),
    )
    .unwrap();

    let settings = Settings::load(Some(config.as_path())).unwrap();
    let (sdk, mut camera) = connect_quiet();
    settings.apply(&mut camera).unwrap();

    assert_eq!(camera.owner_name().unwrap(), "Studio 4");
    assert_eq!(camera.save_destination().unwrap(), SaveDestination::Host);
    assert_eq!(camera.picture_path(), Some(pictures.as_path()));
    assert_eq!(sdk.integer(PropertyId::SaveTo), Some(2));
}

#[test]
fn test_oversize_default_is_rejected_on_apply() {
    let settings = Settings {
        owner_name: Some("o".repeat(40)),
        ..Settings::default()
    };
    let (_sdk, mut camera) = connect_quiet();

    let err = settings.apply(&mut camera).unwrap_err();
    assert!(matches!(err, CameraError::ValueTooLarge { max: 32, .. }));
}

#[test]
fn test_malformed_file() {
    let tmp = tempfile::tempdir().unwrap();
    let config = tmp.path().join("config.toml");
    std::fs::write(&config, "save_to = [1, 2]").unwrap();

    let err = Settings::load(Some(config.as_path())).unwrap_err();
    assert!(matches!(err, CameraError::ConfigParse(_)));
}
