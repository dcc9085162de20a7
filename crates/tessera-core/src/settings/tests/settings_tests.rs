#![cfg(test)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use crate::config::ConfigId;
use crate::settings::{KernelSettings, SettingsError, SettingsFormat};

#[test]
fn test_format_from_extension() {
    assert_eq!(SettingsFormat::from_path(Path::new("k.json")), Some(SettingsFormat::Json));
    assert_eq!(SettingsFormat::from_path(Path::new("k.JSON")), Some(SettingsFormat::Json));
    assert_eq!(SettingsFormat::from_path(Path::new("k.ini")), None);
    assert_eq!(SettingsFormat::from_path(Path::new("settings")), None);
}

#[test]
fn test_parse_json() {
    let text = r#"{
        "kernel_name": "edge",
        "store_root": "/var/tessera/store",
        "repositories": ["/var/tessera/repo"],
        "start": ["app/1.0.0"]
    }"#;
    let settings = KernelSettings::parse(text, SettingsFormat::Json).unwrap();
    assert_eq!(settings.kernel_name.as_deref(), Some("edge"));
    assert_eq!(settings.store_root, Some(PathBuf::from("/var/tessera/store")));
    assert_eq!(settings.start, vec!["app/1.0.0".parse::<ConfigId>().unwrap()]);
}

#[test]
fn test_missing_fields_default() {
    let settings = KernelSettings::parse("{}", SettingsFormat::Json).unwrap();
    assert_eq!(settings, KernelSettings::default());
}

#[test]
fn test_bad_config_id_is_parse_error() {
    let err = KernelSettings::parse(r#"{"start": ["no-version"]}"#, SettingsFormat::Json).unwrap_err();
    assert!(matches!(err, SettingsError::Parse { format: "json", .. }));
}

#[test]
fn test_unknown_field_rejected() {
    assert!(KernelSettings::parse(r#"{"store": "x"}"#, SettingsFormat::Json).is_err());
}

#[cfg(feature = "toml-config")]
#[test]
fn test_load_toml_resolves_relative_paths() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("tessera.toml");
    fs::write(
        &path,
        "kernel_name = \"main\"\nstore_root = \"store\"\nrepositories = [\"repo\", \"/abs/repo\"]\n",
    )
    .unwrap();
    let settings = KernelSettings::load(&path).unwrap();
    assert_eq!(settings.store_root, Some(temp_dir.path().join("store")));
    assert_eq!(
        settings.repositories,
        vec![temp_dir.path().join("repo"), PathBuf::from("/abs/repo")]
    );
}

#[cfg(feature = "yaml-config")]
#[test]
fn test_load_yaml() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("tessera.yml");
    fs::write(&path, "start:\n  - base/2.1.0\n  - app/1.0.0\n").unwrap();
    let settings = KernelSettings::load(&path).unwrap();
    assert_eq!(settings.start.len(), 2);
    assert_eq!(settings.start[0].name(), "base");
}

#[test]
fn test_load_unsupported_extension() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("tessera.ini");
    fs::write(&path, "x=1").unwrap();
    assert!(matches!(KernelSettings::load(&path), Err(SettingsError::UnsupportedFormat(_))));
}

#[test]
fn test_load_missing_file() {
    let temp_dir = tempdir().unwrap();
    let err = KernelSettings::load(&temp_dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SettingsError::Read { .. }));
}
