//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Merge Semantics:
//! - Defaults → Global → Local: field-wise REPLACE, unspecified fields inherited
//! - Any → Env vars: REPLACE (explicit user override)
//!
//! Note: These tests point the store at a temp directory and write the local
//! config there; a developer's global config may still contribute fields the
//! tests do not assert on.

use std::fs;

use tempfile::TempDir;

use coursetree::application::ApplicationError;
use coursetree::config::{local_config_path, Settings};

#[test]
fn given_local_config_when_load_then_fields_override_defaults() {
    // Arrange
    let store = TempDir::new().unwrap();
    fs::write(
        local_config_path(store.path()),
        "nest_threshold_px = 35.5\nconfirm_deletes = false\n",
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(store.path())).expect("load settings");

    // Assert
    assert_eq!(settings.nest_threshold_px, 35.5);
    assert!(!settings.confirm_deletes);
    assert_eq!(settings.store_dir, store.path());
}

#[test]
fn given_local_config_naming_other_store_when_override_given_then_override_wins() {
    let store = TempDir::new().unwrap();
    fs::write(
        local_config_path(store.path()),
        "store_dir = \"/somewhere/else\"\n",
    )
    .unwrap();

    let settings = Settings::load(Some(store.path())).expect("load settings");

    assert_eq!(settings.store_dir, store.path());
}

#[test]
fn given_invalid_local_config_when_load_then_config_error() {
    let store = TempDir::new().unwrap();
    fs::write(local_config_path(store.path()), "nest_threshold_px = [").unwrap();

    let result = Settings::load(Some(store.path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_settings_when_rendered_as_toml_then_parse_back_equal() {
    let settings = Settings {
        autosave_interval_secs: 0,
        ..Settings::default()
    };

    let rendered = settings.to_toml().unwrap();
    let parsed: Settings = toml::from_str(&rendered).unwrap();

    assert_eq!(parsed, settings);
    assert!(rendered.contains("autosave_interval_secs = 0"));
}
