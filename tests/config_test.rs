//! Integration tests for Settings config loading with layered precedence.
//!
//! Note: These tests run without a global config (temp directories only),
//! so they effectively test local config merging with defaults.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use stockavl::application::services::DuplicatePolicy;
use stockavl::application::ApplicationError;
use stockavl::config::{local_config_path, Settings};

// ============================================================
// Settings::load() local config
// ============================================================

#[test]
fn given_no_local_config_when_load_then_uses_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    // Assert
    assert!(settings.data_file.ends_with("inventory.json"));
}

#[test]
fn given_local_config_when_load_then_overrides_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let config = r#"
data_file = "/srv/stock/inventory.json"
on_duplicate = "abort"
autosave = false
"#;
    fs::write(local_config_path(dir.path()), config).unwrap();

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings.data_file, PathBuf::from("/srv/stock/inventory.json"));
    assert_eq!(settings.on_duplicate, DuplicatePolicy::Abort);
    assert!(!settings.autosave);
}

#[test]
fn given_relative_data_file_when_load_then_resolved_against_config_dir() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        "data_file = \"data/inventory.json\"\n",
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings.data_file, dir.path().join("data/inventory.json"));
}

#[test]
fn given_partial_local_config_when_load_then_other_fields_keep_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "on_duplicate = \"abort\"\n").unwrap();

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings.on_duplicate, DuplicatePolicy::Abort);
    assert!(settings.data_file.ends_with("inventory.json"));
}

#[test]
fn given_invalid_toml_when_load_then_config_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "on_duplicate = [\n").unwrap();

    // Act
    let result = Settings::load(Some(dir.path()));

    // Assert
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_unknown_policy_when_load_then_config_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "on_duplicate = \"merge\"\n").unwrap();

    // Act
    let result = Settings::load(Some(dir.path()));

    // Assert
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

// ============================================================
// Template
// ============================================================

#[test]
fn given_template_when_parsed_then_yields_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), Settings::template()).unwrap();

    // Act
    let settings = Settings::load(Some(dir.path())).expect("template should parse");

    // Assert: every key in the template is commented out
    assert_eq!(settings.on_duplicate, DuplicatePolicy::Skip);
    assert!(settings.autosave);
}

// ============================================================
// Settings::load() without a config dir
// ============================================================

#[test]
fn given_local_config_in_cwd_when_load_without_dir_then_applied() {
    // Arrange: the file `config init` writes when no -C is given
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".stockavl.toml"),
        "autosave = false\non_duplicate = \"abort\"\n",
    )
    .unwrap();
    let original_dir = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    // Act
    let result = Settings::load(None);
    std::env::set_current_dir(original_dir).unwrap();

    // Assert
    let settings = result.expect("load settings");
    assert!(!settings.autosave, "local config in cwd should be read");
    assert_eq!(settings.on_duplicate, DuplicatePolicy::Abort);
}
