//! End-to-end tests for the configuration bootstrap.
//!
//! Each test roots a [`StoreLayout`] in a fresh temporary directory so the
//! real `/etc/sensible` is never touched.  The last group runs the `sensible`
//! binary itself to check exit codes and that fatal errors leave the document
//! alone.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use sensible_core::{decode, encode, PluginKind, Settings};
use sensible_daemon::infrastructure::storage::{ConfigError, ConfigStore, StoreLayout};
use sensible_daemon::infrastructure::token::UuidTokenProvider;
use tempfile::TempDir;

fn store_in(tmp: &TempDir) -> ConfigStore {
    ConfigStore::new(StoreLayout::rooted(tmp.path()), Box::new(UuidTokenProvider))
}

fn write_settings(path: &Path, settings: &Settings) -> String {
    let text = encode(settings).expect("encode");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, &text).unwrap();
    text
}

fn run_binary(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sensible"))
        .arg("--root")
        .arg(root)
        .args(args)
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "info")
        .output()
        .expect("spawn sensible")
}

// ── Cold start ───────────────────────────────────────────────────────────────

#[test]
fn test_cold_start_creates_layout_and_default_document() {
    // Arrange
    let tmp = TempDir::new().unwrap();
    let mut store = store_in(&tmp);

    // Act
    let settings = store.initialize().expect("initialize");

    // Assert
    let layout = store.layout();
    assert!(layout.script_dir.is_dir());
    assert!(layout.log_dir.is_dir());
    assert!(layout.settings_file.is_file());
    assert_eq!(settings.mqtt.hostname, "127.0.0.1");
    assert_eq!(settings.mqtt.port, "1883");
    assert_eq!(settings.discovery.prefix, "homeassistant");
    assert!(!settings.api.enabled);
    assert_eq!(settings.api.port, 8090);
    assert!(!settings.api.token.is_empty());
    assert_eq!(settings.plugins.len(), 1);
    assert_eq!(settings.plugins[0].sensor_id, "heartbeat");
    assert_eq!(settings.plugins[0].kind, PluginKind::Internal);
}

#[test]
fn test_cold_start_document_decodes_to_the_loaded_value() {
    let tmp = TempDir::new().unwrap();
    let mut store = store_in(&tmp);

    let loaded = store.initialize().unwrap();

    let on_disk = decode(&fs::read_to_string(&store.layout().settings_file).unwrap()).unwrap();
    assert_eq!(*loaded, on_disk);
}

#[cfg(unix)]
#[test]
fn test_default_document_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    let mut store = store_in(&tmp);
    store.initialize().unwrap();

    let mode = fs::metadata(&store.layout().settings_file)
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

// ── Warm start ───────────────────────────────────────────────────────────────

#[test]
fn test_second_initialize_yields_equal_value_and_keeps_document() {
    // Arrange
    let tmp = TempDir::new().unwrap();
    let first = store_in(&tmp).initialize().unwrap();
    let path = StoreLayout::rooted(tmp.path()).settings_file;
    let before = fs::read(&path).unwrap();

    // Act
    let second = store_in(&tmp).initialize().unwrap();

    // Assert
    assert_eq!(*first, *second);
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_user_document_is_loaded_unchanged() {
    // Arrange: a document a user has edited by hand.
    let tmp = TempDir::new().unwrap();
    let layout = StoreLayout::rooted(tmp.path());
    let mut user = Settings::builtin("user-token", chrono::Utc::now());
    user.mqtt.hostname = "broker.lan".to_string();
    user.mqtt.username = "sensor".to_string();
    user.api.enabled = true;
    user.api.port = 9000;
    let text = write_settings(&layout.settings_file, &user);

    // Act
    let loaded = store_in(&tmp).initialize().unwrap();

    // Assert
    assert_eq!(loaded.mqtt.hostname, "broker.lan");
    assert_eq!(loaded.api.token, "user-token");
    assert_eq!(loaded.api.port, 9000);
    assert_eq!(fs::read_to_string(&layout.settings_file).unwrap(), text);
}

// ── Reset ────────────────────────────────────────────────────────────────────

#[test]
fn test_backup_then_regenerate_keeps_old_document_and_draws_new_token() {
    // Arrange
    let tmp = TempDir::new().unwrap();
    let mut store = store_in(&tmp);
    let original = store.initialize().unwrap();
    let original_text = fs::read_to_string(&store.layout().settings_file).unwrap();

    // Act
    assert!(store.backup_document().unwrap());
    store.generate_defaults().unwrap();
    let fresh = store.load().unwrap();

    // Assert
    let backup = fs::read_to_string(store.layout().backup_file()).unwrap();
    assert_eq!(backup, original_text);
    assert_ne!(fresh.api.token, original.api.token);
}

#[test]
fn test_backup_without_document_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    let store = store_in(&tmp);

    assert!(!store.backup_document().unwrap());
    assert!(!store.layout().backup_file().exists());
}

#[test]
fn test_generate_defaults_draws_a_fresh_token_each_call() {
    let tmp = TempDir::new().unwrap();
    let store = store_in(&tmp);

    let first = store.generate_defaults().unwrap();
    let second = store.generate_defaults().unwrap();

    assert_ne!(first.api.token, second.api.token);
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[test]
fn test_truncated_document_is_a_decode_error_and_is_not_rewritten() {
    // Arrange
    let tmp = TempDir::new().unwrap();
    let layout = StoreLayout::rooted(tmp.path());
    fs::create_dir_all(layout.settings_file.parent().unwrap()).unwrap();
    let truncated = "general:\n  loglevel: info\nmqtt:\n";
    fs::write(&layout.settings_file, truncated).unwrap();

    // Act
    let err = store_in(&tmp).initialize().unwrap_err();

    // Assert
    assert!(err.is_decode(), "expected decode error, got {err}");
    assert_eq!(fs::read_to_string(&layout.settings_file).unwrap(), truncated);
}

#[test]
fn test_duplicate_sensor_id_names_the_second_plugin() {
    // Arrange
    let tmp = TempDir::new().unwrap();
    let layout = StoreLayout::rooted(tmp.path());
    let mut settings = Settings::builtin("t", chrono::Utc::now());
    settings.plugins.push(settings.plugins[0].clone());
    write_settings(&layout.settings_file, &settings);

    // Act
    let err = store_in(&tmp).initialize().unwrap_err();

    // Assert
    assert_eq!(err.field(), Some("plugins[1].sensorid"));
    assert!(err.to_string().contains("duplicate SensorId"));
}

#[test]
fn test_file_in_place_of_log_directory_is_fatal() {
    // Arrange
    let tmp = TempDir::new().unwrap();
    let layout = StoreLayout::rooted(tmp.path());
    fs::create_dir_all(layout.log_dir.parent().unwrap()).unwrap();
    fs::write(&layout.log_dir, b"not a directory").unwrap();

    // Act
    let err = store_in(&tmp).initialize().unwrap_err();

    // Assert
    assert!(matches!(err, ConfigError::NotADirectory { ref path } if *path == layout.log_dir));
    assert!(!layout.settings_file.exists());
}

// ── Binary ───────────────────────────────────────────────────────────────────

#[test]
fn test_binary_cold_start_exits_zero() {
    let tmp = TempDir::new().unwrap();

    let output = run_binary(tmp.path(), &[]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(StoreLayout::rooted(tmp.path()).settings_file.is_file());
}

#[test]
fn test_binary_show_masks_secrets() {
    // Arrange
    let tmp = TempDir::new().unwrap();
    let layout = StoreLayout::rooted(tmp.path());
    let mut settings = Settings::builtin("very-secret-token", chrono::Utc::now());
    settings.mqtt.password = "hunter2".to_string();
    write_settings(&layout.settings_file, &settings);

    // Act
    let output = run_binary(tmp.path(), &["show"]);

    // Assert
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("heartbeat"));
    assert!(!stdout.contains("very-secret-token"));
    assert!(!stdout.contains("hunter2"));
}

#[test]
fn test_binary_corrupt_document_exits_non_zero_without_rewrite() {
    // Arrange
    let tmp = TempDir::new().unwrap();
    let layout = StoreLayout::rooted(tmp.path());
    fs::create_dir_all(layout.settings_file.parent().unwrap()).unwrap();
    let corrupt = "general:\n  loglevel: info\nmqtt:\n";
    fs::write(&layout.settings_file, corrupt).unwrap();

    // Act
    let output = run_binary(tmp.path(), &["init"]);

    // Assert
    assert!(!output.status.success());
    assert_eq!(fs::read_to_string(&layout.settings_file).unwrap(), corrupt);
}

#[test]
fn test_binary_duplicate_sensor_id_reports_field() {
    // Arrange
    let tmp = TempDir::new().unwrap();
    let layout = StoreLayout::rooted(tmp.path());
    let mut settings = Settings::builtin("t", chrono::Utc::now());
    settings.plugins.push(settings.plugins[0].clone());
    write_settings(&layout.settings_file, &settings);

    // Act
    let output = run_binary(tmp.path(), &[]);

    // Assert
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SensorId"), "stderr: {stderr}");
}

#[test]
fn test_binary_reset_writes_backup() {
    // Arrange
    let tmp = TempDir::new().unwrap();
    let layout = StoreLayout::rooted(tmp.path());
    let before = write_settings(
        &layout.settings_file,
        &Settings::builtin("old-token", chrono::Utc::now()),
    );

    // Act
    let output = run_binary(tmp.path(), &["reset"]);

    // Assert
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(layout.backup_file()).unwrap(), before);
    let fresh = decode(&fs::read_to_string(&layout.settings_file).unwrap()).unwrap();
    assert_ne!(fresh.api.token, "old-token");
}
