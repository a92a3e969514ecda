//! YAML-backed settings store for the daemon.
//!
//! [`ConfigStore`] owns the path layout, the token provider used for fresh API
//! credentials, and the settings value most recently loaded from disk.
//!
//! # Bootstrap sequence
//!
//! ```text
//! initialize()
//!  ├─ ensure_directories()        -- script dir + log dir, fatal on collision
//!  ├─ ensure_default_document()
//!  │    ├─ absent  → generate_defaults()   (warn: writing default config)
//!  │    └─ present → nothing
//!  └─ load()                      -- decode + validate, replace held value
//! ```
//!
//! Every operation is synchronous.  The store is used once, on the main thread,
//! before any other part of the daemon starts; after that the loaded value is
//! shared read-only behind an `Arc`.
//!
//! # Writes
//!
//! Documents are written in place, not through a temporary file and rename.  A
//! crash mid-write can leave a truncated document; [`ConfigStore::backup_document`]
//! exists so a known-good copy can be taken before a regeneration.  On Unix
//! the document is created with mode `0600` because it holds the API token and
//! the broker password.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use sensible_core::{decode, encode, Settings, SettingsError};
use tracing::{debug, info, warn};

use crate::infrastructure::fs::{copy_file, create_directory};
use crate::infrastructure::storage::error::ConfigError;
use crate::infrastructure::storage::layout::StoreLayout;
use crate::infrastructure::token::TokenProvider;

/// Owner of the on-disk settings document and the in-memory value.
pub struct ConfigStore {
    layout: StoreLayout,
    tokens: Box<dyn TokenProvider>,
    current: Option<Arc<Settings>>,
}

impl ConfigStore {
    /// Creates a store over `layout`.  No I/O happens until an operation is
    /// called.
    pub fn new(layout: StoreLayout, tokens: Box<dyn TokenProvider>) -> Self {
        Self {
            layout,
            tokens,
            current: None,
        }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// The value held after the last successful [`ConfigStore::load`].
    pub fn settings(&self) -> Option<&Arc<Settings>> {
        self.current.as_ref()
    }

    /// Ensures the layout exists, writes the default document if needed, and
    /// loads the document.
    ///
    /// Calling it again re-reads the same document and yields an equal value;
    /// an existing document is never rewritten.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from the steps above.  None of them are recoverable.
    pub fn initialize(&mut self) -> Result<Arc<Settings>, ConfigError> {
        self.ensure_directories()?;
        debug!(path = %self.layout.settings_file.display(), "opening configuration file");
        self.ensure_default_document()?;
        self.load()
    }

    /// Creates the script directory and the log directory if missing.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotADirectory`] if a file occupies either path, or
    /// [`ConfigError::Io`] if creation fails.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        info!("creating default folders");
        for dir in [&self.layout.script_dir, &self.layout.log_dir] {
            if create_directory(dir)? {
                debug!(path = %dir.display(), "created directory");
            }
        }
        Ok(())
    }

    /// Writes the default document if none exists.  Returns `true` if it wrote
    /// one.  An existing document is neither read nor modified.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the document's presence cannot be determined or
    /// the default cannot be written.
    pub fn ensure_default_document(&self) -> Result<bool, ConfigError> {
        if self.document_exists()? {
            return Ok(false);
        }
        warn!(
            path = %self.layout.settings_file.display(),
            "config file not found, writing default config"
        );
        self.generate_defaults()?;
        Ok(true)
    }

    /// Writes the built-in default document, replacing any existing one, and
    /// returns the value written.
    ///
    /// A new API token is drawn on every call, so regenerating invalidates
    /// credentials held by existing API clients.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Document`] if encoding fails or [`ConfigError::Io`] if
    /// the file cannot be written.
    pub fn generate_defaults(&self) -> Result<Settings, ConfigError> {
        let path = &self.layout.settings_file;
        let settings = Settings::builtin(self.tokens.new_token(), Utc::now());
        let text = encode(&settings).map_err(|e| ConfigError::document(path, e))?;
        write_document(path, text.as_bytes())?;
        info!(path = %path.display(), "default configuration written");
        Ok(settings)
    }

    /// Copies the document to `<document>.bkp`, overwriting an older backup.
    /// Returns `false` without doing anything if there is no document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the copy fails.
    pub fn backup_document(&self) -> Result<bool, ConfigError> {
        if !self.document_exists()? {
            debug!("no configuration file to back up");
            return Ok(false);
        }
        let backup = self.layout.backup_file();
        copy_file(&self.layout.settings_file, &backup)?;
        info!(path = %backup.display(), "configuration backed up");
        Ok(true)
    }

    /// Reads, decodes and validates the document, then replaces the held value.
    ///
    /// On error the previously held value is kept.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the document cannot be read (including when it
    /// is absent) and [`ConfigError::Document`] if it is not UTF-8 text, does
    /// not decode, or breaks a schema invariant.
    pub fn load(&mut self) -> Result<Arc<Settings>, ConfigError> {
        let path = &self.layout.settings_file;
        let bytes = fs::read(path).map_err(|e| ConfigError::io(path, e))?;
        let text = String::from_utf8(bytes).map_err(|e| {
            ConfigError::document(path, SettingsError::Decode(format!("not UTF-8 text: {e}")))
        })?;
        let settings = Arc::new(decode(&text).map_err(|e| ConfigError::document(path, e))?);
        info!(
            path = %path.display(),
            plugins = settings.plugins.len(),
            "configuration loaded"
        );
        self.current = Some(Arc::clone(&settings));
        Ok(settings)
    }

    fn document_exists(&self) -> Result<bool, ConfigError> {
        let path = &self.layout.settings_file;
        path.try_exists().map_err(|e| ConfigError::io(path, e))
    }
}

/// Writes `bytes` to `path`, creating the parent directory if needed.
fn write_document(path: &Path, bytes: &[u8]) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        create_directory(dir)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| ConfigError::io(path, e))?;
    file.write_all(bytes).map_err(|e| ConfigError::io(path, e))?;
    file.flush().map_err(|e| ConfigError::io(path, e))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::token::MockTokenProvider;
    use tempfile::TempDir;

    /// A store rooted in a fresh temp dir whose token provider returns
    /// `token-1`, `token-2`, ... on successive calls.
    fn store_in(tmp: &TempDir) -> ConfigStore {
        let mut tokens = MockTokenProvider::new();
        let mut n = 0;
        tokens.expect_new_token().returning(move || {
            n += 1;
            format!("token-{n}")
        });
        ConfigStore::new(StoreLayout::rooted(tmp.path()), Box::new(tokens))
    }

    #[test]
    fn test_new_store_holds_no_settings_and_does_no_io() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        assert!(store.settings().is_none());
        assert!(!store.layout().script_dir.exists());
    }

    #[test]
    fn test_ensure_directories_creates_script_and_log_dirs() {
        // Arrange
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        // Act
        store.ensure_directories().expect("ensure dirs");

        // Assert
        assert!(store.layout().script_dir.is_dir());
        assert!(store.layout().log_dir.is_dir());
    }

    #[test]
    fn test_ensure_directories_fails_when_file_blocks_log_dir() {
        // Arrange
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let log_dir = store.layout().log_dir.clone();
        fs::create_dir_all(log_dir.parent().unwrap()).unwrap();
        fs::write(&log_dir, "in the way").unwrap();

        // Act
        let err = store.ensure_directories().unwrap_err();

        // Assert
        assert!(matches!(err, ConfigError::NotADirectory { .. }));
    }

    #[test]
    fn test_ensure_default_document_writes_when_absent() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        let wrote = store.ensure_default_document().expect("ensure doc");

        assert!(wrote);
        let text = fs::read_to_string(&store.layout().settings_file).unwrap();
        assert!(text.contains("token-1"));
    }

    #[test]
    fn test_ensure_default_document_never_overwrites() {
        // Arrange: a document that is not even valid YAML, to prove it is not read.
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let path = store.layout().settings_file.clone();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{{ not yaml").unwrap();

        // Act
        let wrote = store.ensure_default_document().expect("ensure doc");

        // Assert
        assert!(!wrote);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{{ not yaml");
    }

    #[test]
    fn test_generate_defaults_replaces_document_with_new_token() {
        // Arrange
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.generate_defaults().unwrap();

        // Act
        let second = store.generate_defaults().unwrap();

        // Assert
        assert_eq!(second.api.token, "token-2");
        let text = fs::read_to_string(&store.layout().settings_file).unwrap();
        assert!(text.contains("token-2"));
        assert!(!text.contains("token-1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_generated_document_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.generate_defaults().unwrap();

        let mode = fs::metadata(&store.layout().settings_file)
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_backup_document_without_document_is_noop() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        assert!(!store.backup_document().unwrap());
        assert!(!store.layout().backup_file().exists());
    }

    #[test]
    fn test_backup_document_copies_bytes() {
        // Arrange
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.generate_defaults().unwrap();
        let original = fs::read(&store.layout().settings_file).unwrap();

        // Act
        let backed_up = store.backup_document().unwrap();

        // Assert
        assert!(backed_up);
        assert_eq!(fs::read(store.layout().backup_file()).unwrap(), original);
        assert_eq!(fs::read(&store.layout().settings_file).unwrap(), original);
    }

    #[test]
    fn test_load_without_document_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);

        let err = store.load().unwrap_err();

        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(store.settings().is_none());
    }

    #[test]
    fn test_load_invalid_document_keeps_previous_value() {
        // Arrange
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let first = store.initialize().unwrap();
        fs::write(&store.layout().settings_file, "mqtt:").unwrap();

        // Act
        let err = store.load().unwrap_err();

        // Assert
        assert!(err.is_decode());
        assert!(matches!(
            &err,
            ConfigError::Document { source: SettingsError::Decode(_), .. }
        ));
        assert_eq!(**store.settings().unwrap(), *first);
    }

    #[test]
    fn test_load_non_utf8_document_is_decode_error() {
        // Arrange: a Latin-1 byte where UTF-8 expects a continuation.
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let path = store.layout().settings_file.clone();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"mqtt:\n  hostname: caf\xe9\n").unwrap();

        // Act
        let err = store.load().unwrap_err();

        // Assert
        assert!(err.is_decode(), "got {err}");
        assert!(store.settings().is_none());
    }

    #[test]
    fn test_initialize_on_empty_root_loads_builtin_default() {
        // Arrange
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);

        // Act
        let settings = store.initialize().expect("initialize");

        // Assert
        assert_eq!(settings.api.token, "token-1");
        assert_eq!(settings.mqtt.port, "1883");
        assert_eq!(settings.plugins[0].sensor_id, "heartbeat");
        assert!(Arc::ptr_eq(&settings, store.settings().unwrap()));
    }

    #[test]
    fn test_initialize_twice_reads_same_document() {
        // Arrange
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let first = store.initialize().unwrap();
        let bytes = fs::read(&store.layout().settings_file).unwrap();

        // Act
        let second = store.initialize().unwrap();

        // Assert
        assert_eq!(first, second);
        assert_eq!(fs::read(&store.layout().settings_file).unwrap(), bytes);
    }
}
