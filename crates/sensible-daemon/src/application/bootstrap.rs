//! Configuration bootstrap and the process-wide settings handle.
//!
//! The daemon's entry point calls [`initialize`] exactly once, before any
//! collaborator (broker client, API server, plugin engine) starts.  From then
//! on those collaborators read the value through [`settings`].  Nothing here
//! runs at module load: until `initialize` is called there is no I/O and no
//! installed value, so tests can build their own [`ConfigStore`] over a temp
//! directory instead.
//!
//! # Lifecycle
//!
//! ```text
//! main()
//!  └─ initialize(layout)
//!       ├─ already installed → return it
//!       └─ ConfigStore::initialize() → install in SETTINGS (OnceLock)
//!  └─ collaborators call settings() → Some(Arc<Settings>)
//! ```

use std::sync::{Arc, OnceLock};

use sensible_core::Settings;
use tracing::{debug, info};

use crate::infrastructure::storage::{ConfigError, ConfigStore, StoreLayout};
use crate::infrastructure::token::UuidTokenProvider;

static SETTINGS: OnceLock<Arc<Settings>> = OnceLock::new();

/// Bootstraps configuration from `layout` and installs it process-wide.
///
/// # Errors
///
/// Any [`ConfigError`] raised by [`ConfigStore::initialize`].  The caller is
/// expected to treat it as fatal.
pub fn initialize(layout: StoreLayout) -> Result<Arc<Settings>, ConfigError> {
    initialize_with(ConfigStore::new(layout, Box::new(UuidTokenProvider)))
}

/// Like [`initialize`], with a caller-supplied store.
///
/// Idempotent per process: once a value is installed, later calls return it
/// without touching the filesystem.
///
/// # Errors
///
/// Any [`ConfigError`] raised by [`ConfigStore::initialize`].
pub fn initialize_with(mut store: ConfigStore) -> Result<Arc<Settings>, ConfigError> {
    if let Some(installed) = SETTINGS.get() {
        debug!("settings already initialized");
        return Ok(Arc::clone(installed));
    }

    let loaded = store.initialize()?;
    let installed = SETTINGS.get_or_init(|| loaded);
    Ok(Arc::clone(installed))
}

/// The installed settings, or `None` before [`initialize`] has succeeded.
pub fn settings() -> Option<Arc<Settings>> {
    SETTINGS.get().cloned()
}

/// Backs up the current document, writes a fresh default one (with a new API
/// token) and loads it into `store`.
///
/// This does not touch the process-wide handle; a running daemon picks the new
/// document up on its next start.
///
/// # Errors
///
/// Any [`ConfigError`] from the backup, write or load.
pub fn regenerate(store: &mut ConfigStore) -> Result<Arc<Settings>, ConfigError> {
    store.ensure_directories()?;
    if store.backup_document()? {
        info!(path = %store.layout().backup_file().display(), "previous configuration kept");
    }
    store.generate_defaults()?;
    store.load()
}
