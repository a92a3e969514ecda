//! Filesystem locations used by the settings store.
//!
//! | Item              | Path                                |
//! |-------------------|-------------------------------------|
//! | Settings document | `/etc/sensible/settings.yaml`       |
//! | Backup            | `/etc/sensible/settings.yaml.bkp`   |
//! | Script directory  | `/etc/sensible/scripts/`            |
//! | Log directory     | `/var/log/sensible/`                |
//!
//! The paths are compiled in.  They cannot come from the document itself, since
//! the document's own location would then be circular.  The one override is a
//! root prefix (`--root` / `SENSIBLE_ROOT`) that re-bases all four together,
//! which is what tests and chroot-style installs use.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "/etc/sensible/settings.yaml";
pub const BACKUP_SUFFIX: &str = ".bkp";
pub const SCRIPT_DIR: &str = "/etc/sensible/scripts/";
pub const LOG_DIR: &str = "/var/log/sensible/";

/// Resolved locations of the document and the directories the daemon needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    pub settings_file: PathBuf,
    pub script_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl StoreLayout {
    /// The system paths re-based under `root`.  A root of `/` yields the
    /// compiled-in paths.
    ///
    /// Trailing separators are dropped, so a file occupying a directory path
    /// is reported as such rather than as an I/O error.
    pub fn rooted(root: &Path) -> Self {
        Self {
            settings_file: rebase(root, SETTINGS_FILE),
            script_dir: rebase(root, SCRIPT_DIR),
            log_dir: rebase(root, LOG_DIR),
        }
    }

    /// The backup path: the document path with `.bkp` appended.
    pub fn backup_file(&self) -> PathBuf {
        let mut name: OsString = self.settings_file.clone().into_os_string();
        name.push(BACKUP_SUFFIX);
        PathBuf::from(name)
    }
}

fn rebase(root: &Path, absolute: &str) -> PathBuf {
    let absolute = Path::new(absolute);
    let relative = absolute.strip_prefix("/").unwrap_or(absolute);
    root.join(relative.components().collect::<PathBuf>())
}
