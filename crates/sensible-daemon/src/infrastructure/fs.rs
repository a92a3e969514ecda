//! Small synchronous filesystem helpers.
//!
//! Both helpers fail loudly: every error carries the path it concerned.

use std::fs;
use std::io;
use std::path::Path;

use crate::infrastructure::storage::ConfigError;

/// Copies `src` to `dst`, replacing `dst` if it exists.  Returns the number of
/// bytes copied.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] naming `src` if it cannot be read, or `dst` if
/// it cannot be written.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64, ConfigError> {
    fs::copy(src, dst).map_err(|source| {
        // `fs::copy` does not say which side failed; a missing source is the
        // only case worth attributing to `src`.
        let path = if source.kind() == io::ErrorKind::NotFound && !src.exists() {
            src
        } else {
            dst
        };
        ConfigError::io(path, source)
    })
}

/// Creates `path` and any missing parents.
///
/// Returns `true` if the directory was created, `false` if it already existed.
///
/// # Errors
///
/// - [`ConfigError::NotADirectory`] if something other than a directory
///   already occupies `path`.
/// - [`ConfigError::Io`] for any other failure.
pub fn create_directory(path: &Path) -> Result<bool, ConfigError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => return Ok(false),
        Ok(_) => {
            return Err(ConfigError::NotADirectory {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(ConfigError::io(path, e)),
    }

    fs::create_dir_all(path).map_err(|source| ConfigError::io(path, source))?;
    Ok(true)
}
