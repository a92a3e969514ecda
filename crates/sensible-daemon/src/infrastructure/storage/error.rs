//! Error type for settings storage operations.

use std::path::{Path, PathBuf};

use sensible_core::SettingsError;
use thiserror::Error;

/// Error type for configuration file operations.
///
/// An absent document is never reported through this type: the bootstrap
/// sequence handles it by writing the default document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A path that must be a directory is occupied by something else.
    #[error("{path} exists but is not a directory")]
    NotADirectory { path: PathBuf },

    /// The document could not be decoded, failed validation, or could not be
    /// encoded.
    #[error("settings document {path}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: SettingsError,
    },
}

impl ConfigError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn document(path: &Path, source: SettingsError) -> Self {
        Self::Document {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The document field named by an invariant violation, if this is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Document { source, .. } => source.field(),
            _ => None,
        }
    }

    /// Whether the document was present but could not be parsed.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::Document {
                source: SettingsError::Decode(_),
                ..
            }
        )
    }
}
