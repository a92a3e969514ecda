//! Error type for settings decoding, encoding and validation.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors produced while turning a document into [`crate::Settings`] (or back),
/// and while maintaining the plugin runtime table.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The document is not parseable as the expected schema.
    #[error("failed to decode settings document: {0}")]
    Decode(String),

    /// The settings value could not be rendered as YAML.
    #[error("failed to encode settings document: {0}")]
    Encode(#[from] serde_yaml::Error),

    /// A decoded document breaks one of the schema invariants.
    ///
    /// `field` is the document path of the offending field, for example
    /// `plugins[1].sensorid` or `api.port`.
    #[error("invalid value for `{field}`: {reason}")]
    InvariantViolation { field: String, reason: String },

    /// A plugin execution timestamp went backwards.
    #[error("last execution of `{sensor_id}` cannot move back from {recorded} to {attempted}")]
    NonMonotonicTimestamp {
        sensor_id: String,
        recorded: DateTime<Utc>,
        attempted: DateTime<Utc>,
    },

    /// No plugin with the given sensor id is known.
    #[error("unknown sensor id `{0}`")]
    UnknownSensor(String),
}

impl SettingsError {
    /// Builds an [`SettingsError::InvariantViolation`] from borrowed parts.
    pub fn invariant(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// The document path named by an invariant violation, if this is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvariantViolation { field, .. } => Some(field),
            _ => None,
        }
    }
}
