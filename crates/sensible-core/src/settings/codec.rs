//! YAML codec for the settings document.
//!
//! # Decoding pipeline
//!
//! ```text
//! text ──► serde_yaml::Value ──► normalize ──► Settings ──► validate
//! ```
//!
//! - **parse**: any YAML syntax error is a [`SettingsError::Decode`].
//! - **normalize**: every mapping key is lowercased so `LogLevel`, `loglevel`
//!   and `LOGLEVEL` all address the same field.  The top level must be a
//!   mapping, and a section key that is present with no value (the shape a
//!   file truncated right after `mqtt:` has) is rejected.  Inside a section a
//!   key with no value (`password:`) is dropped, so it reads as missing.  A
//!   numeric `mqtt.port` is accepted and turned into text.
//! - **typed decode**: unknown keys are ignored and missing keys take their
//!   zero value (see [`crate::settings::model`]).
//! - **validate**: [`Settings::validate`] runs before the value is returned.

use serde_yaml::{Mapping, Value};

use crate::settings::error::SettingsError;
use crate::settings::model::Settings;

/// Top-level keys of the document, in the order they are written.
pub const SECTIONS: [&str; 5] = ["general", "mqtt", "discovery", "api", "plugins"];

/// Renders `settings` as a YAML document.
///
/// # Errors
///
/// Returns [`SettingsError::Encode`] if serialization fails.
pub fn encode(settings: &Settings) -> Result<String, SettingsError> {
    Ok(serde_yaml::to_string(settings)?)
}

/// Parses and validates a YAML settings document.
///
/// # Errors
///
/// Returns [`SettingsError::Decode`] when the text is not a settings document
/// and [`SettingsError::InvariantViolation`] when it decodes but breaks a
/// schema invariant.
///
/// # Examples
///
/// ```rust
/// use sensible_core::decode;
///
/// let settings = decode("Mqtt:\n  Hostname: broker.local\n  Port: 1883\n").unwrap();
/// assert_eq!(settings.mqtt.hostname, "broker.local");
/// assert_eq!(settings.mqtt.port, "1883");
/// assert!(settings.plugins.is_empty());
/// ```
pub fn decode(text: &str) -> Result<Settings, SettingsError> {
    let raw: Value =
        serde_yaml::from_str(text).map_err(|e| SettingsError::Decode(e.to_string()))?;
    let normalized = normalize_document(raw)?;
    let settings: Settings =
        serde_yaml::from_value(normalized).map_err(|e| SettingsError::Decode(e.to_string()))?;
    settings.validate()?;
    Ok(settings)
}

fn normalize_document(raw: Value) -> Result<Value, SettingsError> {
    let mut root = match lowercase_keys(raw, true)? {
        Value::Mapping(map) => map,
        Value::Null => return Err(SettingsError::Decode("document is empty".to_string())),
        other => {
            return Err(SettingsError::Decode(format!(
                "expected a mapping at the top level, found {}",
                kind_of(&other)
            )))
        }
    };

    for section in SECTIONS {
        if let Some(Value::Null) = root.get(section) {
            return Err(SettingsError::Decode(format!(
                "section `{section}` is present but empty"
            )));
        }
    }

    if let Some(Value::Mapping(mqtt)) = root.get_mut("mqtt") {
        if let Some(Value::Number(n)) = mqtt.get("port") {
            let port = n.to_string();
            mqtt.insert(Value::String("port".to_string()), Value::String(port));
        }
    }

    Ok(Value::Mapping(root))
}

/// Recursively lowercases string keys of every mapping in `value`.
///
/// Below the top level, entries whose value is null are dropped.
fn lowercase_keys(value: Value, top_level: bool) -> Result<Value, SettingsError> {
    match value {
        Value::Mapping(map) => {
            let mut out = Mapping::with_capacity(map.len());
            for (key, val) in map {
                let key = match key {
                    Value::String(s) => Value::String(s.to_ascii_lowercase()),
                    other => other,
                };
                if out.contains_key(&key) {
                    return Err(SettingsError::Decode(format!(
                        "duplicate key `{}` (keys are case-insensitive)",
                        key.as_str().unwrap_or("?")
                    )));
                }
                if val.is_null() && !top_level {
                    continue;
                }
                out.insert(key, lowercase_keys(val, false)?);
            }
            Ok(Value::Mapping(out))
        }
        Value::Sequence(items) => Ok(Value::Sequence(
            items
                .into_iter()
                .map(|item| lowercase_keys(item, false))
                .collect::<Result<_, _>>()?,
        )),
        other => Ok(other),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
