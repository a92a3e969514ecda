//! Invariant checks applied to every decoded document.
//!
//! Validation stops at the first violation and reports it as
//! [`SettingsError::InvariantViolation`] with the document path of the field,
//! e.g. `plugins[1].sensorid`.  Paths use the lowercase key spelling written
//! by the codec so a user can find the line in their file.

use std::collections::HashSet;

use tracing::debug;

use crate::settings::error::SettingsError;
use crate::settings::model::{PluginKind, PluginSettings, Settings};

impl Settings {
    /// Checks the schema invariants.
    ///
    /// - `mqtt.port` parses as a port in `1..=65535`.
    /// - `api.port` is in `1..=65535` when `api.enabled` is true.
    /// - every plugin has a recognised `kind`, a non-empty `sensorid` and a
    ///   non-negative, finite `period`.
    /// - script plugins name a script; internal plugins do not.
    /// - `sensorid` values are unique across the list.
    ///
    /// # Errors
    ///
    /// Returns the first [`SettingsError::InvariantViolation`] found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.mqtt.port_number().is_none() {
            return Err(SettingsError::invariant(
                "mqtt.port",
                format!("`{}` is not a port in 1..=65535", self.mqtt.port),
            ));
        }

        if self.api.enabled && self.api.port_number().is_none() {
            return Err(SettingsError::invariant(
                "api.port",
                format!("{} is not a port in 1..=65535", self.api.port),
            ));
        }

        let mut seen = HashSet::with_capacity(self.plugins.len());
        for (index, plugin) in self.plugins.iter().enumerate() {
            validate_plugin(index, plugin)?;
            if !seen.insert(plugin.sensor_id.as_str()) {
                return Err(SettingsError::invariant(
                    plugin_field(index, "sensorid"),
                    format!("duplicate SensorId `{}`", plugin.sensor_id),
                ));
            }
        }

        debug!(plugins = self.plugins.len(), "settings validation passed");
        Ok(())
    }
}

fn validate_plugin(index: usize, plugin: &PluginSettings) -> Result<(), SettingsError> {
    match &plugin.kind {
        PluginKind::Unknown(raw) => {
            return Err(SettingsError::invariant(
                plugin_field(index, "kind"),
                format!("`{raw}` is not one of internal, script"),
            ));
        }
        PluginKind::Script if plugin.script.trim().is_empty() => {
            return Err(SettingsError::invariant(
                plugin_field(index, "script"),
                "script plugins must name a script",
            ));
        }
        PluginKind::Internal if !plugin.script.is_empty() => {
            return Err(SettingsError::invariant(
                plugin_field(index, "script"),
                "internal plugins must not name a script",
            ));
        }
        _ => {}
    }

    if plugin.sensor_id.trim().is_empty() {
        return Err(SettingsError::invariant(
            plugin_field(index, "sensorid"),
            "SensorId must not be empty",
        ));
    }

    if !plugin.period.is_finite() || plugin.period < 0.0 {
        return Err(SettingsError::invariant(
            plugin_field(index, "period"),
            format!("{} is not a non-negative number of seconds", plugin.period),
        ));
    }

    Ok(())
}

fn plugin_field(index: usize, key: &str) -> String {
    format!("plugins[{index}].{key}")
}
