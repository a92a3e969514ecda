//! Plugin runtime state, kept outside the configuration value.
//!
//! The settings document records a `lastexecuted` instant per plugin, but the
//! execution engine updates that instant every time a plugin runs.  Writing
//! back into [`Settings`] would make the configuration mutable after startup,
//! so the engine instead seeds a [`PluginRuntimeTable`] from the loaded
//! settings and owns it from then on.  The configuration stays a read-only
//! snapshot.
//!
//! # Monotonic timestamps
//!
//! [`PluginRuntimeTable::mark_executed`] refuses an instant earlier than the
//! one already recorded, so `last_executed` never moves backwards for a
//! plugin during the daemon's lifetime.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::settings::error::SettingsError;
use crate::settings::model::{PluginSettings, Settings};

/// Live execution state for one plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginRuntime {
    pub sensor_id: String,
    pub last_executed: DateTime<Utc>,
}

/// Execution state for every configured plugin, keyed by sensor id.
#[derive(Debug, Default, Clone)]
pub struct PluginRuntimeTable {
    entries: HashMap<String, PluginRuntime>,
}

impl PluginRuntimeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the table from the `lastexecuted` snapshot of each plugin.
    pub fn from_settings(settings: &Settings) -> Self {
        let entries = settings
            .plugins
            .iter()
            .map(|p| {
                (
                    p.sensor_id.clone(),
                    PluginRuntime {
                        sensor_id: p.sensor_id.clone(),
                        last_executed: p.last_executed,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, sensor_id: &str) -> Option<&PluginRuntime> {
        self.entries.get(sensor_id)
    }

    pub fn last_executed(&self, sensor_id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(sensor_id).map(|e| e.last_executed)
    }

    /// Records that `sensor_id` ran at `at`.
    ///
    /// # Errors
    ///
    /// - [`SettingsError::UnknownSensor`] if the plugin is not in the table.
    /// - [`SettingsError::NonMonotonicTimestamp`] if `at` is earlier than the
    ///   recorded instant.
    pub fn mark_executed(
        &mut self,
        sensor_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), SettingsError> {
        let entry = self
            .entries
            .get_mut(sensor_id)
            .ok_or_else(|| SettingsError::UnknownSensor(sensor_id.to_string()))?;

        if at < entry.last_executed {
            return Err(SettingsError::NonMonotonicTimestamp {
                sensor_id: sensor_id.to_string(),
                recorded: entry.last_executed,
                attempted: at,
            });
        }

        trace!(sensor_id, %at, "plugin executed");
        entry.last_executed = at;
        Ok(())
    }

    /// Whether `plugin` may run at `now`, i.e. at least `period` seconds have
    /// passed since its last execution.  Plugins missing from the table are
    /// always due.
    pub fn is_due(&self, plugin: &PluginSettings, now: DateTime<Utc>) -> bool {
        let Some(last) = self.last_executed(&plugin.sensor_id) else {
            return true;
        };
        match chrono::Duration::from_std(plugin.period_duration()) {
            Ok(period) => now - last >= period,
            Err(_) => false,
        }
    }

    /// The plugins of `settings` that are due at `now`, in document order.
    pub fn due_plugins<'a>(
        &self,
        settings: &'a Settings,
        now: DateTime<Utc>,
    ) -> Vec<&'a PluginSettings> {
        settings
            .plugins
            .iter()
            .filter(|p| self.is_due(p, now))
            .collect()
    }
}
