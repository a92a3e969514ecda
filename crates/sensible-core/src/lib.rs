//! # sensible-core
//!
//! Shared library for the Sensible telemetry daemon containing the settings
//! schema, the built-in default configuration, invariant validation, the YAML
//! document codec, and the per-plugin runtime state table.
//!
//! This crate never touches the filesystem.  Reading and writing the document
//! at `/etc/sensible/settings.yaml` is the job of `sensible-daemon`; this crate
//! only turns text into a validated [`Settings`] value and back.
//!
//! # Architecture overview (for beginners)
//!
//! Sensible gathers readings from internal probes and shell scripts ("plugins")
//! and publishes them to an MQTT broker, where a home-automation controller
//! picks them up.  Everything the daemon needs to know at startup lives in a
//! single document:
//!
//! - **`settings`** – The typed configuration value: `General`, `Mqtt`,
//!   `Discovery`, `Api` and the ordered list of `Plugins`, plus the rules a
//!   decoded document must satisfy.
//!
//! - **`settings::codec`** – How the value travels to and from disk.  Field
//!   names are matched case-insensitively, unknown fields are ignored and
//!   missing fields take their zero value.
//!
//! - **`runtime`** – Mutable execution bookkeeping (when each plugin last ran),
//!   kept apart from the configuration so that the configuration can stay
//!   read-only once it is loaded.

pub mod runtime;
pub mod settings;

// Re-export the most-used types at the crate root so callers can write
// `sensible_core::Settings` instead of `sensible_core::settings::model::Settings`.
pub use runtime::{PluginRuntime, PluginRuntimeTable};
pub use settings::codec::{decode, encode};
pub use settings::error::SettingsError;
pub use settings::model::{
    ApiSettings, DiscoverySettings, GeneralSettings, LogLevel, MqttSettings, PluginKind,
    PluginSettings, Settings,
};
