//! Settings schema types.
//!
//! The on-disk document is a YAML mapping with the top-level keys `general`,
//! `mqtt`, `discovery`, `api` and `plugins`:
//!
//! ```yaml
//! general:
//!   logfile: /var/log/sensible/sensible.log
//!   loglevel: info
//!   scriptlocation: /etc/sensible/scripts/
//! mqtt:
//!   hostname: 127.0.0.1
//!   port: "1883"
//!   username: ""
//!   password: ""
//!   clientid: sensible_mqtt_client
//! discovery:
//!   devicename: sensible-demo
//!   prefix: homeassistant
//! api:
//!   enabled: false
//!   port: 8090
//!   token: 8f14e45f-ceea-467a-9575-d0b3f0b5a1c2
//! plugins:
//!   - name: Heartbeat
//!     kind: internal
//!     sensorid: heartbeat
//!     script: ""
//!     unitofmeasurement: ""
//!     icon: mdi:wrench-check
//!     deviceclass: ""
//!     period: 1
//!     lastexecuted: 2024-01-01T00:00:00Z
//! ```
//!
//! # Zero values
//!
//! Every record is annotated with `#[serde(default)]`, and the `Default`
//! implementations below produce *zero values* (empty strings, `false`, `0`),
//! not the built-in configuration.  A document that omits a field therefore
//! decodes with that field empty, and validation decides whether the result is
//! acceptable.  The built-in configuration lives in
//! [`crate::settings::defaults`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder written in place of secrets by the `redacted` helpers.
pub const REDACTED: &str = "********";

// ── Aggregate ─────────────────────────────────────────────────────────────────

/// The complete daemon configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub mqtt: MqttSettings,
    pub discovery: DiscoverySettings,
    pub api: ApiSettings,
    pub plugins: Vec<PluginSettings>,
}

impl Settings {
    /// Looks up a plugin by its sensor id.
    pub fn plugin(&self, sensor_id: &str) -> Option<&PluginSettings> {
        self.plugins.iter().find(|p| p.sensor_id == sensor_id)
    }

    /// Returns a copy with the API token and broker password masked.
    ///
    /// Used whenever the configuration is echoed to a terminal or a log.
    pub fn redacted(&self) -> Self {
        Self {
            mqtt: self.mqtt.redacted(),
            api: self.api.redacted(),
            ..self.clone()
        }
    }
}

// ── Sections ──────────────────────────────────────────────────────────────────

/// Process-level settings: logging and the script root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// File the daemon appends log lines to.
    #[serde(rename = "logfile")]
    pub log_file: PathBuf,
    /// Minimum severity emitted.
    #[serde(rename = "loglevel")]
    pub log_level: LogLevel,
    /// Directory script plugins are resolved against.
    #[serde(rename = "scriptlocation")]
    pub script_location: PathBuf,
}

/// Broker connection settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttSettings {
    pub hostname: String,
    /// Broker port, kept as text so existing documents keep their shape.
    /// Use [`MqttSettings::port_number`] for the numeric value.
    pub port: String,
    pub username: String,
    pub password: String,
    #[serde(rename = "clientid")]
    pub client_id: String,
}

impl MqttSettings {
    /// Parses the textual port, accepting only `1..=65535`.
    pub fn port_number(&self) -> Option<u16> {
        match self.port.trim().parse::<u16>() {
            Ok(0) | Err(_) => None,
            Ok(port) => Some(port),
        }
    }

    fn redacted(&self) -> Self {
        Self {
            password: mask(&self.password),
            ..self.clone()
        }
    }
}

/// Settings for the controller's discovery protocol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Logical device name exposed to the controller.
    #[serde(rename = "devicename")]
    pub device_name: String,
    /// Topic prefix for discovery messages.
    pub prefix: String,
}

/// Control API settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub enabled: bool,
    /// Listening port.  Stored wide so an out-of-range value in the document
    /// reaches validation instead of failing inside the decoder.
    pub port: i64,
    /// Bearer credential for the API.
    pub token: String,
}

impl ApiSettings {
    /// The port as a `u16` when it lies in `1..=65535`.
    pub fn port_number(&self) -> Option<u16> {
        u16::try_from(self.port).ok().filter(|p| *p != 0)
    }

    /// Returns a copy with the token masked.
    pub fn redacted(&self) -> Self {
        Self {
            token: mask(&self.token),
            ..self.clone()
        }
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        REDACTED.to_string()
    }
}

// ── Plugins ───────────────────────────────────────────────────────────────────

/// A sensor producer invoked by the daemon's execution engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    /// Human label.
    pub name: String,
    /// Dispatch target.
    pub kind: PluginKind,
    /// Stable key used on the wire; unique across the list.
    #[serde(rename = "sensorid")]
    pub sensor_id: String,
    /// Script file name, empty for internal plugins.
    pub script: String,
    #[serde(rename = "unitofmeasurement")]
    pub unit_of_measurement: String,
    pub icon: String,
    #[serde(rename = "deviceclass")]
    pub device_class: String,
    /// Minimum interval between executions, in seconds.
    pub period: f64,
    /// Last execution instant as of when the document was written.
    ///
    /// This is a snapshot.  The live value is tracked by
    /// [`crate::runtime::PluginRuntimeTable`].
    #[serde(rename = "lastexecuted")]
    pub last_executed: DateTime<Utc>,
}

impl PluginSettings {
    /// The execution period as a [`Duration`].  Negative or non-finite
    /// periods (which validation rejects) collapse to zero.
    pub fn period_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.period).unwrap_or(Duration::ZERO)
    }

    /// Full path of the script for a script plugin, `None` for internal ones.
    pub fn script_path(&self, script_location: &Path) -> Option<PathBuf> {
        match self.kind {
            PluginKind::Script if !self.script.is_empty() => {
                Some(script_location.join(&self.script))
            }
            _ => None,
        }
    }
}

/// Dispatch target of a plugin.
///
/// Values outside the enumerated set are kept as [`PluginKind::Unknown`] so
/// that validation can reject them with the offending field named, rather than
/// the decoder failing with a generic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PluginKind {
    /// A probe compiled into the daemon.
    Internal,
    /// A shell script under `General.ScriptLocation`.
    Script,
    /// Anything else found in a document, including the empty string.
    Unknown(String),
}

impl PluginKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Internal => "internal",
            Self::Script => "script",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl Default for PluginKind {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl From<String> for PluginKind {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "internal" => Self::Internal,
            "script" => Self::Script,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<PluginKind> for String {
    fn from(kind: PluginKind) -> Self {
        match kind {
            PluginKind::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Log level ─────────────────────────────────────────────────────────────────

/// Minimum severity the daemon emits.
///
/// Parsed case-insensitively.  A missing `loglevel` decodes as
/// [`LogLevel::Info`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        // `warning` is a common spelling in hand-edited files.
        let wanted = if wanted == "warning" { "warn".to_string() } else { wanted };
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown log level `{s}`, \
                     expected one of trace, debug, info, warn, error, fatal"
                )
            })
    }
}

// `Self::Error` would name the variant here, so the error type is spelled out.
impl TryFrom<String> for LogLevel {
    type Error = String;

    /// A blank value decodes like a missing key.
    fn try_from(raw: String) -> Result<Self, String> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        raw.parse()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
