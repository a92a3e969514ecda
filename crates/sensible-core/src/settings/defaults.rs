//! The built-in configuration written on a fresh host.

use chrono::{DateTime, Utc};

use crate::settings::model::{
    ApiSettings, DiscoverySettings, GeneralSettings, LogLevel, MqttSettings, PluginKind,
    PluginSettings, Settings,
};

pub const DEFAULT_LOG_FILE: &str = "/var/log/sensible/sensible.log";
pub const DEFAULT_SCRIPT_LOCATION: &str = "/etc/sensible/scripts/";
pub const DEFAULT_MQTT_HOSTNAME: &str = "127.0.0.1";
pub const DEFAULT_MQTT_PORT: &str = "1883";
pub const DEFAULT_MQTT_CLIENT_ID: &str = "sensible_mqtt_client";
pub const DEFAULT_DEVICE_NAME: &str = "sensible-demo";
pub const DEFAULT_DISCOVERY_PREFIX: &str = "homeassistant";
pub const DEFAULT_API_PORT: i64 = 8090;

impl Settings {
    /// Builds the built-in default configuration.
    ///
    /// The API token and the heartbeat's creation instant are supplied by the
    /// caller, which keeps this function free of randomness and clock reads.
    ///
    /// | Section   | Value                                                        |
    /// |-----------|--------------------------------------------------------------|
    /// | General   | `/var/log/sensible/sensible.log`, `info`, `/etc/sensible/scripts/` |
    /// | Mqtt      | `127.0.0.1`, `"1883"`, no credentials, `sensible_mqtt_client` |
    /// | Discovery | `sensible-demo`, `homeassistant`                              |
    /// | Api       | disabled, port 8090, `token`                                  |
    /// | Plugins   | one internal `heartbeat` probe running every second           |
    pub fn builtin(token: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            general: GeneralSettings {
                log_file: DEFAULT_LOG_FILE.into(),
                log_level: LogLevel::Info,
                script_location: DEFAULT_SCRIPT_LOCATION.into(),
            },
            mqtt: MqttSettings {
                hostname: DEFAULT_MQTT_HOSTNAME.to_string(),
                port: DEFAULT_MQTT_PORT.to_string(),
                username: String::new(),
                password: String::new(),
                client_id: DEFAULT_MQTT_CLIENT_ID.to_string(),
            },
            discovery: DiscoverySettings {
                device_name: DEFAULT_DEVICE_NAME.to_string(),
                prefix: DEFAULT_DISCOVERY_PREFIX.to_string(),
            },
            api: ApiSettings {
                enabled: false,
                port: DEFAULT_API_PORT,
                token: token.into(),
            },
            plugins: vec![heartbeat(now)],
        }
    }
}

fn heartbeat(now: DateTime<Utc>) -> PluginSettings {
    PluginSettings {
        name: "Heartbeat".to_string(),
        kind: PluginKind::Internal,
        sensor_id: "heartbeat".to_string(),
        script: String::new(),
        unit_of_measurement: String::new(),
        icon: "mdi:wrench-check".to_string(),
        device_class: String::new(),
        period: 1.0,
        last_executed: now,
    }
}
