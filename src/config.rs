use crate::converter::{ReportConfig, StaticReporting};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
///
/// Must run before any other thread exists; both binaries call it first
/// thing in a synchronous `main`.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for (key, value) in parse_dotenv(&content) {
        // Only set if not already set (env vars take precedence)
        if std::env::var(key).is_err() {
            // SAFETY: called from a synchronous main before any thread is spawned
            unsafe { std::env::set_var(key, value) };
        }
    }
}

/// Key/value pairs of a .env file. Comments and lines without '=' are
/// skipped, surrounding quotes are removed.
fn parse_dotenv(content: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Split at the first '='
        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim();
            let mut value = line[eq_pos + 1..].trim();

            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }
            pairs.push((key, value));
        }
    }
    pairs
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub mqtt: MqttConfig,
    pub bridge: BridgeConfig,
    pub reporting: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Prefix of every topic the bridge subscribes and publishes to.
    pub base_topic: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mqtt: MqttConfig {
                broker_host: "localhost".to_string(),
                broker_port: 1883,
                client_id: "zigbee-capability-bridge".to_string(),
                username: None,
                password: None,
            },
            bridge: BridgeConfig {
                base_topic: "zigbee2mqtt".to_string(),
            },
            reporting: ReportConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source, starting from defaults.
    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        // MQTT configuration
        if let Some(host) = var("MQTT_BROKER_HOST") {
            config.mqtt.broker_host = host;
        }
        if let Some(port) = var("MQTT_BROKER_PORT")
            && let Ok(p) = port.parse()
        {
            config.mqtt.broker_port = p;
        }
        if let Some(client_id) = var("MQTT_CLIENT_ID") {
            config.mqtt.client_id = client_id;
        }
        if let Some(username) = var("MQTT_USERNAME") {
            config.mqtt.username = Some(username);
        }
        if let Some(password) = var("MQTT_PASSWORD") {
            config.mqtt.password = Some(password);
        }

        if let Some(base_topic) = var("BRIDGE_BASE_TOPIC") {
            config.bridge.base_topic = base_topic.trim_end_matches('/').to_string();
        }

        // Reporting defaults
        if let Some(min) = var("REPORTING_MIN_INTERVAL")
            && let Ok(m) = min.parse()
        {
            config.reporting.min_interval = m;
        }
        if let Some(max) = var("REPORTING_MAX_INTERVAL")
            && let Ok(m) = max.parse()
        {
            config.reporting.max_interval = m;
        }
        if let Some(change) = var("REPORTING_CHANGE")
            && let Ok(c) = change.parse()
        {
            config.reporting.reportable_change = c;
        }

        config
    }

    /// Reporting defaults applied when a device is configured.
    pub fn reporting_defaults(&self) -> StaticReporting {
        StaticReporting(self.reporting)
    }
}
