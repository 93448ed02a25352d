//! Layered configuration.
//!
//! Settings come from built-in defaults, an optional TOML file, and
//! environment variables prefixed with `POSTURE` (nested keys use `__`,
//! e.g. `POSTURE_BROKER__HOST=10.0.0.5`). The binary applies CLI overrides
//! on top.
//!
//! ```toml
//! [broker]
//! host = "10.192.37.112"
//! port = 1883
//!
//! [retention]
//! decimation = 10
//! capacity = 100
//!
//! [history]
//! url = "https://example.supabase.co"
//! api_key = "public-anon-key"
//! ```

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::data::{RetentionPolicy, Threshold};
use crate::error::{Error, Result};

/// MQTT broker connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    /// Topic carrying JSON sensor readings.
    pub data_topic: String,
    /// Topic the threshold is published to.
    pub threshold_topic: String,
    pub keep_alive_secs: u64,
    /// Pause before the client is polled again after a connection error.
    pub reconnect_delay_ms: u64,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "posture-pulse".to_string(),
            data_topic: "posture/project/data".to_string(),
            threshold_topic: "posture/project/threshold".to_string(),
            keep_alive_secs: 30,
            reconnect_delay_ms: 1000,
        }
    }
}

/// Alerting defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    /// Threshold in effect until the user or the device changes it.
    pub threshold: f64,
    /// Ring the terminal bell when an alert starts.
    pub audio: bool,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            threshold: Threshold::DEFAULT,
            audio: true,
        }
    }
}

/// History store (PostgREST) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Project base URL, e.g. `https://xyz.supabase.co`. Empty disables the view.
    pub url: String,
    pub api_key: String,
    pub table: String,
    /// Number of most recent records to fetch.
    pub limit: usize,
    pub timeout_secs: u64,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            table: "posture_history".to_string(),
            limit: 100,
            timeout_secs: 10,
        }
    }
}

/// Terminal UI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Input poll timeout and redraw cadence in milliseconds.
    pub tick_ms: u64,
    /// Payloads per second when replaying a recording.
    pub replay_rate_hz: u32,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            replay_rate_hz: 50,
        }
    }
}

/// Complete application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub retention: RetentionPolicy,
    pub alert: AlertSettings,
    pub history: HistorySettings,
    pub ui: UiSettings,
}

impl Settings {
    /// Load settings from defaults, an optional file, and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix("POSTURE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        Threshold::new(self.alert.threshold)?;
        self.retention.validate()?;
        if self.history.limit == 0 {
            return Err(Error::Config("history.limit must be at least 1".to_string()));
        }
        if self.ui.tick_ms == 0 {
            return Err(Error::Config("ui.tick_ms must be at least 1".to_string()));
        }
        if self.ui.replay_rate_hz == 0 {
            return Err(Error::Config("ui.replay_rate_hz must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Initial threshold. Only valid after [`Settings::validate`] succeeded.
    pub fn initial_threshold(&self) -> Threshold {
        Threshold::clamped(self.alert.threshold).unwrap_or_default()
    }

    /// Whether a history store is configured.
    pub fn history_enabled(&self) -> bool {
        !self.history.url.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.broker.data_topic, "posture/project/data");
        assert_eq!(settings.broker.threshold_topic, "posture/project/threshold");
        assert_eq!(settings.retention.decimation, 10);
        assert_eq!(settings.retention.capacity, 100);
        assert_eq!(settings.initial_threshold().value(), 30.0);
        assert_eq!(settings.history.limit, 100);
        assert!(!settings.history_enabled());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[broker]
host = "10.192.37.112"
port = 1884

[retention]
decimation = 5
capacity = 50

[alert]
threshold = 25.0

[history]
url = "https://example.supabase.co"
api_key = "anon"
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.broker.host, "10.192.37.112");
        assert_eq!(settings.broker.port, 1884);
        assert_eq!(settings.broker.client_id, "posture-pulse");
        assert_eq!(settings.retention, RetentionPolicy::new(5, 50).unwrap());
        assert_eq!(settings.initial_threshold().value(), 25.0);
        assert!(settings.history_enabled());
        assert_eq!(settings.history.table, "posture_history");
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[alert]\nthreshold = 75.0").unwrap();
        assert!(matches!(
            Settings::load(Some(file.path())),
            Err(Error::InvalidThreshold(_))
        ));

        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[retention]\ndecimation = 0\ncapacity = 100").unwrap();
        assert!(matches!(
            Settings::load(Some(file.path())),
            Err(Error::InvalidRetention(_))
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Settings::load(Some(Path::new("/nonexistent/posture.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
