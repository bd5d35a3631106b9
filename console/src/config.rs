//! Console configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the governance console.
///
/// Can be loaded from a TOML file via [`ConsoleConfig::from_toml_file`] or
/// built from CLI flags; file settings are the base, flags and env vars
/// override them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Base URL of the gateway the console talks to.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// The authenticated operator this session acts as.
    #[serde(default)]
    pub operator_id: Option<String>,

    /// Maximum concurrent tally fetches during a listing refresh.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            operator_id: None,
            max_in_flight: default_max_in_flight(),
            log_level: default_log_level(),
        }
    }
}

impl ConsoleConfig {
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_gateway_url() -> String {
    "http://127.0.0.1:8091".to_string()
}

fn default_max_in_flight() -> usize {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn minimal_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "operator_id = \"op-1\"").unwrap();

        let config = ConsoleConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.operator_id.as_deref(), Some("op-1"));
        assert_eq!(config.gateway_url, "http://127.0.0.1:8091");
        assert_eq!(config.max_in_flight, 8);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn full_file_round_trips() {
        let config = ConsoleConfig {
            gateway_url: "https://gw.concord.example".to_string(),
            operator_id: Some("op-9".to_string()),
            max_in_flight: 4,
            log_level: "debug".to_string(),
        };
        let serialized = toml::to_string(&config).unwrap();
        let back: ConsoleConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(back.gateway_url, config.gateway_url);
        assert_eq!(back.operator_id, config.operator_id);
        assert_eq!(back.max_in_flight, 4);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_in_flight = \"many\"").unwrap();
        assert!(ConsoleConfig::from_toml_file(file.path()).is_err());
    }
}
