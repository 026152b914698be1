//! Runtime configuration for the relay.
//!
//! Resolution precedence mirrors the rest of the workspace: an explicit CLI
//! argument wins, then an environment variable, then a compiled-in default.
//! `RelayConfig` itself is CLI-framework agnostic — `courtrelay-cli` is the
//! only crate that knows about `clap`.

use std::path::PathBuf;
use thiserror::Error;

/// Compiled-in PIN default. Intentionally weak — operators are expected to
/// override it via `--pin` or `AUTH_PIN` before exposing the relay.
const DEFAULT_PIN: &str = "000000";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_STATIC_DIR: &str = "./public";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--pin / AUTH_PIN must be exactly 6 digits, got {0:?}")]
    InvalidPin(String),
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub port: u16,
    /// WS-level shared secret; empty disables WS-level auth.
    pub ws_password: String,
    pub data_dir: PathBuf,
    pub static_dir: PathBuf,
    pub pin: String,
    pub allowed_origins: Vec<String>,
}

/// Raw CLI-provided overrides, before environment/default resolution.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub ws_password: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub pin: Option<String>,
}

impl RelayConfig {
    /// Resolve the full configuration from CLI overrides and the process
    /// environment (`AUTH_PIN`, `ALLOWED_ORIGINS`).
    pub fn resolve(cli: CliOverrides) -> Result<Self, ConfigError> {
        let pin = cli
            .pin
            .or_else(|| std::env::var("AUTH_PIN").ok())
            .unwrap_or_else(|| DEFAULT_PIN.to_string());
        validate_pin(&pin)?;

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_else(default_allowed_origins);

        Ok(Self {
            port: cli.port.unwrap_or(DEFAULT_PORT),
            ws_password: cli.ws_password.unwrap_or_default(),
            data_dir: cli.data_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            static_dir: cli.static_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            pin,
            allowed_origins,
        })
    }

    pub fn sessions_path(&self) -> PathBuf {
        self.data_dir.join("sessions.json")
    }

    pub fn scout_path(&self) -> PathBuf {
        self.data_dir.join("scout-current.json")
    }

    pub fn matchday_path(&self) -> PathBuf {
        self.data_dir.join("matchday-current.json")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.data_dir.join("archive")
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:8080".to_string(),
        "http://127.0.0.1:8080".to_string(),
    ]
}

fn validate_pin(pin: &str) -> Result<(), ConfigError> {
    if pin.len() == 6 && pin.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ConfigError::InvalidPin(pin.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_with_no_overrides() {
        let config = RelayConfig::resolve(CliOverrides::default()).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.pin, DEFAULT_PIN);
        assert!(config.ws_password.is_empty());
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
    }

    #[test]
    fn cli_pin_overrides_default() {
        let config = RelayConfig::resolve(CliOverrides {
            pin: Some("274683".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.pin, "274683");
    }

    #[test]
    fn invalid_pin_is_rejected() {
        let err = RelayConfig::resolve(CliOverrides {
            pin: Some("abc".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPin(_)));
    }

    #[test]
    fn short_pin_is_rejected() {
        let err = RelayConfig::resolve(CliOverrides {
            pin: Some("12345".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPin(_)));
    }

    #[test]
    fn derived_paths_live_under_data_dir() {
        let config = RelayConfig::resolve(CliOverrides {
            data_dir: Some(PathBuf::from("/tmp/relay-data")),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.sessions_path(), PathBuf::from("/tmp/relay-data/sessions.json"));
        assert_eq!(config.archive_dir(), PathBuf::from("/tmp/relay-data/archive"));
    }
}
