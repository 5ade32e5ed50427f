//! Host settings: TOML file, then `COMBOLOCK_*` environment, then flags.

use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use clap::Parser;
use serde::{Deserialize, Serialize};

use combolock_core::constants::{
    DEFAULT_ACTUATOR_PORT, DEFAULT_MAX_CONNECTIONS, DEFAULT_QUEUE_CAPACITY,
};
use combolock_network::ActuatorServerConfig;

pub const DEFAULT_CONFIG_FILE: &str = "combolock.toml";

/// Combination lock controller host.
///
/// Serves actuator commands on TCP and reads selector gestures from stdin.
#[derive(Parser, Debug)]
#[command(name = "combolock", version)]
pub struct Cli {
    /// Settings file. Missing is fine unless given explicitly.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Address the actuator server listens on
    #[arg(long, env = "COMBOLOCK_BIND_ADDR")]
    pub bind_addr: Option<SocketAddr>,

    /// Maximum simultaneous actuator connections
    #[arg(long, env = "COMBOLOCK_MAX_CONNECTIONS")]
    pub max_connections: Option<usize>,

    /// Commands buffered per actuator connection
    #[arg(long, env = "COMBOLOCK_QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "COMBOLOCK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Connect an emulated servo to the actuator server
    #[arg(long)]
    pub emulate_actuator: bool,
}

impl Cli {
    /// Load the settings file and apply environment and flag overrides.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_file(path)?,
            None => Settings::from_optional_file(Path::new(DEFAULT_CONFIG_FILE))?,
        };
        self.apply_overrides(&mut settings);
        settings.validate()?;
        Ok(settings)
    }

    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(addr) = self.bind_addr {
            settings.bind_addr = addr;
        }
        if let Some(max) = self.max_connections {
            settings.max_connections = max;
        }
        if let Some(capacity) = self.queue_capacity {
            settings.queue_capacity = capacity;
        }
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub max_connections: usize,
    pub queue_capacity: usize,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_ACTUATOR_PORT)),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            log_level: "info".into(),
        }
    }
}

impl Settings {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        Self::from_toml(&raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields the
    /// defaults.
    pub fn from_optional_file(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_connections == 0 {
            bail!("max_connections must be at least 1");
        }
        if self.queue_capacity == 0 {
            bail!("queue_capacity must be at least 1");
        }
        Ok(())
    }

    pub fn server_config(&self) -> ActuatorServerConfig {
        ActuatorServerConfig {
            bind_addr: self.bind_addr,
            max_connections: self.max_connections,
            queue_capacity: self.queue_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_listen_on_actuator_port() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr.port(), 4567);
        assert_eq!(settings.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            bind_addr = "127.0.0.1:9000"
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(settings.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Settings::from_toml("combination = [1, 2, 3, 4]").is_err());
    }

    #[test]
    fn test_zero_connections_is_invalid() {
        let settings = Settings {
            max_connections: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_missing_optional_file_uses_defaults() {
        let path = std::env::temp_dir().join("combolock-missing-settings.toml");
        let _ = fs::remove_file(&path);

        assert_eq!(Settings::from_optional_file(&path).unwrap(), Settings::default());
        assert!(Settings::from_file(&path).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let cli = Cli::try_parse_from([
            "combolock",
            "--bind-addr",
            "127.0.0.1:7000",
            "--max-connections",
            "2",
        ])
        .unwrap();

        let mut settings = Settings::from_toml("max_connections = 8\nqueue_capacity = 4").unwrap();
        cli.apply_overrides(&mut settings);

        assert_eq!(settings.bind_addr.port(), 7000);
        assert_eq!(settings.max_connections, 2);
        assert_eq!(settings.queue_capacity, 4);
    }

    #[test]
    fn test_server_config_carries_settings() {
        let settings = Settings {
            queue_capacity: 3,
            ..Settings::default()
        };
        let config = settings.server_config();
        assert_eq!(config.queue_capacity, 3);
        assert_eq!(config.bind_addr, settings.bind_addr);
    }
}
