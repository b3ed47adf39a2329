#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration for afsctl
//!
//! TOML configuration with serde defaults, loaded from an explicit path or
//! falling back to built-in defaults when no file exists.

use afsctl_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Remote connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConnectionConfig {
    /// SSH host name or alias; required for any remote operation.
    pub host: String,
    /// User to connect as; defaults to the SSH configuration's choice.
    pub user: Option<String>,
    /// SSH port; defaults to the SSH configuration's choice.
    pub port: Option<u16>,
}

/// Remote host settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base directory for scoped work directories on the remote host.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
        }
    }
}

/// What to do with a server after it has been updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RestartPolicy {
    /// Restart without asking.
    Yes,
    /// Leave the server as it is.
    No,
    /// Ask the user first.
    #[default]
    Ask,
}

/// Update behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    #[serde(default)]
    pub restart_after_update: RestartPolicy,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            restart_after_update: RestartPolicy::default(),
        }
    }
}

/// REST probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_probe_timeout_ms(),
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub update: UpdateConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
}

impl Config {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_or_default(path: &Path) -> Result<Self, Error> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                debug!("loading configuration from {}", path.display());
                toml::from_str(&content).map_err(|e| {
                    ConfigError::Invalid {
                        message: e.to_string(),
                    }
                    .into()
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no configuration file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::ReadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Validate settings required for remote operations.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSetting`] when no host is configured.
    pub fn require_host(&self) -> Result<&str, Error> {
        if self.connection.host.is_empty() {
            Err(ConfigError::MissingSetting {
                setting: "connection.host",
            }
            .into())
        } else {
            Ok(&self.connection.host)
        }
    }
}

fn default_temp_dir() -> String {
    "/tmp".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("afsctl.toml"))
            .await
            .unwrap();
        assert_eq!(config.remote.temp_dir, "/tmp");
        assert_eq!(config.update.restart_after_update, RestartPolicy::Ask);
        assert!(config.require_host().is_err());
    }

    #[tokio::test]
    async fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("afsctl.toml");
        tokio::fs::write(
            &path,
            "[connection]\nhost = \"ibmi.example.com\"\n\n[update]\nrestart_after_update = \"yes\"\n",
        )
        .await
        .unwrap();

        let config = Config::load_or_default(&path).await.unwrap();
        assert_eq!(config.require_host().unwrap(), "ibmi.example.com");
        assert_eq!(config.update.restart_after_update, RestartPolicy::Yes);
        assert_eq!(config.probe.timeout_ms, 2_000);
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("afsctl.toml");
        tokio::fs::write(&path, "not = [toml").await.unwrap();
        assert!(Config::load_or_default(&path).await.is_err());
    }
}
