//! Configuration error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },

    #[error("missing required setting: {setting}")]
    MissingSetting { setting: &'static str },
}
