#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for afsctl
//!
//! This crate provides fine-grained error types organized by domain.
//! All error types implement Clone for easier handling across the
//! event channel.

use std::borrow::Cow;

use thiserror::Error;

pub mod config;
pub mod gateway;
pub mod install;
pub mod inventory;
pub mod package;

// Re-export all error types at the root
pub use config::ConfigError;
pub use gateway::GatewayError;
pub use install::{InstallError, InstallPhase};
pub use inventory::InventoryError;
pub use package::PackageError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("package error: {0}")]
    Package(#[from] PackageError),

    #[error("install error: {0}")]
    Install(#[from] InstallError),

    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an Io error with an associated path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Gateway(GatewayError::SqlDecodeFailed {
            message: err.to_string(),
        })
    }
}

/// Result type alias for afsctl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Minimal interface for rendering user-facing error information without
/// requiring heavyweight envelopes.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Gateway(err) => err.user_message(),
            Error::Package(err) => err.user_message(),
            Error::Install(err) => err.user_message(),
            Error::Io { message, .. } => Cow::Owned(message.clone()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Gateway(err) => err.user_hint(),
            Error::Package(err) => err.user_hint(),
            Error::Install(err) => err.user_hint(),
            Error::Config(_) => Some("Check your afsctl configuration file."),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    // Downstream crates import these from the crate root.
    use crate::{InstallError, InstallPhase};

    #[test]
    fn install_phases_render_as_lowercase_labels() {
        assert_eq!(InstallPhase::Uploading.to_string(), "uploading");
        assert_eq!(InstallPhase::Invoking.to_string(), "invoking");
    }

    #[test]
    fn install_errors_carry_a_hint_for_taken_codes() {
        use crate::UserFacingError;
        let err = InstallError::InstanceCodeTaken {
            code: "AD".to_string(),
        };
        assert!(err.user_hint().is_some());
    }
}
