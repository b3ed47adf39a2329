//! Remote execution gateway error types

use std::borrow::Cow;

use thiserror::Error;

use crate::UserFacingError;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("connection to {host} failed: {reason}")]
    ConnectionFailed { host: String, reason: String },

    #[error("remote command could not be launched: {message}")]
    LaunchFailed { message: String },

    #[error("upload of {local} to {remote} failed: {message}")]
    UploadFailed {
        local: String,
        remote: String,
        message: String,
    },

    #[error("SQL execution failed: {message}")]
    SqlFailed { message: String },

    #[error("SQL result could not be decoded: {message}")]
    SqlDecodeFailed { message: String },

    #[error("invalid identifier {value:?}: {reason}")]
    InvalidIdentifier { value: String, reason: String },

    #[error("invalid remote path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("failed to prepare work directory {path}: {stderr}")]
    WorkDirectoryFailed { path: String, stderr: String },
}

impl UserFacingError for GatewayError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ConnectionFailed { .. } => {
                Some("Check that the host is reachable and your SSH configuration is valid.")
            }
            Self::InvalidIdentifier { .. } | Self::InvalidPath { .. } => {
                Some("IBM i object names are at most 10 characters: A-Z, 0-9, $, #, @, _.")
            }
            _ => None,
        }
    }
}
