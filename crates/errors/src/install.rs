//! Install/update orchestration error types

use std::borrow::Cow;

use thiserror::Error;

use crate::UserFacingError;

/// The orchestration phase in which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPhase {
    Uploading,
    Extracting,
    Restoring,
    Invoking,
}

impl std::fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uploading => write!(f, "uploading"),
            Self::Extracting => write!(f, "extracting"),
            Self::Restoring => write!(f, "restoring"),
            Self::Invoking => write!(f, "invoking"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum InstallError {
    #[error("upload of installation package failed: {message}")]
    UploadFailed { message: String },

    #[error("instance code {code} is already registered")]
    InstanceCodeTaken { code: String },

    #[error("cannot update {instance}: package upgrades from {expected}, instance is at {actual}")]
    VersionMismatch {
        instance: String,
        expected: String,
        actual: String,
    },
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InstanceCodeTaken { .. } => {
                Some("Pick a two-character code not used by any existing ARCAD instance.")
            }
            Self::VersionMismatch { .. } => {
                Some("Apply intermediate cumulative packages first, or select a matching package.")
            }
            _ => None,
        }
    }
}
