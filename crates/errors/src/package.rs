//! Installation package resolution error types

use std::borrow::Cow;

use thiserror::Error;

use crate::UserFacingError;

#[derive(Debug, Clone, Error)]
pub enum PackageError {
    #[error("{path} is not a suitable ARCAD installation package")]
    NotSuitable { path: String },

    #[error("failed to read archive {path}: {message}")]
    ArchiveReadFailed { path: String, message: String },

    #[error("invalid version string {value:?}")]
    InvalidVersion { value: String },

    #[error("package file not found: {path}")]
    NotFound { path: String },
}

impl UserFacingError for PackageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotSuitable { .. } => {
                Some("The package must contain an ARCINST.DTA file and a MSTARC or CUMARC .DTA file.")
            }
            _ => None,
        }
    }
}
