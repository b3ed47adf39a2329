//! CLI error handling

use std::fmt;

use afsctl_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Error from the application crates
    App(afsctl_errors::Error),
    /// Invalid command arguments
    InvalidArguments(String),
    /// No server with the requested name exists
    ServerNotFound { library: String, name: String },
    /// No instance with the requested code exists
    InstanceNotFound { code: String },
    /// The selected file is not a recognized package
    NotAPackage(String),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::App(e) => {
                write!(f, "{}", e.user_message())?;
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                Ok(())
            }
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::ServerNotFound { library, name } => {
                write!(f, "No server named {name} is registered in {library}")
            }
            CliError::InstanceNotFound { code } => {
                write!(f, "No ARCAD instance with code {code} is registered")
            }
            CliError::NotAPackage(path) => {
                write!(f, "{path} is not a recognized distribution package")
            }
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::App(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<afsctl_errors::Error> for CliError {
    fn from(e: afsctl_errors::Error) -> Self {
        CliError::App(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
