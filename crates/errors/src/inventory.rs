//! Server inventory error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    #[error("column {column} missing from {query} result row")]
    MissingColumn {
        query: &'static str,
        column: &'static str,
    },

    #[error("column {column} holds unexpected value {value:?}")]
    BadColumn { column: &'static str, value: String },

    #[error("failed to start {name}: {stderr}")]
    StartFailed { name: String, stderr: String },

    #[error("failed to stop {name}: {stderr}")]
    StopFailed { name: String, stderr: String },

    #[error("failed to delete {name}: {output}")]
    DeleteFailed { name: String, output: String },

    #[error("failed to change {name}: {output}")]
    ChangeFailed { name: String, output: String },

    #[error("failed to clear {name} configuration area: {stderr}")]
    ClearConfigurationFailed { name: String, stderr: String },

    #[error("failed to clear {name} logs: {stderr}")]
    ClearLogsFailed { name: String, stderr: String },

    #[error("no REST port configured for {name}")]
    NoRestPort { name: String },

    #[error("REST probe of {name} failed: {message}")]
    ProbeFailed { name: String, message: String },
}
