//! The gateway trait and its result types

use afsctl_errors::Error;
use afsctl_types::{IfsPath, LibraryName, ObjectName};
use async_trait::async_trait;
use std::path::Path;

/// Captured output of one remote command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Exit code 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// A successful output with the given stdout, mostly for tests.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed output with the given exit code and stderr.
    #[must_use]
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whichever of stderr/stdout carries the diagnostic text.
    #[must_use]
    pub fn diagnostic(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// One result row of an SQL query, column name to loosely-typed value.
/// Callers must trim and cast each cell explicitly; the remote driver
/// returns padded character values.
pub type SqlRow = serde_json::Map<String, serde_json::Value>;

/// Remote command, SQL, upload and existence-probe operations against one
/// IBM i host session.
///
/// Every method is a suspension point. A method returning `Ok` with a
/// non-zero [`CommandOutput::code`] is a remote failure the caller must
/// handle; `Err` is reserved for infrastructure failures (connection lost,
/// transfer failed, undecodable results).
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Execute a CL command, scoped to `library` as the only user library
    /// (no inherited library list).
    async fn run_command(
        &self,
        command: &str,
        library: Option<&LibraryName>,
    ) -> Result<CommandOutput, Error>;

    /// Execute a POSIX shell command, optionally in `directory`.
    async fn run_shell(
        &self,
        command: &str,
        directory: Option<&IfsPath>,
    ) -> Result<CommandOutput, Error>;

    /// Execute one SQL statement and return its rows. A terminating `;` is
    /// appended when missing.
    async fn run_sql(&self, statement: &str) -> Result<Vec<SqlRow>, Error>;

    /// Copy one local file to one remote path. Not retried; callers decide
    /// how to surface a failed transfer.
    async fn upload(&self, local: &Path, remote: &IfsPath) -> Result<(), Error>;

    /// Whether a stream file exists. Never fails; any probe error reads as
    /// "not there".
    async fn file_exists(&self, path: &IfsPath) -> bool;

    /// Whether a native object exists, e.g. `object_exists(lib, name, "*DTAARA")`.
    async fn object_exists(&self, library: &LibraryName, name: &ObjectName, object_type: &str)
        -> bool;
}
