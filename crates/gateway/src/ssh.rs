//! SSH gateway implementation
//!
//! Uses the `openssh` crate (which shells out to the system's OpenSSH
//! binary) for session management. CL commands run through `qsh`'s `system`
//! utility, SQL through `db2util`'s JSON output, and uploads stream the
//! local file into a remote `cat`. This keeps the remote-side requirements
//! to a stock IBM i PASE environment.

use afsctl_errors::{Error, GatewayError};
use afsctl_types::{IfsPath, LibraryName, ObjectName};
use async_trait::async_trait;
use openssh::{KnownHosts, Session, SessionBuilder, Stdio};
use serde_json::Value;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::cl::sh_quote;
use crate::executor::{CommandOutput, RemoteGateway, SqlRow};

const QSH: &str = "/QOpenSys/usr/bin/qsh";
const DB2UTIL: &str = "/QOpenSys/pkgs/bin/db2util";

/// A gateway backed by one live SSH session to an IBM i host.
pub struct SshGateway {
    session: Session,
    host: String,
}

impl SshGateway {
    /// Open a new SSH connection to `host`, optionally as `user` and/or on
    /// a non-default `port`. Host aliases from `~/.ssh/config` are honored.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConnectionFailed`] if the session cannot be
    /// established.
    pub async fn connect(
        host: &str,
        user: Option<&str>,
        port: Option<u16>,
    ) -> Result<Self, Error> {
        let mut builder = SessionBuilder::default();
        builder.known_hosts_check(KnownHosts::Accept);
        if let Some(user) = user {
            builder.user(user.to_string());
        }
        if let Some(port) = port {
            builder.port(port);
        }

        let session =
            builder
                .connect(host)
                .await
                .map_err(|e| GatewayError::ConnectionFailed {
                    host: host.to_string(),
                    reason: e.to_string(),
                })?;

        Ok(Self {
            session,
            host: host.to_string(),
        })
    }

    /// The host this gateway is connected to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    async fn exec(&self, program: &str, args: &[&str]) -> Result<CommandOutput, Error> {
        let mut cmd = self.session.command(program);
        for arg in args {
            cmd.arg(arg);
        }
        let output = cmd
            .output()
            .await
            .map_err(|e| GatewayError::LaunchFailed {
                message: e.to_string(),
            })?;

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[async_trait]
impl RemoteGateway for SshGateway {
    async fn run_command(
        &self,
        command: &str,
        library: Option<&LibraryName>,
    ) -> Result<CommandOutput, Error> {
        // CL strings quote with apostrophes, so the double-quoted `system`
        // argument only needs embedded double quotes escaped.
        let quoted = command.replace('"', "\\\"");
        let script = match library {
            Some(library) => {
                format!("liblist -c {library} 2>/dev/null; system \"{quoted}\"")
            }
            None => format!("system \"{quoted}\""),
        };
        debug!(host = %self.host, %command, "running CL command");
        self.exec(QSH, &["-c", &script]).await
    }

    async fn run_shell(
        &self,
        command: &str,
        directory: Option<&IfsPath>,
    ) -> Result<CommandOutput, Error> {
        let script = match directory {
            Some(directory) => format!("cd {} && {command}", sh_quote(directory.as_str())),
            None => command.to_string(),
        };
        debug!(host = %self.host, command = %script, "running shell command");
        self.exec("sh", &["-c", &script]).await
    }

    async fn run_sql(&self, statement: &str) -> Result<Vec<SqlRow>, Error> {
        let statement = if statement.trim_end().ends_with(';') {
            statement.to_string()
        } else {
            format!("{statement};")
        };
        debug!(host = %self.host, %statement, "running SQL");
        let output = self.exec(DB2UTIL, &["-o", "json", &statement]).await?;
        if !output.success() {
            return Err(GatewayError::SqlFailed {
                message: output.diagnostic().trim().to_string(),
            }
            .into());
        }
        if output.stdout.trim().is_empty() {
            return Ok(Vec::new());
        }

        let decoded: Value = serde_json::from_str(&output.stdout).map_err(|e| {
            GatewayError::SqlDecodeFailed {
                message: e.to_string(),
            }
        })?;
        let records = decoded
            .get("records")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        records
            .into_iter()
            .map(|record| match record {
                Value::Object(row) => Ok(row),
                other => Err(GatewayError::SqlDecodeFailed {
                    message: format!("expected object row, got {other}"),
                }
                .into()),
            })
            .collect()
    }

    async fn upload(&self, local: &Path, remote: &IfsPath) -> Result<(), Error> {
        let bytes = tokio::fs::read(local)
            .await
            .map_err(|e| Error::io_with_path(&e, local))?;

        let mut cmd = self.session.command("sh");
        cmd.arg("-c")
            .arg(format!("cat > {}", sh_quote(remote.as_str())))
            .stdin(Stdio::piped());
        let mut child = cmd.spawn().await.map_err(|e| GatewayError::UploadFailed {
            local: local.display().to_string(),
            remote: remote.to_string(),
            message: e.to_string(),
        })?;

        let upload_error = |message: String| GatewayError::UploadFailed {
            local: local.display().to_string(),
            remote: remote.to_string(),
            message,
        };

        {
            let mut stdin = child
                .stdin()
                .take()
                .ok_or_else(|| upload_error("remote stdin unavailable".to_string()))?;
            stdin
                .write_all(&bytes)
                .await
                .map_err(|e| upload_error(e.to_string()))?;
            stdin
                .shutdown()
                .await
                .map_err(|e| upload_error(e.to_string()))?;
        }

        let status = child
            .wait()
            .await
            .map_err(|e| upload_error(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(upload_error(format!("remote write exited with {status}")).into())
        }
    }

    async fn file_exists(&self, path: &IfsPath) -> bool {
        self.run_shell(&format!("test -e {}", sh_quote(path.as_str())), None)
            .await
            .map_or(false, |output| output.success())
    }

    async fn object_exists(
        &self,
        library: &LibraryName,
        name: &ObjectName,
        object_type: &str,
    ) -> bool {
        self.run_command(
            &format!("CHKOBJ OBJ({library}/{name}) OBJTYPE({object_type})"),
            None,
        )
        .await
        .map_or(false, |output| output.success())
    }
}
