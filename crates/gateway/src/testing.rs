//! Scripted gateway test double
//!
//! Records every call and replays canned results matched by substring.
//! Unmatched commands succeed with empty output, so tests only script the
//! interactions they care about.

use afsctl_errors::Error;
use afsctl_types::{IfsPath, LibraryName, ObjectName};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::executor::{CommandOutput, RemoteGateway, SqlRow};

/// One recorded gateway interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Command {
        command: String,
        library: Option<String>,
    },
    Shell {
        command: String,
        directory: Option<String>,
    },
    Sql(String),
    Upload {
        local: PathBuf,
        remote: String,
    },
}

#[derive(Default)]
struct Script {
    calls: Vec<GatewayCall>,
    command_rules: Vec<(String, CommandOutput)>,
    shell_rules: Vec<(String, CommandOutput)>,
    sql_rules: Vec<(String, Vec<SqlRow>)>,
    failing_uploads: Vec<String>,
    files: HashSet<String>,
    objects: HashSet<String>,
}

/// A scripted [`RemoteGateway`] for tests.
#[derive(Default)]
pub struct ScriptedGateway {
    script: Mutex<Script>,
}

impl ScriptedGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a canned output for CL commands containing `pattern`.
    pub fn respond_command(&self, pattern: &str, output: CommandOutput) {
        self.script
            .lock()
            .unwrap()
            .command_rules
            .push((pattern.to_string(), output));
    }

    /// Script a canned output for shell commands containing `pattern`.
    pub fn respond_shell(&self, pattern: &str, output: CommandOutput) {
        self.script
            .lock()
            .unwrap()
            .shell_rules
            .push((pattern.to_string(), output));
    }

    /// Script a failure for CL commands containing `pattern`.
    pub fn fail_command_matching(&self, pattern: &str, code: i32, stderr: &str) {
        self.respond_command(pattern, CommandOutput::failed(code, stderr));
    }

    /// Script a failure for shell commands containing `pattern`.
    pub fn fail_shell_matching(&self, pattern: &str, code: i32, stderr: &str) {
        self.respond_shell(pattern, CommandOutput::failed(code, stderr));
    }

    /// Script rows for SQL statements containing `pattern`.
    pub fn respond_sql(&self, pattern: &str, rows: Vec<SqlRow>) {
        self.script
            .lock()
            .unwrap()
            .sql_rules
            .push((pattern.to_string(), rows));
    }

    /// Make uploads to remote paths containing `pattern` fail.
    pub fn fail_upload_matching(&self, pattern: &str) {
        self.script
            .lock()
            .unwrap()
            .failing_uploads
            .push(pattern.to_string());
    }

    /// Register an existing stream file.
    pub fn add_file(&self, path: &str) {
        self.script.lock().unwrap().files.insert(path.to_string());
    }

    /// Register an existing native object as `LIB/NAME TYPE`.
    pub fn add_object(&self, library: &str, name: &str, object_type: &str) {
        self.script
            .lock()
            .unwrap()
            .objects
            .insert(format!("{library}/{name} {object_type}"));
    }

    /// Every recorded call, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.script.lock().unwrap().calls.clone()
    }

    /// Recorded shell command strings, in order.
    #[must_use]
    pub fn shell_commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Shell { command, .. } => Some(command),
                _ => None,
            })
            .collect()
    }

    /// Recorded CL command strings, in order.
    #[must_use]
    pub fn cl_commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Command { command, .. } => Some(command),
                _ => None,
            })
            .collect()
    }

    /// Recorded upload targets, in order.
    #[must_use]
    pub fn uploads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Upload { remote, .. } => Some(remote),
                _ => None,
            })
            .collect()
    }

    fn match_rule(rules: &[(String, CommandOutput)], command: &str) -> CommandOutput {
        rules
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
            .map_or_else(|| CommandOutput::ok(""), |(_, output)| output.clone())
    }
}

#[async_trait]
impl RemoteGateway for ScriptedGateway {
    async fn run_command(
        &self,
        command: &str,
        library: Option<&LibraryName>,
    ) -> Result<CommandOutput, Error> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(GatewayCall::Command {
            command: command.to_string(),
            library: library.map(ToString::to_string),
        });
        Ok(Self::match_rule(&script.command_rules, command))
    }

    async fn run_shell(
        &self,
        command: &str,
        directory: Option<&IfsPath>,
    ) -> Result<CommandOutput, Error> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(GatewayCall::Shell {
            command: command.to_string(),
            directory: directory.map(ToString::to_string),
        });
        Ok(Self::match_rule(&script.shell_rules, command))
    }

    async fn run_sql(&self, statement: &str) -> Result<Vec<SqlRow>, Error> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(GatewayCall::Sql(statement.to_string()));
        Ok(script
            .sql_rules
            .iter()
            .find(|(pattern, _)| statement.contains(pattern.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    async fn upload(&self, local: &Path, remote: &IfsPath) -> Result<(), Error> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(GatewayCall::Upload {
            local: local.to_path_buf(),
            remote: remote.to_string(),
        });
        if script
            .failing_uploads
            .iter()
            .any(|pattern| remote.as_str().contains(pattern.as_str()))
        {
            return Err(afsctl_errors::GatewayError::UploadFailed {
                local: local.display().to_string(),
                remote: remote.to_string(),
                message: "scripted upload failure".to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn file_exists(&self, path: &IfsPath) -> bool {
        self.script.lock().unwrap().files.contains(path.as_str())
    }

    async fn object_exists(
        &self,
        library: &LibraryName,
        name: &ObjectName,
        object_type: &str,
    ) -> bool {
        self.script
            .lock()
            .unwrap()
            .objects
            .contains(&format!("{library}/{name} {object_type}"))
    }
}
