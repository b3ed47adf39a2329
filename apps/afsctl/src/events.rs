//! Event handling and progress display

use afsctl_events::{AppEvent, GeneralEvent, InstallEvent, ServerEvent};
use console::style;

/// Renders the event stream of a running command to stderr, accumulating
/// the weighted phases of an orchestration into a percentage.
pub struct EventHandler {
    colors: bool,
    debug: bool,
    progress: u8,
    /// Captured output of the last finished orchestration.
    finished: Option<FinishedOperation>,
}

/// Outcome of an install or update orchestration, kept for the final report.
pub struct FinishedOperation {
    pub operation: String,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl EventHandler {
    pub fn new(colors: bool, debug: bool) -> Self {
        Self {
            colors,
            debug,
            progress: 0,
            finished: None,
        }
    }

    /// The last orchestration outcome seen, if any.
    pub fn take_finished(&mut self) -> Option<FinishedOperation> {
        self.finished.take()
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::General(event) => self.handle_general(event),
            AppEvent::Install(event) => self.handle_install(event),
            AppEvent::Server(event) => self.handle_server(&event),
        }
    }

    fn handle_general(&mut self, event: GeneralEvent) {
        match event {
            GeneralEvent::Debug { message } => {
                if self.debug {
                    self.status(&format!("debug: {message}"));
                }
            }
            GeneralEvent::Warning { message } => {
                let prefix = self.paint("warning:", |s| s.yellow().bold());
                eprintln!("{prefix} {message}");
            }
            GeneralEvent::Error { message } => {
                let prefix = self.paint("error:", |s| s.red().bold());
                eprintln!("{prefix} {message}");
            }
            GeneralEvent::OperationStarted { operation } => {
                self.status(&operation);
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                if success {
                    self.status(&format!("{operation} completed"));
                } else {
                    let prefix = self.paint("failed:", |s| s.red().bold());
                    eprintln!("{prefix} {operation}");
                }
            }
        }
    }

    fn handle_install(&mut self, event: InstallEvent) {
        match event {
            InstallEvent::PhaseStarted { message, increment } => {
                eprintln!("[{:>3}%] {message}", self.progress);
                self.progress = self.progress.saturating_add(increment);
            }
            InstallEvent::Finished {
                operation,
                success,
                stdout,
                stderr,
            } => {
                eprintln!("[100%] {operation} finished");
                self.progress = 0;
                self.finished = Some(FinishedOperation {
                    operation,
                    success,
                    stdout,
                    stderr,
                });
            }
        }
    }

    fn handle_server(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::Starting { name, restart } => {
                if *restart {
                    self.status(&format!("Restarting {name}"));
                } else {
                    self.status(&format!("Starting {name}"));
                }
            }
            ServerEvent::Started { name } => self.status(&format!("{name} started")),
            ServerEvent::Stopping { name } => self.status(&format!("Stopping {name}")),
            ServerEvent::Stopped { name } => self.status(&format!("{name} stopped")),
            ServerEvent::Deleted { name, was_running } => {
                if *was_running {
                    self.status(&format!("{name} stopped and deleted"));
                } else {
                    self.status(&format!("{name} deleted"));
                }
            }
            ServerEvent::Changed { name } => self.status(&format!("{name} changed")),
            ServerEvent::ConfigurationCleared { name } => {
                self.status(&format!("Configuration of {name} cleared"));
            }
            ServerEvent::LogsCleared { name } => {
                self.status(&format!("Logs of {name} cleared"));
            }
        }
    }

    fn status(&self, message: &str) {
        eprintln!("{}", self.paint(message, |s| s.dim()));
    }

    fn paint(
        &self,
        text: &str,
        apply: impl FnOnce(console::StyledObject<&str>) -> console::StyledObject<&str>,
    ) -> String {
        if self.colors {
            apply(style(text)).to_string()
        } else {
            text.to_string()
        }
    }
}
