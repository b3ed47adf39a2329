//! Domain event types

/// Top level event type, grouped by functional domain.
#[derive(Debug, Clone)]
pub enum AppEvent {
    General(GeneralEvent),
    Install(InstallEvent),
    Server(ServerEvent),
}

/// Cross-cutting events
#[derive(Debug, Clone)]
pub enum GeneralEvent {
    Debug { message: String },
    Warning { message: String },
    Error { message: String },
    OperationStarted { operation: String },
    OperationCompleted { operation: String, success: bool },
}

/// Install/update orchestration events
#[derive(Debug, Clone)]
pub enum InstallEvent {
    /// A weighted phase of the running orchestration has begun. Increments
    /// across one orchestration always sum to 100.
    PhaseStarted { message: String, increment: u8 },

    /// The orchestration finished; the captured installer output is carried
    /// along so the CLI can offer it for inspection on success and failure
    /// alike.
    Finished {
        operation: String,
        success: bool,
        stdout: String,
        stderr: String,
    },
}

/// Server lifecycle events
#[derive(Debug, Clone)]
pub enum ServerEvent {
    Starting { name: String, restart: bool },
    Started { name: String },
    Stopping { name: String },
    Stopped { name: String },
    Deleted { name: String, was_running: bool },
    Changed { name: String },
    ConfigurationCleared { name: String },
    LogsCleared { name: String },
}
