//! AFS server snapshots and lifecycle commands
//!
//! Servers are registered in the wrapper library's `AFSSERVERS` table; the
//! live job state comes from joining each row against `GET_JOB_INFO`.
//! Lifecycle commands (`STRAFSSVR`, `ENDAFSSVR`, `DLTAFSSVR`, `CHGAFSSVR`)
//! run with the wrapper library as the only user library.

use afsctl_errors::{Error, InventoryError};
use afsctl_events::{AppEvent, EventEmitter, ServerEvent};
use afsctl_gateway::{
    unique_work_directory, with_temp_directory, sh_quote, ClCommand, ClValue, RemoteGateway,
};
use afsctl_types::{
    AfsServer, AfsServerUpdate, ConfigurationError, IfsPath, JobStatus, LibraryName, ObjectName,
    ServerConfiguration,
};

use crate::ini::parse_configuration;
use crate::row;

/// Files preserved when a configuration area is cleared.
const CONFIG_FILES: [&str; 3] = [
    "org.eclipse.equinox.simpleconfigurator",
    "config.ini",
    "osgi.cm.ini",
];

/// List the AFS servers registered in `library`, newest job state included.
///
/// # Errors
///
/// Returns an error if the `AFSSERVERS` query fails or a row is missing a
/// required column.
pub async fn list_servers(
    gateway: &dyn RemoteGateway,
    library: &LibraryName,
) -> Result<Vec<AfsServer>, Error> {
    let rows = gateway
        .run_sql(&format!(
            "Select * From {library}.AFSSERVERS \
             Cross Join Table(QSYS2.GET_JOB_INFO(AFS_JOBNUMBER concat '/' concat AFS_JOBUSER concat '/' concat AFS_JOBNAME)) \
             Order By AFS_NAME For fetch only"
        ))
        .await?;

    let mut servers = Vec::with_capacity(rows.len());
    for r in rows {
        let ifs_path = row::text(&r, "afsservers", "AFS_IFSPATH")?;
        let configuration = load_configuration(gateway, &ifs_path).await;
        servers.push(AfsServer {
            library: library.clone(),
            name: row::text(&r, "afsservers", "AFS_NAME")?,
            jobq_name: row::text(&r, "afsservers", "AFS_JOBQNAME")?,
            jobq_library: row::text(&r, "afsservers", "AFS_JOBQLIB")?,
            ifs_path,
            user: row::text(&r, "afsservers", "AFS_USER")?,
            java_props: row::text(&r, "afsservers", "AFS_PROPS")?,
            java_home: row::text(&r, "afsservers", "AFS_JAVA_HOME")?,
            job: JobStatus {
                job_name: row::text(&r, "afsservers", "AFS_JOBNAME")?,
                job_user: row::text(&r, "afsservers", "AFS_JOBUSER")?,
                // Leading zeroes are lost on the numeric round trip.
                job_number: format!("{:0>6}", row::text(&r, "afsservers", "AFS_JOBNUMBER")?),
                status: row::opt_text(&r, "V_ACTIVE_JOB_STATUS"),
            },
            running: row::text(&r, "afsservers", "V_JOB_STATUS")? == "*ACTIVE",
            configuration,
        });
    }
    Ok(servers)
}

/// Read a server's `osgi.cm.ini`. A missing folder or file is reported in
/// the snapshot, not as an error; an unreadable file reads as empty.
async fn load_configuration(gateway: &dyn RemoteGateway, ifs_path: &str) -> ServerConfiguration {
    let folder_test = format!("[ -d {} ]", sh_quote(ifs_path));
    let folder_ok = match gateway.run_shell(&folder_test, None).await {
        Ok(output) => output.success(),
        Err(_) => false,
    };
    if !folder_ok {
        return ServerConfiguration {
            error: Some(ConfigurationError::NoFolder),
            ..ServerConfiguration::default()
        };
    }

    let config_file = format!("{ifs_path}/configuration/osgi.cm.ini");
    let exists = match IfsPath::new(&config_file) {
        Ok(path) => gateway.file_exists(&path).await,
        Err(_) => false,
    };
    if !exists {
        return ServerConfiguration {
            error: Some(ConfigurationError::NoConfig),
            ..ServerConfiguration::default()
        };
    }

    match gateway
        .run_shell(&format!("cat {}", sh_quote(&config_file)), None)
        .await
    {
        Ok(output) if output.success() && !output.stdout.is_empty() => {
            parse_configuration(&output.stdout)
        }
        _ => ServerConfiguration::default(),
    }
}

/// Start (or restart, when already running) an AFS server, optionally with
/// a JVM debug port.
///
/// # Errors
///
/// Returns [`InventoryError::StartFailed`] with the command's stderr when
/// the start command fails.
pub async fn start_server(
    gateway: &dyn RemoteGateway,
    events: &impl EventEmitter,
    server: &AfsServer,
    debug_port: Option<u16>,
) -> Result<(), Error> {
    events.emit(AppEvent::Server(ServerEvent::Starting {
        name: server.name.clone(),
        restart: server.running,
    }));

    let command = ClCommand::new("STRAFSSVR")?
        .param("INSTANCE", ClValue::Name(ObjectName::new(&server.name)?))
        .param_opt("DBGPORT", debug_port.map(|p| ClValue::Number(i64::from(p))))
        .build();
    let output = gateway.run_command(&command, Some(&server.library)).await?;
    if output.success() {
        events.emit(AppEvent::Server(ServerEvent::Started {
            name: server.name.clone(),
        }));
        Ok(())
    } else {
        Err(InventoryError::StartFailed {
            name: server.name.clone(),
            stderr: output.diagnostic().trim().to_string(),
        }
        .into())
    }
}

/// Stop a running AFS server.
///
/// # Errors
///
/// Returns [`InventoryError::StopFailed`] when the end command fails.
pub async fn stop_server(
    gateway: &dyn RemoteGateway,
    events: &impl EventEmitter,
    server: &AfsServer,
) -> Result<(), Error> {
    events.emit(AppEvent::Server(ServerEvent::Stopping {
        name: server.name.clone(),
    }));

    let command = ClCommand::new("ENDAFSSVR")?
        .param("INSTANCE", ClValue::Name(ObjectName::new(&server.name)?))
        .build();
    let output = gateway.run_command(&command, Some(&server.library)).await?;
    if output.success() {
        events.emit(AppEvent::Server(ServerEvent::Stopped {
            name: server.name.clone(),
        }));
        Ok(())
    } else {
        Err(InventoryError::StopFailed {
            name: server.name.clone(),
            stderr: output.diagnostic().trim().to_string(),
        }
        .into())
    }
}

/// Delete an AFS server, optionally removing its IFS installation folder.
/// A running server is stopped by the remote command first.
///
/// # Errors
///
/// Returns [`InventoryError::DeleteFailed`] when the delete command fails.
pub async fn delete_server(
    gateway: &dyn RemoteGateway,
    events: &impl EventEmitter,
    server: &AfsServer,
    delete_ifs: bool,
) -> Result<(), Error> {
    let command = ClCommand::new("DLTAFSSVR")?
        .param("INSTANCE", ClValue::Name(ObjectName::new(&server.name)?))
        .param(
            "DELETE",
            ClValue::Special(if delete_ifs { "*YES" } else { "*NO" }),
        )
        .build();
    let output = gateway.run_command(&command, Some(&server.library)).await?;
    if output.success() {
        events.emit(AppEvent::Server(ServerEvent::Deleted {
            name: server.name.clone(),
            was_running: server.running,
        }));
        Ok(())
    } else {
        Err(InventoryError::DeleteFailed {
            name: server.name.clone(),
            output: output.diagnostic().trim().to_string(),
        }
        .into())
    }
}

/// Change an AFS server's registration. Only the fields that differ from
/// the current snapshot are included in the command.
///
/// # Errors
///
/// Returns [`InventoryError::ChangeFailed`] when the change command fails.
pub async fn change_server(
    gateway: &dyn RemoteGateway,
    events: &impl EventEmitter,
    server: &AfsServer,
    update: &AfsServerUpdate,
) -> Result<(), Error> {
    let mut command = ClCommand::new("CHGAFSSVR")?
        .in_library(server.library.clone())
        .param("INSTANCE", ClValue::Name(ObjectName::new(&server.name)?));

    if update.user != server.user {
        command = command.param("USER", ClValue::Name(ObjectName::new(&update.user)?));
    }
    if update.jobq_name != server.jobq_name || update.jobq_library != server.jobq_library {
        command = command.param(
            "JOBQ",
            ClValue::Qualified(
                LibraryName::new(&update.jobq_library)?,
                ObjectName::new(&update.jobq_name)?,
            ),
        );
    }
    if update.ifs_path.as_str() != server.ifs_path {
        command = command.param("IFSPATH", ClValue::Path(update.ifs_path.clone()));
    }
    if update.java_home != server.java_home {
        command = command.param("JAVAHOME", ClValue::Literal(update.java_home.clone()));
    }
    if update.java_props != server.java_props {
        // The starter requires a terminating semicolon on the property list.
        let mut props = update.java_props.clone();
        if !props.is_empty() && !props.ends_with(';') {
            props.push(';');
        }
        command = command.param("PROPS", ClValue::Literal(props));
    }

    let output = gateway
        .run_command(&command.build(), Some(&server.library))
        .await?;
    if output.success() {
        events.emit(AppEvent::Server(ServerEvent::Changed {
            name: server.name.clone(),
        }));
        Ok(())
    } else {
        Err(InventoryError::ChangeFailed {
            name: server.name.clone(),
            output: output.diagnostic().trim().to_string(),
        }
        .into())
    }
}

/// Wipe a stopped server's configuration area, keeping only the three
/// framework files it cannot start without. The preserved files sit in a
/// scoped work directory while the area is emptied.
///
/// # Errors
///
/// Returns [`InventoryError::ClearConfigurationFailed`] when the remote
/// move/wipe command fails, or a gateway error if the work directory cannot
/// be prepared.
pub async fn clear_configuration(
    gateway: &dyn RemoteGateway,
    events: &impl EventEmitter,
    server: &AfsServer,
    temp_base: &str,
) -> Result<(), Error> {
    let configuration_dir = format!("{}/configuration", server.ifs_path);
    let work = unique_work_directory(temp_base)?;

    with_temp_directory(gateway, &work, |work| async move {
        let keep_out: Vec<String> = CONFIG_FILES
            .iter()
            .map(|f| sh_quote(&format!("{configuration_dir}/{f}")))
            .collect();
        let keep_back: Vec<String> = CONFIG_FILES
            .iter()
            .map(|f| sh_quote(&format!("{work}/{f}")))
            .collect();
        let clear = format!(
            "mv {} {} && rm -rf {}/* && mv {} {}",
            keep_out.join(" "),
            sh_quote(work.as_str()),
            sh_quote(&configuration_dir),
            keep_back.join(" "),
            sh_quote(&configuration_dir),
        );

        let output = gateway.run_shell(&clear, None).await?;
        if output.success() {
            events.emit(AppEvent::Server(
                ServerEvent::ConfigurationCleared {
                    name: server.name.clone(),
                },
            ));
            Ok(())
        } else {
            Err(InventoryError::ClearConfigurationFailed {
                name: server.name.clone(),
                stderr: output.diagnostic().trim().to_string(),
            }
            .into())
        }
    })
    .await
}

/// Remove everything under a stopped server's `logs` directory.
///
/// # Errors
///
/// Returns [`InventoryError::ClearLogsFailed`] when the remote command fails.
pub async fn clear_logs(
    gateway: &dyn RemoteGateway,
    events: &impl EventEmitter,
    server: &AfsServer,
) -> Result<(), Error> {
    let logs_dir = format!("{}/logs", server.ifs_path);
    let output = gateway
        .run_shell(&format!("rm -rf {}/*", sh_quote(&logs_dir)), None)
        .await?;
    if output.success() {
        events.emit(AppEvent::Server(ServerEvent::LogsCleared {
            name: server.name.clone(),
        }));
        Ok(())
    } else {
        Err(InventoryError::ClearLogsFailed {
            name: server.name.clone(),
            stderr: output.diagnostic().trim().to_string(),
        }
        .into())
    }
}
