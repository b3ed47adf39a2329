//! Jetty server snapshots and lifecycle commands
//!
//! The Jetty starter records its job in the `JETTY_PID` data area as a
//! fixed-width `NNNNNNUUUUUUUUUUJJJJJJJJJJ` triple. A library without that
//! data area never ran Jetty at all.

use afsctl_errors::{Error, InventoryError};
use afsctl_events::{AppEvent, EventEmitter, ServerEvent};
use afsctl_gateway::{ClCommand, RemoteGateway};
use afsctl_types::{JettyServer, JobStatus, LibraryName, ObjectName};

use crate::row;

/// Load the Jetty server snapshot of `library`.
///
/// # Errors
///
/// Returns an error if the job-info query fails or returns malformed rows.
pub async fn load_jetty_server(
    gateway: &dyn RemoteGateway,
    library: &LibraryName,
) -> Result<JettyServer, Error> {
    let pid_area = ObjectName::new("JETTY_PID").map_err(Error::from)?;
    if !gateway.object_exists(library, &pid_area, "*DTAARA").await {
        return Ok(JettyServer {
            library: library.clone(),
            running: false,
            job: None,
        });
    }

    let rows = gateway
        .run_sql(&format!(
            "With JETTYJOB As (\
               Select Substring(DATA_AREA_VALUE,1,6) as JOB_NUMBER, \
               Substring(DATA_AREA_VALUE,7,10) as JOB_USER, \
               Substring(DATA_AREA_VALUE,17,10) as JOB_NAME \
               From Table(QSYS2.DATA_AREA_INFO( DATA_AREA_NAME => 'JETTY_PID', DATA_AREA_LIBRARY => '{library}'))\
             ), \
             JOBINFO As (\
               Select * From JETTYJOB \
               Cross Join Table(QSYS2.GET_JOB_INFO(JOB_NUMBER || '/' || JOB_USER || '/' || JOB_NAME))\
             ) \
             Select * from JOBINFO"
        ))
        .await?;

    let Some(r) = rows.first() else {
        return Ok(JettyServer {
            library: library.clone(),
            running: false,
            job: None,
        });
    };

    Ok(JettyServer {
        library: library.clone(),
        running: row::text(r, "jettyjob", "V_JOB_STATUS")? == "*ACTIVE",
        job: Some(JobStatus {
            job_name: row::text(r, "jettyjob", "JOB_NAME")?,
            job_user: row::text(r, "jettyjob", "JOB_USER")?,
            job_number: row::text(r, "jettyjob", "JOB_NUMBER")?,
            status: row::opt_text(r, "V_ACTIVE_JOB_STATUS"),
        }),
    })
}

/// Start (or restart) the Jetty server of `server.library`.
///
/// # Errors
///
/// Returns [`InventoryError::StartFailed`] when the start command fails.
pub async fn start_jetty(
    gateway: &dyn RemoteGateway,
    events: &impl EventEmitter,
    server: &JettyServer,
) -> Result<(), Error> {
    events.emit(AppEvent::Server(ServerEvent::Starting {
        name: server.library.to_string(),
        restart: server.running,
    }));

    let command = ClCommand::new("STRJTYSVR")?.build();
    let output = gateway.run_command(&command, Some(&server.library)).await?;
    if output.success() {
        events.emit(AppEvent::Server(ServerEvent::Started {
            name: server.library.to_string(),
        }));
        Ok(())
    } else {
        Err(InventoryError::StartFailed {
            name: server.library.to_string(),
            stderr: output.diagnostic().trim().to_string(),
        }
        .into())
    }
}

/// Stop the Jetty server of `server.library`.
///
/// # Errors
///
/// Returns [`InventoryError::StopFailed`] when the end command fails.
pub async fn stop_jetty(
    gateway: &dyn RemoteGateway,
    events: &impl EventEmitter,
    server: &JettyServer,
) -> Result<(), Error> {
    events.emit(AppEvent::Server(ServerEvent::Stopping {
        name: server.library.to_string(),
    }));

    let command = ClCommand::new("ENDJTYSVR")?.build();
    let output = gateway.run_command(&command, Some(&server.library)).await?;
    if output.success() {
        events.emit(AppEvent::Server(ServerEvent::Stopped {
            name: server.library.to_string(),
        }));
        Ok(())
    } else {
        Err(InventoryError::StopFailed {
            name: server.library.to_string(),
            stderr: output.diagnostic().trim().to_string(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afsctl_events::channel;
    use afsctl_gateway::testing::ScriptedGateway;
    use serde_json::json;

    #[tokio::test]
    async fn library_without_pid_data_area_reads_as_never_started() {
        let gateway = ScriptedGateway::new();
        let library = LibraryName::new("JETTY").unwrap();

        let server = load_jetty_server(&gateway, &library).await.unwrap();
        assert!(!server.running);
        assert!(server.job.is_none());
        // No SQL was issued for the missing data area.
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn splits_the_pid_data_area_into_a_job_triple() {
        let gateway = ScriptedGateway::new();
        gateway.add_object("JETTY", "JETTY_PID", "*DTAARA");
        gateway.respond_sql(
            "JETTY_PID",
            vec![json!({
                "JOB_NUMBER": "123456",
                "JOB_USER": "QTMHHTTP  ",
                "JOB_NAME": "JETTY     ",
                "V_JOB_STATUS": "*ACTIVE",
                "V_ACTIVE_JOB_STATUS": "PGM"
            })
            .as_object()
            .unwrap()
            .clone()],
        );

        let library = LibraryName::new("JETTY").unwrap();
        let server = load_jetty_server(&gateway, &library).await.unwrap();
        assert!(server.running);
        let job = server.job.unwrap();
        assert_eq!(job.triple(), "123456/QTMHHTTP/JETTY");
        assert_eq!(job.status.as_deref(), Some("PGM"));
    }

    #[tokio::test]
    async fn start_and_stop_run_under_the_library_scope() {
        let gateway = ScriptedGateway::new();
        let (tx, _rx) = channel();
        let server = JettyServer {
            library: LibraryName::new("JETTY").unwrap(),
            running: false,
            job: None,
        };

        start_jetty(&gateway, &tx, &server).await.unwrap();
        stop_jetty(&gateway, &tx, &server).await.unwrap();

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            afsctl_gateway::testing::GatewayCall::Command {
                command: "STRJTYSVR".to_string(),
                library: Some("JETTY".to_string()),
            }
        );
        assert_eq!(
            calls[1],
            afsctl_gateway::testing::GatewayCall::Command {
                command: "ENDJTYSVR".to_string(),
                library: Some("JETTY".to_string()),
            }
        );
    }
}
