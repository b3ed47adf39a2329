//! Jar-based server installation and update
//!
//! AFS and Jetty servers ship as an unattended Java installer. The jar is
//! uploaded into a scoped work directory and run with the assembled
//! `-D` properties; a fresh install then rewrites the installed
//! `.properties` file so the chosen values survive the first start.

use afsctl_errors::{Error, InstallError};
use afsctl_events::{AppEvent, EventEmitter, InstallEvent, InstallPlan, ProgressWeight};
use afsctl_gateway::{sh_quote, unique_work_directory, with_temp_directory, RemoteGateway};
use afsctl_types::{AfsServer, IfsPath};

use crate::params::InstallerParameters;

fn emit_finished(
    events: &impl EventEmitter,
    operation: &str,
    success: bool,
    stdout: &str,
    stderr: &str,
) {
    events.emit(AppEvent::Install(InstallEvent::Finished {
        operation: operation.to_string(),
        success,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }));
}

/// Install a server from an unattended installer jar.
///
/// `install_path_key` names the property holding the target IFS folder
/// (`install.directory` for both AFS and Jetty packages); the freshly
/// installed `.properties` file under that folder is rewritten with the
/// full parameter set.
///
/// Returns whether the installation process succeeded; the captured
/// installer output travels with the finish event either way.
///
/// # Errors
///
/// Returns an error when the work directory cannot be prepared, the upload
/// fails, or the parameter set lacks `install_path_key`.
pub async fn install_server(
    gateway: &dyn RemoteGateway,
    events: &impl EventEmitter,
    package: &std::path::Path,
    params: &InstallerParameters,
    install_path_key: &str,
    temp_base: &str,
) -> Result<bool, Error> {
    let install_path = params
        .get(install_path_key)
        .ok_or_else(|| Error::internal(format!("missing installer property {install_path_key}")))?
        .to_string();
    let plan = InstallPlan::thirds(
        "uploading installation package",
        "running installation process",
        "finishing",
    );
    let work = unique_work_directory(temp_base)?;

    with_temp_directory(gateway, &work, |work| async move {
        let weights = plan.weights();
        events.emit_phase(weights[0].label, weights[0].increment);
        let setup = work.join("setup.jar")?;
        gateway
            .upload(package, &setup)
            .await
            .map_err(|e| InstallError::UploadFailed {
                message: e.to_string(),
            })?;

        events.emit_phase(weights[1].label, weights[1].increment);
        let command = format!(
            "java {} -jar {} --unattended && echo {} > $(ls {}/*.properties)",
            params.java_args(),
            sh_quote(setup.as_str()),
            sh_quote(params.properties_content().trim_end()),
            sh_quote(&install_path),
        );
        let output = gateway.run_shell(&command, Some(&work)).await?;

        events.emit_phase(weights[2].label, weights[2].increment);
        emit_finished(
            events,
            "server installation",
            output.success(),
            &output.stdout,
            &output.stderr,
        );
        Ok(output.success())
    })
    .await
}

/// Update an installed AFS server in place, then run its database update
/// script from the instance's `tools` directory.
///
/// Returns whether both steps succeeded.
///
/// # Errors
///
/// Returns an error when the work directory cannot be prepared or the
/// upload fails.
pub async fn update_server(
    gateway: &dyn RemoteGateway,
    events: &impl EventEmitter,
    package: &std::path::Path,
    server: &AfsServer,
    temp_base: &str,
) -> Result<bool, Error> {
    let plan = InstallPlan::new(vec![
        ProgressWeight {
            label: "uploading installation package",
            increment: 25,
        },
        ProgressWeight {
            label: "running update process",
            increment: 25,
        },
        ProgressWeight {
            label: "running database update process",
            increment: 25,
        },
        ProgressWeight {
            label: "finishing",
            increment: 25,
        },
    ]);
    let work = unique_work_directory(temp_base)?;
    let ifs_path = server.ifs_path.clone();

    with_temp_directory(gateway, &work, |work| async move {
        let weights = plan.weights();
        events.emit_phase(weights[0].label, weights[0].increment);
        let setup = work.join("setup.jar")?;
        gateway
            .upload(package, &setup)
            .await
            .map_err(|e| InstallError::UploadFailed {
                message: e.to_string(),
            })?;

        events.emit_phase(weights[1].label, weights[1].increment);
        let command = format!(
            "java -D{} -jar {} --unattended",
            sh_quote(&format!("install.directory={ifs_path}")),
            sh_quote(setup.as_str()),
        );
        let mut output = gateway.run_shell(&command, Some(&work)).await?;

        if output.success() {
            events.emit_phase(weights[2].label, weights[2].increment);
            let tools = IfsPath::new(&format!("{ifs_path}/tools"))?;
            output = gateway.run_shell("dbupdate.sh", Some(&tools)).await?;
        }

        events.emit_phase(weights[3].label, weights[3].increment);
        emit_finished(
            events,
            "server update",
            output.success(),
            &output.stdout,
            &output.stderr,
        );
        Ok(output.success())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::afs_install_parameters;
    use afsctl_events::channel;
    use afsctl_gateway::testing::{GatewayCall, ScriptedGateway};
    use afsctl_types::{AfsInstallRequest, JobStatus, LibraryName, ServerConfiguration};
    use std::path::PathBuf;

    fn sample_server() -> AfsServer {
        AfsServer {
            library: LibraryName::new("AFSLIB").unwrap(),
            name: "AFSDEMO".to_string(),
            jobq_name: "QBATCH".to_string(),
            jobq_library: "QGPL".to_string(),
            ifs_path: "/opt/afs/demo".to_string(),
            user: "QSECOFR".to_string(),
            java_props: String::new(),
            java_home: String::new(),
            job: JobStatus {
                job_name: "AFSDEMO".to_string(),
                job_user: "QSECOFR".to_string(),
                job_number: "000001".to_string(),
                status: None,
            },
            running: false,
            configuration: ServerConfiguration::default(),
        }
    }

    #[tokio::test]
    async fn install_uploads_then_runs_the_unattended_installer() {
        let gateway = ScriptedGateway::new();
        let (tx, mut rx) = channel();
        let params = afs_install_parameters(&AfsInstallRequest {
            ifs_path: "/opt/afs/new".to_string(),
            user: "AFSUSER".to_string(),
            ..AfsInstallRequest::default()
        });

        let ok = install_server(
            &gateway,
            &tx,
            &PathBuf::from("setup.jar"),
            &params,
            "install.directory",
            "/tmp",
        )
        .await
        .unwrap();
        assert!(ok);

        let uploads = gateway.uploads();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].ends_with("/setup.jar"));

        let java = gateway
            .shell_commands()
            .into_iter()
            .find(|c| c.contains("--unattended"))
            .unwrap();
        assert!(java.contains("-D'install.directory=/opt/afs/new'"));
        assert!(java.contains("-D'afs.https.port=0'"));
        assert!(java.contains("> $(ls '/opt/afs/new'/*.properties)"));

        // upload ran inside the scoped work directory
        let in_work = gateway.calls().iter().any(|call| {
            matches!(call, GatewayCall::Shell { directory: Some(d), .. } if d.starts_with("/tmp/afsctl-"))
        });
        assert!(in_work);

        rx.close();
        let mut finished = false;
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::Install(InstallEvent::Finished { success, .. }) = event {
                finished = true;
                assert!(success);
            }
        }
        assert!(finished);
    }

    #[tokio::test]
    async fn failed_upload_aborts_before_the_installer_runs() {
        let gateway = ScriptedGateway::new();
        gateway.fail_upload_matching("setup.jar");
        let (tx, _rx) = channel();
        let params = afs_install_parameters(&AfsInstallRequest {
            ifs_path: "/opt/afs/new".to_string(),
            user: "AFSUSER".to_string(),
            ..AfsInstallRequest::default()
        });

        let err = install_server(
            &gateway,
            &tx,
            &PathBuf::from("setup.jar"),
            &params,
            "install.directory",
            "/tmp",
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("upload"));
        assert!(gateway
            .shell_commands()
            .iter()
            .all(|c| !c.contains("--unattended")));
        // Work directory cleanup still ran.
        assert!(gateway
            .shell_commands()
            .last()
            .unwrap()
            .starts_with("rm -rf"));
    }

    #[tokio::test]
    async fn update_chases_the_installer_with_dbupdate() {
        let gateway = ScriptedGateway::new();
        let (tx, _rx) = channel();

        let ok = update_server(
            &gateway,
            &tx,
            &PathBuf::from("setup.jar"),
            &sample_server(),
            "/tmp",
        )
        .await
        .unwrap();
        assert!(ok);

        let dbupdate = gateway.calls().into_iter().find_map(|call| match call {
            GatewayCall::Shell { command, directory } if command == "dbupdate.sh" => {
                Some(directory)
            }
            _ => None,
        });
        assert_eq!(dbupdate, Some(Some("/opt/afs/demo/tools".to_string())));
    }

    #[tokio::test]
    async fn update_skips_dbupdate_when_the_installer_fails() {
        let gateway = ScriptedGateway::new();
        gateway.fail_shell_matching("--unattended", 1, "install blew up");
        let (tx, _rx) = channel();

        let ok = update_server(
            &gateway,
            &tx,
            &PathBuf::from("setup.jar"),
            &sample_server(),
            "/tmp",
        )
        .await
        .unwrap();
        assert!(!ok);
        assert!(gateway
            .shell_commands()
            .iter()
            .all(|c| c != "dbupdate.sh"));
    }
}
