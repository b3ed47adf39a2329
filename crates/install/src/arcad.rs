//! ARCAD product install and update orchestration
//!
//! A distribution package is staged into a scoped work directory, restored
//! into a transient library, and handed to the native `ARCINST` installer
//! program. The workflow is strictly linear:
//!
//! `UPLOADING → EXTRACTING → RESTORING → INVOKING`
//!
//! The transient library gets a unique per-invocation name, so concurrent
//! installs against the same host cannot collide, and its deletion is
//! issued exactly once on every exit path after the restore begins.
//! Remote-command failures end the run with a `false` result and the
//! failing step's output preserved in the finish event; only infrastructure
//! failures (work directory, upload) surface as errors.

use afsctl_errors::{Error, InstallError, InstallPhase, PackageError};
use afsctl_events::{AppEvent, EventEmitter, InstallEvent, InstallPlan, ProgressWeight};
use afsctl_gateway::{
    sh_quote, unique_work_directory, with_temp_directory, CommandOutput, RemoteGateway,
};
use afsctl_types::{
    ArcadInstance, ArcadPackage, IfsPath, InstanceCode, LibraryName, ObjectName, PackageType,
    PayloadRef,
};
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// Installer language selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    French,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::English => write!(f, "ENG"),
            Self::French => write!(f, "FRA"),
        }
    }
}

/// Parameters of a fresh master installation.
#[derive(Debug, Clone)]
pub struct MasterInstall {
    pub instance: InstanceCode,
    pub language: Language,
    /// Omitted when it matches the main language.
    pub secondary_language: Option<Language>,
    pub demo: bool,
    /// Target auxiliary storage pool device; system ASP when absent.
    pub asp: Option<ObjectName>,
}

/// What the installer program is asked to do.
#[derive(Debug, Clone)]
pub enum ArcadTarget {
    Master(MasterInstall),
    Update { instance: InstanceCode },
}

impl ArcadTarget {
    /// Flatten the target into the installer's `KEY(value)` string. The
    /// message-language override and the save-file reference always lead.
    fn installer_keys(&self, library: &LibraryName, save_file: &str) -> String {
        let mut keys = format!("MSGLNG(ENG) SAVF({library}/{save_file})");
        match self {
            Self::Master(master) => {
                keys.push_str(&format!(
                    " INSTANCE({}) LANG1({})",
                    master.instance, master.language
                ));
                if let Some(lang2) = master
                    .secondary_language
                    .filter(|lang2| *lang2 != master.language)
                {
                    keys.push_str(&format!(" LANG2({lang2})"));
                }
                if master.demo {
                    keys.push_str(" DEMO(*YES)");
                }
                if let Some(asp) = &master.asp {
                    keys.push_str(&format!(" ASP({asp})"));
                }
            }
            Self::Update { instance } => {
                keys.push_str(&format!(" INSTANCE({instance})"));
            }
        }
        keys
    }
}

/// Reject an instance code that is already registered.
///
/// # Errors
///
/// Returns [`InstallError::InstanceCodeTaken`] on a collision.
pub fn verify_instance_code_free(
    code: InstanceCode,
    registered: &[InstanceCode],
) -> Result<(), Error> {
    if registered.contains(&code) {
        return Err(InstallError::InstanceCodeTaken {
            code: code.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Check that a cumulative package applies on top of the instance's
/// current version.
///
/// # Errors
///
/// Returns [`PackageError::NotSuitable`] for a master package and
/// [`InstallError::VersionMismatch`] when the versions do not line up.
pub fn verify_update_applies(package: &ArcadPackage, instance: &ArcadInstance) -> Result<(), Error> {
    let Some(from_version) = package.from_version else {
        return Err(PackageError::NotSuitable {
            path: package.payload.file_name().to_string(),
        }
        .into());
    };
    if from_version != instance.version {
        return Err(InstallError::VersionMismatch {
            instance: instance.code.to_string(),
            expected: from_version.to_string(),
            actual: instance.version.to_string(),
        }
        .into());
    }
    Ok(())
}

/// A unique transient library name for one orchestration run.
fn transient_library() -> Result<LibraryName, Error> {
    let token = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    Ok(LibraryName::new(&format!("ARCI{}", &token[..6]))?)
}

fn progress_plan(package: &ArcadPackage) -> InstallPlan {
    let mut weights = vec![ProgressWeight {
        label: "uploading package",
        increment: if package.container.is_some() { 25 } else { 40 },
    }];
    if package.container.is_some() {
        weights.push(ProgressWeight {
            label: "extracting package",
            increment: 15,
        });
    }
    weights.push(ProgressWeight {
        label: "restoring installation library",
        increment: 30,
    });
    weights.push(ProgressWeight {
        label: "running installer",
        increment: 30,
    });
    InstallPlan::new(weights)
}

fn operation_label(package: &ArcadPackage) -> &'static str {
    match package.package_type {
        PackageType::Master => "ARCAD installation",
        PackageType::Cumulative => "ARCAD update",
    }
}

enum Outcome {
    Completed(CommandOutput),
    Failed {
        phase: InstallPhase,
        output: CommandOutput,
    },
}

/// Install a master package or apply a cumulative one.
///
/// Returns whether the installer program succeeded; its combined output
/// travels with the finish event on both outcomes.
///
/// # Errors
///
/// Returns an error when the work directory cannot be prepared, an upload
/// fails, or the package references an unreadable local file.
pub async fn install_arcad(
    gateway: &dyn RemoteGateway,
    events: &impl EventEmitter,
    package: &ArcadPackage,
    target: &ArcadTarget,
    temp_base: &str,
) -> Result<bool, Error> {
    let plan = progress_plan(package);
    let work = unique_work_directory(temp_base)?;
    let operation = operation_label(package);

    with_temp_directory(gateway, &work, |work| async move {
        let weights = plan.weights();
        let upload_w = weights[0];
        let extract_w = package.container.is_some().then_some(weights[1]);
        let restore_w = weights[weights.len() - 2];
        let invoke_w = weights[weights.len() - 1];

        events.emit_phase(upload_w.label, upload_w.increment);
        if let Some(failed) = stage_payload(gateway, events, package, &work, extract_w).await? {
            warn!(phase = %failed.phase, "staging failed");
            emit_finished(events, operation, &failed);
            return Ok(false);
        }

        let library = transient_library()?;
        let outcome = restore_and_invoke(
            gateway,
            events,
            package,
            target,
            &work,
            &library,
            restore_w,
            invoke_w,
        )
        .await;

        // The transient library is dropped on every path; a failed drop is
        // logged and never masks the primary result.
        match gateway
            .run_command(&format!("DLTLIB LIB({library})"), None)
            .await
        {
            Ok(drop) if !drop.success() => {
                warn!(library = %library, stderr = %drop.stderr, "transient library cleanup failed");
            }
            Err(e) => {
                warn!(library = %library, error = %e, "transient library cleanup failed");
            }
            Ok(_) => {}
        }

        match outcome? {
            Outcome::Completed(output) => {
                let success = output.success();
                events.emit(AppEvent::Install(InstallEvent::Finished {
                    operation: operation.to_string(),
                    success,
                    stdout: output.stdout,
                    stderr: output.stderr,
                }));
                Ok(success)
            }
            Outcome::Failed { phase, output } => {
                warn!(phase = %phase, "orchestration failed");
                emit_finished(
                    events,
                    operation,
                    &Failed {
                        phase,
                        output,
                    },
                );
                Ok(false)
            }
        }
    })
    .await
}

/// Apply a cumulative package to a registered instance after checking that
/// the versions line up.
///
/// # Errors
///
/// Propagates [`verify_update_applies`] failures and everything
/// [`install_arcad`] can return.
pub async fn update_arcad(
    gateway: &dyn RemoteGateway,
    events: &impl EventEmitter,
    package: &ArcadPackage,
    instance: &ArcadInstance,
    temp_base: &str,
) -> Result<bool, Error> {
    verify_update_applies(package, instance)?;
    install_arcad(
        gateway,
        events,
        package,
        &ArcadTarget::Update {
            instance: instance.code,
        },
        temp_base,
    )
    .await
}

struct Failed {
    phase: InstallPhase,
    output: CommandOutput,
}

fn emit_finished(events: &impl EventEmitter, operation: &str, failed: &Failed) {
    events.emit(AppEvent::Install(InstallEvent::Finished {
        operation: operation.to_string(),
        success: false,
        stdout: failed.output.stdout.clone(),
        stderr: format!(
            "{} phase failed: {}",
            failed.phase,
            failed.output.diagnostic().trim()
        ),
    }));
}

/// Bring the descriptor and payload stream files into the work directory
/// under their bare names. Returns the failing step for remote command
/// failures; uploads that throw are infrastructure errors.
async fn stage_payload(
    gateway: &dyn RemoteGateway,
    events: &impl EventEmitter,
    package: &ArcadPackage,
    work: &IfsPath,
    extract_weight: Option<ProgressWeight>,
) -> Result<Option<Failed>, Error> {
    match (&package.container, &package.descriptor, &package.payload) {
        (Some(container), PayloadRef::ZipEntry(descriptor), PayloadRef::ZipEntry(payload)) => {
            let archive = work.join("package.zip")?;
            upload(gateway, container, &archive).await?;

            if let Some(w) = extract_weight {
                events.emit_phase(w.label, w.increment);
            }
            let extract = gateway
                .run_shell(
                    &format!("jar xf {}", sh_quote(archive.as_str())),
                    Some(work),
                )
                .await?;
            if !extract.success() {
                return Ok(Some(Failed {
                    phase: InstallPhase::Extracting,
                    output: extract,
                }));
            }

            // Archive entries may carry nested path prefixes; pull the two
            // files we need up to the work directory root.
            let nested: Vec<&String> = [descriptor, payload]
                .into_iter()
                .filter(|entry| entry.contains('/'))
                .collect();
            if !nested.is_empty() {
                let moves: Vec<String> = nested
                    .iter()
                    .map(|entry| sh_quote(&format!("{work}/{entry}")))
                    .collect();
                let normalize = gateway
                    .run_shell(
                        &format!("mv {} {}", moves.join(" "), sh_quote(work.as_str())),
                        None,
                    )
                    .await?;
                if !normalize.success() {
                    return Ok(Some(Failed {
                        phase: InstallPhase::Extracting,
                        output: normalize,
                    }));
                }
            }
        }
        (None, PayloadRef::File(descriptor), PayloadRef::File(payload)) => {
            let descriptor_target = work.join(package.descriptor.file_name())?;
            upload(gateway, descriptor, &descriptor_target).await?;
            let payload_target = work.join(package.payload.file_name())?;
            upload(gateway, payload, &payload_target).await?;
        }
        _ => {
            return Err(Error::internal(
                "package payload references do not match its container",
            ))
        }
    }
    Ok(None)
}

async fn upload(
    gateway: &dyn RemoteGateway,
    local: &std::path::Path,
    remote: &IfsPath,
) -> Result<(), Error> {
    gateway
        .upload(local, remote)
        .await
        .map_err(|e| InstallError::UploadFailed {
            message: e.to_string(),
        })?;
    Ok(())
}

/// The RESTORING and INVOKING phases. Steps chain with "and" semantics:
/// the first failing step aborts the rest and is returned as the outcome.
#[allow(clippy::too_many_arguments)]
async fn restore_and_invoke(
    gateway: &dyn RemoteGateway,
    events: &impl EventEmitter,
    package: &ArcadPackage,
    target: &ArcadTarget,
    work: &IfsPath,
    library: &LibraryName,
    restore_weight: ProgressWeight,
    invoke_weight: ProgressWeight,
) -> Result<Outcome, Error> {
    events.emit_phase(restore_weight.label, restore_weight.increment);
    let save_file = package.save_file_name();
    let staging = library.as_str();

    // A leftover library from an interrupted run would break the restore.
    let library_object = ObjectName::new(library.as_str())?;
    let qsys = LibraryName::new("QSYS")?;
    if gateway.object_exists(&qsys, &library_object, "*LIB").await {
        gateway
            .run_command(&format!("DLTLIB LIB({library})"), None)
            .await?;
    }

    let descriptor = package.descriptor.file_name();
    let payload = package.payload.file_name();
    let steps = [
        format!(
            "CPYFRMSTMF FROMSTMF('{work}/{descriptor}') TOMBR('/QSYS.LIB/QGPL.LIB/{staging}.FILE') MBROPT(*REPLACE)"
        ),
        format!("RSTLIB SAVLIB(ARCINST) DEV(*SAVF) SAVF(QGPL/{staging}) RSTLIB({library})"),
        format!("DLTF FILE(QGPL/{staging})"),
        format!(
            "CPYFRMSTMF FROMSTMF('{work}/{payload}') TOMBR('/QSYS.LIB/{library}.LIB/{save_file}.FILE') MBROPT(*REPLACE)"
        ),
    ];
    for step in steps {
        let output = gateway.run_command(&step, None).await?;
        if !output.success() {
            return Ok(Outcome::Failed {
                phase: InstallPhase::Restoring,
                output,
            });
        }
    }

    events.emit_phase(invoke_weight.label, invoke_weight.increment);
    let keys = target.installer_keys(library, &save_file);
    let invoke = format!(
        "CALL PGM({library}/ARCINST) PARM('/QSYS.LIB/{library}.LIB/{save_file}.FILE' '{keys}')"
    );
    let output = gateway.run_command(&invoke, None).await?;
    if output.success() {
        Ok(Outcome::Completed(output))
    } else {
        Ok(Outcome::Failed {
            phase: InstallPhase::Invoking,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afsctl_events::channel;
    use afsctl_gateway::testing::ScriptedGateway;
    use afsctl_types::ArcadVersion;
    use std::path::PathBuf;

    fn master_loose() -> ArcadPackage {
        ArcadPackage {
            package_type: PackageType::Master,
            container: None,
            descriptor: PayloadRef::File(PathBuf::from("/media/ARCINST.DTA")),
            payload: PayloadRef::File(PathBuf::from(
                "/media/MSTARC 12.34.56 V1R2M0 MASTER ENG FRA.DTA",
            )),
            version: ArcadVersion::parse("12.34.56").unwrap(),
            from_version: None,
        }
    }

    fn cumulative_zip() -> ArcadPackage {
        ArcadPackage {
            package_type: PackageType::Cumulative,
            container: Some(PathBuf::from("/media/cume.zip")),
            descriptor: PayloadRef::ZipEntry("disk1/ARCINST.DTA".to_string()),
            payload: PayloadRef::ZipEntry("disk1/CUMARC 12.34.56-12.35.00 V1R2M0.DTA".to_string()),
            version: ArcadVersion::parse("12.35.00").unwrap(),
            from_version: Some(ArcadVersion::parse("12.34.56").unwrap()),
        }
    }

    fn master_target() -> ArcadTarget {
        ArcadTarget::Master(MasterInstall {
            instance: InstanceCode::new("ZZ").unwrap(),
            language: Language::English,
            secondary_language: None,
            demo: true,
            asp: None,
        })
    }

    fn drain_finished(rx: &mut afsctl_events::EventReceiver) -> Option<(bool, String, String)> {
        rx.close();
        let mut finished = None;
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::Install(InstallEvent::Finished {
                success,
                stdout,
                stderr,
                ..
            }) = event
            {
                finished = Some((success, stdout, stderr));
            }
        }
        finished
    }

    #[test]
    fn master_keys_carry_the_full_parameter_set() {
        let library = LibraryName::new("ARCI123456").unwrap();
        let keys = master_target().installer_keys(&library, "MST_123456");
        assert_eq!(
            keys,
            "MSGLNG(ENG) SAVF(ARCI123456/MST_123456) INSTANCE(ZZ) LANG1(ENG) DEMO(*YES)"
        );
    }

    #[test]
    fn update_keys_carry_only_the_instance_code() {
        let library = LibraryName::new("ARCI123456").unwrap();
        let target = ArcadTarget::Update {
            instance: InstanceCode::new("AD").unwrap(),
        };
        assert_eq!(
            target.installer_keys(&library, "CUME123500"),
            "MSGLNG(ENG) SAVF(ARCI123456/CUME123500) INSTANCE(AD)"
        );
    }

    #[test]
    fn matching_secondary_language_is_dropped() {
        let library = LibraryName::new("ARCI123456").unwrap();
        let target = ArcadTarget::Master(MasterInstall {
            instance: InstanceCode::new("ZZ").unwrap(),
            language: Language::French,
            secondary_language: Some(Language::French),
            demo: false,
            asp: Some(ObjectName::new("IASP33").unwrap()),
        });
        assert_eq!(
            target.installer_keys(&library, "MST_123456"),
            "MSGLNG(ENG) SAVF(ARCI123456/MST_123456) INSTANCE(ZZ) LANG1(FRA) ASP(IASP33)"
        );
    }

    #[test]
    fn taken_instance_codes_are_rejected() {
        let taken = vec![InstanceCode::new("AD").unwrap()];
        assert!(verify_instance_code_free(InstanceCode::new("ZZ").unwrap(), &taken).is_ok());
        assert!(verify_instance_code_free(InstanceCode::new("AD").unwrap(), &taken).is_err());
    }

    #[test]
    fn update_version_checks() {
        let package = cumulative_zip();
        let mut instance = ArcadInstance {
            code: InstanceCode::new("AD").unwrap(),
            text: String::new(),
            library: LibraryName::new("ARCAD_PRD").unwrap(),
            iasp: None,
            version: ArcadVersion::parse("12.34.56").unwrap(),
        };
        assert!(verify_update_applies(&package, &instance).is_ok());

        instance.version = ArcadVersion::parse("12.30.00").unwrap();
        assert!(verify_update_applies(&package, &instance).is_err());
        assert!(verify_update_applies(&master_loose(), &instance).is_err());
    }

    #[tokio::test]
    async fn successful_install_drops_the_transient_library_once() {
        let gateway = ScriptedGateway::new();
        gateway.respond_command("CALL PGM", CommandOutput::ok("installation complete"));
        let (tx, mut rx) = channel();

        let ok = install_arcad(&gateway, &tx, &master_loose(), &master_target(), "/tmp")
            .await
            .unwrap();
        assert!(ok);

        let commands = gateway.cl_commands();
        assert_eq!(
            commands
                .iter()
                .filter(|c| c.starts_with("DLTLIB LIB(ARCI"))
                .count(),
            1
        );
        let invoke = commands.iter().find(|c| c.starts_with("CALL PGM")).unwrap();
        assert!(invoke.contains("/ARCINST)"));
        assert!(invoke.contains("SAVF("));
        assert!(invoke.contains("INSTANCE(ZZ)"));

        // Both stream files were uploaded under their bare names.
        let uploads = gateway.uploads();
        assert_eq!(uploads.len(), 2);
        assert!(uploads[0].ends_with("/ARCINST.DTA"));
        assert!(uploads[1].ends_with("/MSTARC 12.34.56 V1R2M0 MASTER ENG FRA.DTA"));

        let (success, stdout, _) = drain_finished(&mut rx).unwrap();
        assert!(success);
        assert_eq!(stdout, "installation complete");
    }

    #[tokio::test]
    async fn restore_failure_skips_invoke_but_still_drops_the_library() {
        let gateway = ScriptedGateway::new();
        gateway.fail_command_matching("RSTLIB SAVLIB(ARCINST)", 1, "CPF3773 objects not restored");
        let (tx, mut rx) = channel();

        let ok = install_arcad(&gateway, &tx, &master_loose(), &master_target(), "/tmp")
            .await
            .unwrap();
        assert!(!ok);

        let commands = gateway.cl_commands();
        assert!(commands.iter().all(|c| !c.starts_with("CALL PGM")));
        assert!(commands.iter().all(|c| !c.starts_with("DLTF")));
        assert_eq!(
            commands
                .iter()
                .filter(|c| c.starts_with("DLTLIB LIB(ARCI"))
                .count(),
            1
        );

        let (success, _, stderr) = drain_finished(&mut rx).unwrap();
        assert!(!success);
        assert!(stderr.contains("CPF3773"));
    }

    #[tokio::test]
    async fn zip_packages_are_extracted_and_normalized() {
        let gateway = ScriptedGateway::new();
        let (tx, _rx) = channel();
        let target = ArcadTarget::Update {
            instance: InstanceCode::new("AD").unwrap(),
        };

        let ok = install_arcad(&gateway, &tx, &cumulative_zip(), &target, "/tmp")
            .await
            .unwrap();
        assert!(ok);

        let uploads = gateway.uploads();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].ends_with("/package.zip"));

        let shells = gateway.shell_commands();
        assert!(shells.iter().any(|c| c.starts_with("jar xf ")));
        let normalize = shells.iter().find(|c| c.starts_with("mv ")).unwrap();
        assert!(normalize.contains("disk1/ARCINST.DTA"));
        assert!(normalize.contains("disk1/CUMARC 12.34.56-12.35.00 V1R2M0.DTA"));

        // The cumulative payload lands under its dot-stripped save-file name.
        assert!(gateway
            .cl_commands()
            .iter()
            .any(|c| c.contains("CUME123500.FILE")));
    }

    #[tokio::test]
    async fn work_directory_failure_stops_everything() {
        let gateway = ScriptedGateway::new();
        gateway.fail_shell_matching("mkdir -p", 1, "no space");
        let (tx, _rx) = channel();

        let result = install_arcad(&gateway, &tx, &master_loose(), &master_target(), "/tmp").await;
        assert!(result.is_err());
        assert!(gateway.cl_commands().is_empty());
        assert!(gateway.uploads().is_empty());
    }
}
