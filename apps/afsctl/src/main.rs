//! afsctl - manage AFS, Jetty and ARCAD server products on IBM i hosts
//!
//! The CLI connects to the configured host over SSH, runs the requested
//! inventory or orchestration operation, and renders the event stream and
//! final result.

mod cli;
mod display;
mod error;
mod events;

use crate::cli::{Cli, Commands, JettyCommands};
use crate::display::{OperationResult, OutputRenderer};
use crate::error::CliError;
use crate::events::EventHandler;
use afsctl_config::{Config, RestartPolicy};
use afsctl_events::{EventReceiver, EventSender};
use afsctl_gateway::{RemoteGateway, SshGateway};
use afsctl_install::{ArcadTarget, MasterInstall};
use afsctl_types::{
    AfsInstallRequest, AfsServer, AfsServerUpdate, ArcadInstance, IfsPath, InstanceCode,
    JettyInstallRequest, LibraryName, ObjectName, PackageType,
};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("application error: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    info!("starting afsctl v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_or_default(&config_path(cli.global.config.as_deref())).await?;
    if let Some(host) = cli.global.host {
        config.connection.host = host;
    }

    let host = config.require_host()?.to_string();
    let gateway = SshGateway::connect(
        &host,
        config.connection.user.as_deref(),
        config.connection.port,
    )
    .await?;

    let (event_sender, event_receiver) = afsctl_events::channel();
    let mut event_handler = EventHandler::new(
        !cli.global.json && console::Term::stderr().features().colors_supported(),
        cli.global.debug,
    );

    let ctx = Ctx {
        gateway: &gateway,
        events: event_sender,
        config: &config,
        host: &host,
    };

    let result =
        execute_command_with_events(cli.command, &ctx, event_receiver, &mut event_handler).await?;

    // Orchestration outcomes travel through the event stream; fold the last
    // one into the final result so it is rendered with the installer output.
    let result = match event_handler.take_finished() {
        Some(finished) => OperationResult::Orchestration(finished),
        None => result,
    };

    let failed = matches!(&result, OperationResult::Orchestration(f) if !f.success);
    OutputRenderer::new(cli.global.json).render_result(&result)?;

    info!("command completed");
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Everything a command needs to run.
struct Ctx<'a> {
    gateway: &'a SshGateway,
    events: EventSender,
    config: &'a Config,
    host: &'a str,
}

impl Ctx<'_> {
    fn gateway(&self) -> &dyn RemoteGateway {
        self.gateway
    }

    fn temp_base(&self) -> &str {
        &self.config.remote.temp_dir
    }
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    ctx: &Ctx<'_>,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ctx));

    loop {
        select! {
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(command: Commands, ctx: &Ctx<'_>) -> Result<OperationResult, CliError> {
    match command {
        Commands::Locations => {
            let locations = afsctl_inventory::find_locations(ctx.gateway()).await?;
            Ok(OperationResult::Locations(locations))
        }

        Commands::Servers { library } => {
            let library = LibraryName::new(&library).map_err(afsctl_errors::Error::from)?;
            let servers = afsctl_inventory::list_servers(ctx.gateway(), &library).await?;
            Ok(OperationResult::Servers(servers))
        }

        Commands::Instances => {
            let instances = afsctl_inventory::list_instances(ctx.gateway()).await?;
            Ok(OperationResult::Instances(instances))
        }

        Commands::Start {
            library,
            name,
            debug_port,
        } => {
            let server = find_server(ctx, &library, &name).await?;
            afsctl_inventory::start_server(ctx.gateway(), &ctx.events, &server, debug_port).await?;
            Ok(OperationResult::Success(format!("{name} started")))
        }

        Commands::Stop { library, name } => {
            let server = find_server(ctx, &library, &name).await?;
            afsctl_inventory::stop_server(ctx.gateway(), &ctx.events, &server).await?;
            Ok(OperationResult::Success(format!("{name} stopped")))
        }

        Commands::Delete {
            library,
            name,
            keep_ifs,
        } => {
            let server = find_server(ctx, &library, &name).await?;
            afsctl_inventory::delete_server(ctx.gateway(), &ctx.events, &server, !keep_ifs).await?;
            Ok(OperationResult::Success(format!("{name} deleted")))
        }

        Commands::Change {
            library,
            name,
            user,
            jobq,
            jobq_library,
            ifs_path,
            java_home,
            java_props,
        } => {
            let server = find_server(ctx, &library, &name).await?;
            let update = AfsServerUpdate {
                user: user.unwrap_or_else(|| server.user.clone()),
                jobq_name: jobq.unwrap_or_else(|| server.jobq_name.clone()),
                jobq_library: jobq_library.unwrap_or_else(|| server.jobq_library.clone()),
                ifs_path: IfsPath::new(&ifs_path.unwrap_or_else(|| server.ifs_path.clone()))
                    .map_err(afsctl_errors::Error::from)?,
                java_home: java_home.unwrap_or_else(|| server.java_home.clone()),
                java_props: java_props.unwrap_or_else(|| server.java_props.clone()),
            };
            afsctl_inventory::change_server(ctx.gateway(), &ctx.events, &server, &update).await?;
            Ok(OperationResult::Success(format!("{name} changed")))
        }

        Commands::ClearConfig { library, name } => {
            let server = find_server(ctx, &library, &name).await?;
            afsctl_inventory::clear_configuration(
                ctx.gateway(),
                &ctx.events,
                &server,
                ctx.temp_base(),
            )
            .await?;
            Ok(OperationResult::Success(format!(
                "Configuration of {name} cleared"
            )))
        }

        Commands::ClearLogs { library, name } => {
            let server = find_server(ctx, &library, &name).await?;
            afsctl_inventory::clear_logs(ctx.gateway(), &ctx.events, &server).await?;
            Ok(OperationResult::Success(format!("Logs of {name} cleared")))
        }

        Commands::Probe {
            library,
            name,
            endpoint,
        } => {
            let server = find_server(ctx, &library, &name).await?;
            let value = afsctl_inventory::probe_rest(
                ctx.host,
                &server,
                &endpoint,
                Duration::from_millis(ctx.config.probe.timeout_ms),
            )
            .await?;
            Ok(OperationResult::Probe(value))
        }

        Commands::Jetty { command } => execute_jetty_command(command, ctx).await,

        Commands::InstallAfs {
            package,
            ifs_path,
            user,
            library,
            instance,
            port,
            jobq,
            jobq_library,
            iasp,
        } => {
            let request = AfsInstallRequest {
                ifs_path,
                user,
                library,
                instance,
                port,
                jobq_name: jobq,
                jobq_library,
                iasp,
            };
            let params = afsctl_install::afs_install_parameters(&request);
            afsctl_install::install_server(
                ctx.gateway(),
                &ctx.events,
                &package,
                &params,
                "install.directory",
                ctx.temp_base(),
            )
            .await?;
            Ok(OperationResult::Success("AFS server installed".to_string()))
        }

        Commands::InstallJetty {
            package,
            ifs_path,
            user,
            library,
            iasp,
            port,
        } => {
            let request = JettyInstallRequest {
                ifs_path,
                user,
                library,
                iasp,
                port,
            };
            let params = afsctl_install::jetty_install_parameters(&request);
            afsctl_install::install_server(
                ctx.gateway(),
                &ctx.events,
                &package,
                &params,
                "install.directory",
                ctx.temp_base(),
            )
            .await?;
            Ok(OperationResult::Success(
                "Jetty server installed".to_string(),
            ))
        }

        Commands::UpdateServer {
            package,
            library,
            name,
        } => update_server(ctx, &package, &library, &name).await,

        Commands::InstallArcad {
            package,
            instance,
            language,
            secondary_language,
            demo,
            asp,
        } => {
            let package = resolve_package(&package).await?;
            if package.package_type != PackageType::Master {
                return Err(CliError::InvalidArguments(format!(
                    "{} is a cumulative update; use update-arcad",
                    package.payload.file_name()
                )));
            }

            let code = InstanceCode::new(&instance).map_err(afsctl_errors::Error::from)?;
            let registered = afsctl_inventory::list_instance_codes(ctx.gateway()).await?;
            afsctl_install::verify_instance_code_free(code, &registered)?;

            let asp = match asp {
                Some(asp) => Some(ObjectName::new(&asp).map_err(afsctl_errors::Error::from)?),
                None => None,
            };
            let target = ArcadTarget::Master(MasterInstall {
                instance: code,
                language: language.into(),
                secondary_language: secondary_language.map(Into::into),
                demo,
                asp,
            });
            afsctl_install::install_arcad(
                ctx.gateway(),
                &ctx.events,
                &package,
                &target,
                ctx.temp_base(),
            )
            .await?;
            Ok(OperationResult::Success("ARCAD installed".to_string()))
        }

        Commands::UpdateArcad { package, instance } => {
            let package = resolve_package(&package).await?;
            let target = find_instance(ctx, &instance).await?;
            afsctl_install::update_arcad(
                ctx.gateway(),
                &ctx.events,
                &package,
                &target,
                ctx.temp_base(),
            )
            .await?;
            Ok(OperationResult::Success("ARCAD updated".to_string()))
        }
    }
}

async fn execute_jetty_command(
    command: JettyCommands,
    ctx: &Ctx<'_>,
) -> Result<OperationResult, CliError> {
    match command {
        JettyCommands::Status { library } => {
            let library = LibraryName::new(&library).map_err(afsctl_errors::Error::from)?;
            let server = afsctl_inventory::load_jetty_server(ctx.gateway(), &library).await?;
            Ok(OperationResult::Jetty(server))
        }
        JettyCommands::Start { library } => {
            let library = LibraryName::new(&library).map_err(afsctl_errors::Error::from)?;
            let server = afsctl_inventory::load_jetty_server(ctx.gateway(), &library).await?;
            afsctl_inventory::start_jetty(ctx.gateway(), &ctx.events, &server).await?;
            Ok(OperationResult::Success(format!(
                "Jetty server in {library} started"
            )))
        }
        JettyCommands::Stop { library } => {
            let library = LibraryName::new(&library).map_err(afsctl_errors::Error::from)?;
            let server = afsctl_inventory::load_jetty_server(ctx.gateway(), &library).await?;
            afsctl_inventory::stop_jetty(ctx.gateway(), &ctx.events, &server).await?;
            Ok(OperationResult::Success(format!(
                "Jetty server in {library} stopped"
            )))
        }
    }
}

/// Update an AFS server: a running server is stopped first, then restarted
/// afterwards according to the configured policy.
async fn update_server(
    ctx: &Ctx<'_>,
    package: &Path,
    library: &str,
    name: &str,
) -> Result<OperationResult, CliError> {
    let server = find_server(ctx, library, name).await?;
    let was_running = server.running;
    if was_running {
        afsctl_inventory::stop_server(ctx.gateway(), &ctx.events, &server).await?;
    }

    let updated =
        afsctl_install::update_server(ctx.gateway(), &ctx.events, package, &server, ctx.temp_base())
            .await?;

    if updated && was_running {
        match ctx.config.update.restart_after_update {
            RestartPolicy::Yes => {
                afsctl_inventory::start_server(ctx.gateway(), &ctx.events, &server, None).await?;
            }
            RestartPolicy::No | RestartPolicy::Ask => {
                eprintln!("{name} was stopped for the update; restart it with: afsctl start {library} {name}");
            }
        }
    }
    Ok(OperationResult::Success(format!("{name} updated")))
}

/// Resolve the selected file into a distribution package.
async fn resolve_package(path: &Path) -> Result<afsctl_types::ArcadPackage, CliError> {
    afsctl_package::resolve_package(path)
        .await?
        .ok_or_else(|| CliError::NotAPackage(path.display().to_string()))
}

/// Look up one AFS server by library and name.
async fn find_server(ctx: &Ctx<'_>, library: &str, name: &str) -> Result<AfsServer, CliError> {
    let library = LibraryName::new(library).map_err(afsctl_errors::Error::from)?;
    let servers = afsctl_inventory::list_servers(ctx.gateway(), &library).await?;
    servers
        .into_iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| CliError::ServerNotFound {
            library: library.to_string(),
            name: name.to_string(),
        })
}

/// Look up one ARCAD instance by code.
async fn find_instance(ctx: &Ctx<'_>, code: &str) -> Result<ArcadInstance, CliError> {
    let code = InstanceCode::new(code).map_err(afsctl_errors::Error::from)?;
    let instances = afsctl_inventory::list_instances(ctx.gateway()).await?;
    instances
        .into_iter()
        .find(|i| i.code == code)
        .ok_or_else(|| CliError::InstanceNotFound {
            code: code.to_string(),
        })
}

/// Resolve the configuration file path: an explicit `--config` wins,
/// otherwise `~/.config/afsctl/config.toml`.
fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let home = std::env::var_os("HOME").unwrap_or_default();
    PathBuf::from(home).join(".config/afsctl/config.toml")
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    if json_mode {
        // Keep stdout clean for the JSON result.
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
        return;
    }

    let default_filter = if debug_enabled_flag {
        "info,afsctl=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}
