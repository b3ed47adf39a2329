//! Command line interface definition

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// afsctl - manage AFS, Jetty and ARCAD server products on IBM i hosts
#[derive(Parser)]
#[command(name = "afsctl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage AFS, Jetty and ARCAD server products on IBM i hosts")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// SSH host to connect to (overrides the configuration file)
    #[arg(long, global = true, env = "AFSCTL_HOST")]
    pub host: Option<String>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Installer language selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LanguageArg {
    Eng,
    Fra,
}

impl From<LanguageArg> for afsctl_install::Language {
    fn from(value: LanguageArg) -> Self {
        match value {
            LanguageArg::Eng => Self::English,
            LanguageArg::Fra => Self::French,
        }
    }
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Scan the host for AFS and Jetty product libraries
    #[command(alias = "loc")]
    Locations,

    /// List the AFS servers registered in a product library
    #[command(alias = "ls")]
    Servers {
        /// Product library to inspect
        library: String,
    },

    /// List registered ARCAD instances
    Instances,

    /// Start an AFS server
    Start {
        /// Product library the server is registered in
        library: String,

        /// Server instance name
        name: String,

        /// Start the server with its debug port open
        #[arg(long, value_name = "PORT")]
        debug_port: Option<u16>,
    },

    /// Stop an AFS server
    Stop {
        /// Product library the server is registered in
        library: String,

        /// Server instance name
        name: String,
    },

    /// Delete an AFS server
    #[command(alias = "rm")]
    Delete {
        /// Product library the server is registered in
        library: String,

        /// Server instance name
        name: String,

        /// Keep the server's IFS directory
        #[arg(long)]
        keep_ifs: bool,
    },

    /// Change the settings of an AFS server
    Change {
        /// Product library the server is registered in
        library: String,

        /// Server instance name
        name: String,

        /// Run the server under this user profile
        #[arg(long)]
        user: Option<String>,

        /// Submit the server job to this job queue
        #[arg(long, value_name = "NAME")]
        jobq: Option<String>,

        /// Library of the job queue
        #[arg(long, value_name = "LIBRARY")]
        jobq_library: Option<String>,

        /// Move the server to this IFS directory
        #[arg(long, value_name = "PATH")]
        ifs_path: Option<String>,

        /// Java home directory to run under
        #[arg(long, value_name = "PATH")]
        java_home: Option<String>,

        /// Java system properties, semicolon separated
        #[arg(long, value_name = "PROPS")]
        java_props: Option<String>,
    },

    /// Remove an AFS server's configuration area, keeping the pinned files
    #[command(name = "clear-config")]
    ClearConfig {
        /// Product library the server is registered in
        library: String,

        /// Server instance name
        name: String,
    },

    /// Remove an AFS server's log files
    #[command(name = "clear-logs")]
    ClearLogs {
        /// Product library the server is registered in
        library: String,

        /// Server instance name
        name: String,
    },

    /// Query a REST endpoint of a running AFS server
    Probe {
        /// Product library the server is registered in
        library: String,

        /// Server instance name
        name: String,

        /// Endpoint path under the REST root
        #[arg(long, default_value = "version")]
        endpoint: String,
    },

    /// Jetty web server management
    Jetty {
        #[command(subcommand)]
        command: JettyCommands,
    },

    /// Install a new AFS server from a setup jar
    #[command(name = "install-afs")]
    InstallAfs {
        /// Path to the setup jar
        package: PathBuf,

        /// IFS directory to install into
        #[arg(long, value_name = "PATH")]
        ifs_path: String,

        /// User profile the server runs under
        #[arg(long)]
        user: String,

        /// Product library to register the server in
        #[arg(long)]
        library: Option<String>,

        /// Server instance name
        #[arg(long)]
        instance: Option<String>,

        /// HTTP port of the server
        #[arg(long)]
        port: Option<u16>,

        /// Job queue for the server job
        #[arg(long, value_name = "NAME")]
        jobq: Option<String>,

        /// Library of the job queue
        #[arg(long, value_name = "LIBRARY")]
        jobq_library: Option<String>,

        /// Auxiliary storage pool device
        #[arg(long)]
        iasp: Option<String>,
    },

    /// Install a new Jetty web server from a setup jar
    #[command(name = "install-jetty")]
    InstallJetty {
        /// Path to the setup jar
        package: PathBuf,

        /// IFS directory to install into
        #[arg(long, value_name = "PATH")]
        ifs_path: String,

        /// User profile the server runs under
        #[arg(long)]
        user: Option<String>,

        /// Product library to install into
        #[arg(long)]
        library: Option<String>,

        /// Auxiliary storage pool device
        #[arg(long)]
        iasp: Option<String>,

        /// HTTP port of the server
        #[arg(long)]
        port: Option<u16>,
    },

    /// Update an installed AFS server from a setup jar
    #[command(name = "update-server", alias = "up")]
    UpdateServer {
        /// Path to the setup jar
        package: PathBuf,

        /// Product library the server is registered in
        library: String,

        /// Server instance name
        name: String,
    },

    /// Install a new ARCAD instance from a master package
    #[command(name = "install-arcad")]
    InstallArcad {
        /// Package file: a distribution zip or a loose payload .dta
        package: PathBuf,

        /// Two-character code of the new instance
        #[arg(long, value_name = "CODE")]
        instance: String,

        /// Main product language
        #[arg(long, value_enum, default_value = "eng")]
        language: LanguageArg,

        /// Secondary product language
        #[arg(long, value_enum, value_name = "LANGUAGE")]
        secondary_language: Option<LanguageArg>,

        /// Install the demonstration data
        #[arg(long)]
        demo: bool,

        /// Auxiliary storage pool device
        #[arg(long)]
        asp: Option<String>,
    },

    /// Apply a cumulative package to an ARCAD instance
    #[command(name = "update-arcad")]
    UpdateArcad {
        /// Package file: a distribution zip or a loose payload .dta
        package: PathBuf,

        /// Code of the instance to update
        #[arg(long, value_name = "CODE")]
        instance: String,
    },
}

/// Jetty web server subcommands
#[derive(Subcommand)]
pub enum JettyCommands {
    /// Show the Jetty server of a library
    Status {
        /// Library the Jetty server lives in
        library: String,
    },

    /// Start the Jetty server of a library
    Start {
        /// Library the Jetty server lives in
        library: String,
    },

    /// Stop the Jetty server of a library
    Stop {
        /// Library the Jetty server lives in
        library: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_an_arcad_install() {
        let cli = Cli::try_parse_from([
            "afsctl",
            "install-arcad",
            "/media/package.zip",
            "--instance",
            "ZZ",
            "--language",
            "fra",
            "--demo",
        ])
        .unwrap();
        match cli.command {
            Commands::InstallArcad {
                instance,
                language,
                demo,
                secondary_language,
                ..
            } => {
                assert_eq!(instance, "ZZ");
                assert_eq!(language, LanguageArg::Fra);
                assert!(demo);
                assert!(secondary_language.is_none());
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn host_flag_is_global() {
        let cli = Cli::try_parse_from(["afsctl", "locations", "--host", "ibmi.example.com"]).unwrap();
        assert_eq!(cli.global.host.as_deref(), Some("ibmi.example.com"));
    }
}
