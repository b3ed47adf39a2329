#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core types for afsctl
//!
//! Validated identifier newtypes, ARCAD version handling and the data model
//! shared by the gateway, inventory and install crates. Remote state
//! snapshots in this crate are rebuilt on every read and must never be
//! cached across operations that mutate the remote host.

pub mod names;
pub mod package;
pub mod server;
pub mod version;

pub use names::{IfsPath, InstanceCode, LibraryName, ObjectName};
pub use package::{ArcadPackage, PackageType, PayloadRef};
pub use server::{
    AfsInstallRequest, AfsServer, AfsServerUpdate, ArcadInstance, ConfigurationError,
    JettyInstallRequest, JettyServer, JobStatus, ServerConfiguration, ServerKind, ServerLocation,
};
pub use version::ArcadVersion;
