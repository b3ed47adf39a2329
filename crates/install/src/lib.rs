#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Install and update orchestration for afsctl
//!
//! Two orchestrators live here. The jar-based one installs and updates AFS
//! and Jetty servers by running an unattended Java installer on the host.
//! The ARCAD one restores a distribution package into a transient library
//! and invokes the native installer program, with a guaranteed drop of that
//! library on every exit path.
//!
//! Both run inside a scoped work directory and report phase-weighted
//! progress through the event channel. Results are binary: the captured
//! installer output travels with the finish event so the caller can show it
//! on success and failure alike.

pub mod arcad;
pub mod params;
pub mod server;

pub use arcad::{
    install_arcad, update_arcad, verify_instance_code_free, verify_update_applies, ArcadTarget,
    Language, MasterInstall,
};
pub use params::{afs_install_parameters, jetty_install_parameters, InstallerParameters};
pub use server::{install_server, update_server};
