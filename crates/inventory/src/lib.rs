#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Server inventory for afsctl
//!
//! Discovers ARCAD server locations on the remote host, reads AFS server,
//! Jetty server and ARCAD instance snapshots, and drives server lifecycle
//! commands. Every snapshot is a point-in-time read; callers re-fetch after
//! any mutating operation.

pub mod afs;
pub mod arcad;
pub mod ini;
pub mod jetty;
pub mod locations;
pub mod probe;
mod row;

pub use afs::{
    change_server, clear_configuration, clear_logs, delete_server, list_servers, start_server,
    stop_server,
};
pub use arcad::{list_instance_codes, list_instances};
pub use ini::parse_configuration;
pub use jetty::{load_jetty_server, start_jetty, stop_jetty};
pub use locations::find_locations;
pub use probe::probe_rest;
