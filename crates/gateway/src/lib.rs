#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Remote execution gateway for afsctl
//!
//! Single choke point for talking to the IBM i host: CL commands, shell
//! commands, SQL, file uploads and existence probes all go through the
//! [`RemoteGateway`] trait. The gateway never retries and never rolls back;
//! a non-zero exit code is a result to inspect, not an error to throw.
//! All retry and recovery decisions belong to callers.

pub mod cl;
pub mod executor;
pub mod ssh;
pub mod tempdir;
pub mod testing;

pub use cl::{sh_quote, ClCommand, ClValue};
pub use executor::{CommandOutput, RemoteGateway, SqlRow};
pub use ssh::SshGateway;
pub use tempdir::{unique_work_directory, with_temp_directory};
