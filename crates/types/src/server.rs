//! Remote server snapshot types
//!
//! Every type here is a point-in-time snapshot combining static location
//! data with live job status. Snapshots are rebuilt on every inventory read
//! and must be re-fetched after any start/stop/install operation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::names::{IfsPath, InstanceCode, LibraryName};
use crate::version::ArcadVersion;

/// The kind of server anchored at a [`ServerLocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerKind {
    Afs,
    Jetty,
}

/// Where a server product lives on the remote host. Discovered by scanning
/// the object catalog for well-known data areas; immutable once read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerLocation {
    pub library: LibraryName,
    /// Value of the marker data area: version for AFS, home path for Jetty.
    pub data_area_value: String,
    /// Auxiliary storage pool number, when not in the system ASP.
    pub iasp: Option<u16>,
    pub kind: ServerKind,
}

/// Live job status shared by AFS and Jetty snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_name: String,
    pub job_user: String,
    pub job_number: String,
    /// Active-job status code (e.g. `MSGW`, `TIMW`), when the job is active.
    pub status: Option<String>,
}

impl JobStatus {
    /// The `number/user/name` job triple.
    #[must_use]
    pub fn triple(&self) -> String {
        format!("{}/{}/{}", self.job_number, self.job_user, self.job_name)
    }
}

/// Parsed `osgi.cm.ini`-style configuration: section name to key/value map,
/// all keys lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfiguration {
    pub sections: BTreeMap<String, BTreeMap<String, String>>,
    /// Set when the configuration could not be read at all.
    pub error: Option<ConfigurationError>,
}

/// Why a server's configuration could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigurationError {
    /// The server's IFS folder does not exist.
    NoFolder,
    /// The folder exists but holds no configuration file.
    NoConfig,
}

impl ServerConfiguration {
    /// Look up a value by section and key, both case-insensitive.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(&section.to_ascii_lowercase())
            .and_then(|s| s.get(&key.to_ascii_lowercase()))
            .map(String::as_str)
    }
}

/// Snapshot of one AFS server instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AfsServer {
    pub library: LibraryName,
    pub name: String,
    pub jobq_name: String,
    pub jobq_library: String,
    pub ifs_path: String,
    pub user: String,
    pub java_props: String,
    pub java_home: String,
    pub job: JobStatus,
    pub running: bool,
    pub configuration: ServerConfiguration,
}

impl AfsServer {
    /// The configured REST ports, `(http, https)`.
    #[must_use]
    pub fn rest_ports(&self) -> (Option<u16>, Option<u16>) {
        let port = |key: &str| {
            self.configuration
                .get("rest", key)
                .and_then(|v| v.parse().ok())
        };
        (port("port"), port("portssl"))
    }
}

/// Fields of an AFS server that can be changed after installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AfsServerUpdate {
    pub user: String,
    pub jobq_name: String,
    pub jobq_library: String,
    pub ifs_path: IfsPath,
    pub java_props: String,
    pub java_home: String,
}

/// Snapshot of the Jetty server of one library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JettyServer {
    pub library: LibraryName,
    pub running: bool,
    /// Absent when no Jetty job was ever recorded for the library.
    pub job: Option<JobStatus>,
}

/// A registered ARCAD product instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcadInstance {
    pub code: InstanceCode,
    pub text: String,
    pub library: LibraryName,
    pub iasp: Option<String>,
    pub version: ArcadVersion,
}

/// Parameters collected for a fresh AFS server installation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AfsInstallRequest {
    pub ifs_path: String,
    pub user: String,
    pub library: Option<String>,
    pub instance: Option<String>,
    pub port: Option<u16>,
    pub jobq_name: Option<String>,
    pub jobq_library: Option<String>,
    pub iasp: Option<String>,
}

/// Parameters collected for a fresh Jetty web server installation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JettyInstallRequest {
    pub ifs_path: String,
    pub user: Option<String>,
    pub library: Option<String>,
    pub iasp: Option<String>,
    pub port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_triple_formatting() {
        let job = JobStatus {
            job_name: "AFSMAIN".to_string(),
            job_user: "QSECOFR".to_string(),
            job_number: "123456".to_string(),
            status: None,
        };
        assert_eq!(job.triple(), "123456/QSECOFR/AFSMAIN");
    }

    #[test]
    fn configuration_lookup_is_case_insensitive() {
        let mut sections = BTreeMap::new();
        sections.insert(
            "rest".to_string(),
            BTreeMap::from([("port".to_string(), "5260".to_string())]),
        );
        let config = ServerConfiguration {
            sections,
            error: None,
        };
        assert_eq!(config.get("REST", "Port"), Some("5260"));
        assert_eq!(config.get("rest", "missing"), None);
    }
}
