//! Installation package model

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::version::ArcadVersion;

/// Whether a package is a fresh master install or a cumulative update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Master,
    Cumulative,
}

/// A reference to one payload file: either a loose file on disk or an entry
/// inside a zip container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadRef {
    /// A loose file next to the selected `.dta` file.
    File(PathBuf),
    /// An entry name inside the selected zip container.
    ZipEntry(String),
}

impl PayloadRef {
    /// The bare file name of the payload, without any zip path prefix.
    #[must_use]
    pub fn file_name(&self) -> &str {
        match self {
            Self::File(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default(),
            Self::ZipEntry(entry) => entry.rsplit('/').next().unwrap_or(entry),
        }
    }
}

/// A resolved ARCAD installation package, staged for transfer.
///
/// Resolution is all-or-nothing: a value of this type always has both
/// payload references and a valid version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcadPackage {
    pub package_type: PackageType,
    /// The zip container, when the package was selected as one.
    pub container: Option<PathBuf>,
    /// The installer descriptor (`ARCINST.DTA`).
    pub descriptor: PayloadRef,
    /// The versioned payload (`MSTARC …` / `CUMARC …`).
    pub payload: PayloadRef,
    /// Target version.
    pub version: ArcadVersion,
    /// Version the update applies on top of; cumulative packages only.
    pub from_version: Option<ArcadVersion>,
}

impl ArcadPackage {
    /// Save-file name the payload is staged under during an install.
    #[must_use]
    pub fn save_file_name(&self) -> String {
        self.version.save_file_name(self.package_type)
    }
}
