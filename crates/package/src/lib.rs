#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! ARCAD installation package resolution
//!
//! A package is either a `.zip` container or a loose `.dta` file whose
//! sibling directory holds the payload files. Resolution locates the
//! installer descriptor (`ARCINST.DTA`) and a versioned payload file, and
//! classifies the package as a master install or a cumulative update from
//! the payload's file name; a master payload anywhere in the package wins
//! over a cumulative one. Resolution is total: it yields a complete
//! package or "not suitable", never a partially populated one.

use afsctl_errors::{Error, PackageError};
use afsctl_types::{ArcadPackage, ArcadVersion, PackageType, PayloadRef};
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// The fixed payload-name patterns of ARCAD distribution media.
struct Patterns {
    descriptor: Regex,
    master: Regex,
    cumulative: Regex,
}

impl Patterns {
    fn new() -> Result<Self, Error> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::internal(e.to_string()))
        };
        Ok(Self {
            descriptor: compile(r"(?i)^ARCINST\.DTA$")?,
            master: compile(r"(?i)^MSTARC (\d{2}\.\d{2}\.\d{2}) V\dR\dM0 MASTER ENG FRA\.DTA$")?,
            cumulative: compile(
                r"(?i)^CUMARC (\d{2}\.\d{2}\.\d{2})-(\d{2}\.\d{2}\.\d{2}) V\dR\dM0\.DTA$",
            )?,
        })
    }

    /// Pick the payload among `names`. A master payload anywhere in the
    /// set takes precedence; only when none exists is the set re-searched
    /// for a cumulative payload. The cumulative pattern's first group is
    /// the version the update applies on top of, the second the target
    /// version.
    fn find_payload<'a>(&self, names: &'a [String]) -> Result<Option<(&'a str, Classified)>, Error> {
        for name in names {
            if let Some(caps) = self.master.captures(base_name(name)) {
                let version = ArcadVersion::parse(&caps[1]).map_err(Error::from)?;
                return Ok(Some((
                    name.as_str(),
                    Classified {
                        package_type: PackageType::Master,
                        version,
                        from_version: None,
                    },
                )));
            }
        }
        for name in names {
            if let Some(caps) = self.cumulative.captures(base_name(name)) {
                let from_version = ArcadVersion::parse(&caps[1]).map_err(Error::from)?;
                let version = ArcadVersion::parse(&caps[2]).map_err(Error::from)?;
                return Ok(Some((
                    name.as_str(),
                    Classified {
                        package_type: PackageType::Cumulative,
                        version,
                        from_version: Some(from_version),
                    },
                )));
            }
        }
        Ok(None)
    }
}

struct Classified {
    package_type: PackageType,
    version: ArcadVersion,
    from_version: Option<ArcadVersion>,
}

fn base_name(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}

/// Resolve a user-selected path into an [`ArcadPackage`].
///
/// Returns `Ok(None)` when the selection is not a suitable package: wrong
/// extension, missing descriptor, or no payload matching either pattern.
///
/// # Errors
///
/// Returns an error only for infrastructure failures: an unreadable archive
/// or directory.
pub async fn resolve_package(selected: &Path) -> Result<Option<ArcadPackage>, Error> {
    let name = selected
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if name.ends_with(".zip") {
        resolve_zip(selected).await
    } else if name.ends_with(".dta") {
        resolve_loose(selected).await
    } else {
        debug!(path = %selected.display(), "selection is neither a zip nor a dta file");
        Ok(None)
    }
}

async fn resolve_zip(selected: &Path) -> Result<Option<ArcadPackage>, Error> {
    let patterns = Patterns::new()?;
    let path = selected.to_path_buf();
    // zip reads are synchronous; the archives are small (entry listing only).
    let entries = tokio::task::spawn_blocking(move || -> Result<Vec<String>, Error> {
        let file = std::fs::File::open(&path).map_err(|e| PackageError::ArchiveReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let archive =
            zip::ZipArchive::new(file).map_err(|e| PackageError::ArchiveReadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(archive.file_names().map(ToString::to_string).collect())
    })
    .await
    .map_err(|e| Error::internal(e.to_string()))??;

    let descriptor = entries
        .iter()
        .find(|entry| patterns.descriptor.is_match(base_name(entry)));
    let Some(descriptor) = descriptor else {
        return Ok(None);
    };

    let Some((entry, classified)) = patterns.find_payload(&entries)? else {
        return Ok(None);
    };
    Ok(Some(ArcadPackage {
        package_type: classified.package_type,
        container: Some(selected.to_path_buf()),
        descriptor: PayloadRef::ZipEntry(descriptor.clone()),
        payload: PayloadRef::ZipEntry(entry.to_string()),
        version: classified.version,
        from_version: classified.from_version,
    }))
}

async fn resolve_loose(selected: &Path) -> Result<Option<ArcadPackage>, Error> {
    let patterns = Patterns::new()?;
    let directory = selected.parent().ok_or_else(|| PackageError::NotFound {
        path: selected.display().to_string(),
    })?;

    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(directory)
        .await
        .map_err(|e| Error::io_with_path(&e, directory))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::io_with_path(&e, directory))?
    {
        if entry.file_type().await.is_ok_and(|t| t.is_file()) {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }

    let descriptor = names
        .iter()
        .find(|name| patterns.descriptor.is_match(name));
    let Some(descriptor) = descriptor else {
        return Ok(None);
    };

    let Some((name, classified)) = patterns.find_payload(&names)? else {
        return Ok(None);
    };
    Ok(Some(ArcadPackage {
        package_type: classified.package_type,
        container: None,
        descriptor: PayloadRef::File(directory.join(descriptor)),
        payload: PayloadRef::File(directory.join(name)),
        version: classified.version,
        from_version: classified.from_version,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MASTER_NAME: &str = "MSTARC 12.34.56 V1R2M0 MASTER ENG FRA.DTA";
    const CUMULATIVE_NAME: &str = "CUMARC 12.34.56-12.35.00 V1R2M0.DTA";

    fn write_zip(path: &Path, entries: &[&str]) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for entry in entries {
            writer.start_file(*entry, options).unwrap();
            writer.write_all(b"payload").unwrap();
        }
        writer.finish().unwrap();
    }

    #[tokio::test]
    async fn resolves_master_zip() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("media.zip");
        write_zip(
            &zip_path,
            &["disk1/ARCINST.DTA", &format!("disk1/{MASTER_NAME}")],
        );

        let package = resolve_package(&zip_path).await.unwrap().unwrap();
        assert_eq!(package.package_type, PackageType::Master);
        assert_eq!(package.version.to_string(), "12.34.56");
        assert_eq!(package.from_version, None);
        assert_eq!(
            package.descriptor,
            PayloadRef::ZipEntry("disk1/ARCINST.DTA".to_string())
        );
        assert_eq!(package.save_file_name(), "MST_123456");
    }

    #[tokio::test]
    async fn resolves_cumulative_zip_with_both_versions() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("media.zip");
        write_zip(&zip_path, &["ARCINST.DTA", CUMULATIVE_NAME]);

        let package = resolve_package(&zip_path).await.unwrap().unwrap();
        assert_eq!(package.package_type, PackageType::Cumulative);
        assert_eq!(package.from_version.unwrap().to_string(), "12.34.56");
        assert_eq!(package.version.to_string(), "12.35.00");
        assert_eq!(package.save_file_name(), "CUME123500");
    }

    #[tokio::test]
    async fn master_payload_wins_over_a_cumulative_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("media.zip");
        // Cumulative entry listed first; the master entry must still win.
        write_zip(&zip_path, &["ARCINST.DTA", CUMULATIVE_NAME, MASTER_NAME]);

        let package = resolve_package(&zip_path).await.unwrap().unwrap();
        assert_eq!(package.package_type, PackageType::Master);
        assert_eq!(package.from_version, None);
        assert_eq!(
            package.payload,
            PayloadRef::ZipEntry(MASTER_NAME.to_string())
        );

        std::fs::write(dir.path().join("ARCINST.DTA"), b"x").unwrap();
        std::fs::write(dir.path().join(CUMULATIVE_NAME), b"x").unwrap();
        std::fs::write(dir.path().join(MASTER_NAME), b"x").unwrap();
        let package = resolve_package(&dir.path().join("ARCINST.DTA"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(package.package_type, PackageType::Master);
        assert_eq!(
            package.payload,
            PayloadRef::File(dir.path().join(MASTER_NAME))
        );
    }

    #[tokio::test]
    async fn missing_descriptor_is_not_suitable() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("media.zip");
        write_zip(&zip_path, &[MASTER_NAME]);

        assert!(resolve_package(&zip_path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unmatched_payload_is_not_suitable() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("media.zip");
        write_zip(&zip_path, &["ARCINST.DTA", "README.TXT"]);

        assert!(resolve_package(&zip_path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resolves_loose_dta_siblings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ARCINST.DTA"), b"x").unwrap();
        std::fs::write(dir.path().join(MASTER_NAME), b"x").unwrap();

        let package = resolve_package(&dir.path().join("ARCINST.DTA"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(package.package_type, PackageType::Master);
        assert_eq!(package.container, None);
        assert_eq!(
            package.payload,
            PayloadRef::File(dir.path().join(MASTER_NAME))
        );
    }

    #[tokio::test]
    async fn wrong_extension_is_not_suitable() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("setup.jar");
        std::fs::write(&jar, b"x").unwrap();
        assert!(resolve_package(&jar).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreadable_archive_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("media.zip");
        std::fs::write(&zip_path, b"this is not a zip").unwrap();
        assert!(resolve_package(&zip_path).await.is_err());
    }

    #[test]
    fn payload_ref_file_name_strips_prefixes() {
        let entry = PayloadRef::ZipEntry("disk1/ARCINST.DTA".to_string());
        assert_eq!(entry.file_name(), "ARCINST.DTA");
    }
}
