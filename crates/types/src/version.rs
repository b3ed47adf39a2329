//! ARCAD version handling
//!
//! ARCAD product versions are always two-digit dot-separated triples
//! (`NN.NN.NN`). Save-file names are derived from them by stripping the
//! dots: `MST_123456` for a master package, `CUME123456` for a cumulative
//! one.

use afsctl_errors::PackageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::package::PackageType;

/// A strict `NN.NN.NN` ARCAD version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArcadVersion {
    major: u8,
    minor: u8,
    patch: u8,
}

impl ArcadVersion {
    /// Parse a `NN.NN.NN` string.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::InvalidVersion`] unless the input is exactly
    /// three two-digit groups separated by dots.
    pub fn parse(s: &str) -> Result<Self, PackageError> {
        let invalid = || PackageError::InvalidVersion {
            value: s.to_string(),
        };

        let mut parts = s.trim().split('.');
        let next = |p: Option<&str>| -> Result<u8, PackageError> {
            let part = p.ok_or_else(invalid)?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };

        let major = next(parts.next())?;
        let minor = next(parts.next())?;
        let patch = next(parts.next())?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self {
            major,
            minor,
            patch,
        })
    }

    /// The version digits with dots stripped, e.g. `"123456"` for `12.34.56`.
    #[must_use]
    pub fn digits(&self) -> String {
        format!("{:02}{:02}{:02}", self.major, self.minor, self.patch)
    }

    /// Derive the save-file name used when staging a package payload of the
    /// given type for this version.
    #[must_use]
    pub fn save_file_name(&self, package_type: PackageType) -> String {
        match package_type {
            PackageType::Master => format!("MST_{}", self.digits()),
            PackageType::Cumulative => format!("CUME{}", self.digits()),
        }
    }
}

impl fmt::Display for ArcadVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}.{:02}.{:02}",
            self.major, self.minor, self.patch
        )
    }
}

impl FromStr for ArcadVersion {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ArcadVersion {
    type Error = PackageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ArcadVersion> for String {
    fn from(value: ArcadVersion) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_digit_triples() {
        let v = ArcadVersion::parse("12.34.56").unwrap();
        assert_eq!(v.to_string(), "12.34.56");
        assert_eq!(v.digits(), "123456");
    }

    #[test]
    fn rejects_loose_shapes() {
        for bad in ["1.2.3", "12.34", "12.34.56.78", "12.3a.56", "", "123456"] {
            assert!(ArcadVersion::parse(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn save_file_names_strip_dots() {
        let v = ArcadVersion::parse("12.34.56").unwrap();
        assert_eq!(v.save_file_name(PackageType::Master), "MST_123456");
        assert_eq!(v.save_file_name(PackageType::Cumulative), "CUME123456");
    }

    #[test]
    fn ordering_follows_numeric_fields() {
        let older = ArcadVersion::parse("12.09.99").unwrap();
        let newer = ArcadVersion::parse("12.10.00").unwrap();
        assert!(older < newer);
    }
}
