//! Validated identifier newtypes
//!
//! Remote commands are assembled from these values by string interpolation,
//! so every identifier is validated at construction. An invalid name is
//! rejected here, before any remote call is made.

use afsctl_errors::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn valid_object_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '$' | '#' | '@' | '_' | '.')
}

fn check_object_name(s: &str) -> Result<(), GatewayError> {
    if s.is_empty() || s.len() > 10 {
        return Err(GatewayError::InvalidIdentifier {
            value: s.to_string(),
            reason: "must be 1 to 10 characters".to_string(),
        });
    }
    if let Some(bad) = s.chars().find(|c| !valid_object_char(*c)) {
        return Err(GatewayError::InvalidIdentifier {
            value: s.to_string(),
            reason: format!("character {bad:?} is not allowed"),
        });
    }
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(GatewayError::InvalidIdentifier {
            value: s.to_string(),
            reason: "must not start with a digit".to_string(),
        });
    }
    Ok(())
}

/// A validated IBM i library name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LibraryName(String);

impl LibraryName {
    /// Validate and normalize (uppercase) a library name.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidIdentifier`] if the name is empty,
    /// longer than 10 characters, starts with a digit or contains a
    /// character outside the IBM i object name set.
    pub fn new(name: &str) -> Result<Self, GatewayError> {
        let name = name.trim().to_ascii_uppercase();
        check_object_name(&name)?;
        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LibraryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LibraryName {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LibraryName {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<LibraryName> for String {
    fn from(value: LibraryName) -> Self {
        value.0
    }
}

/// A validated IBM i object name (server instance, save file, data area...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectName(String);

impl ObjectName {
    /// Validate and normalize (uppercase) an object name.
    ///
    /// # Errors
    ///
    /// Same rules as [`LibraryName::new`].
    pub fn new(name: &str) -> Result<Self, GatewayError> {
        let name = name.trim().to_ascii_uppercase();
        check_object_name(&name)?;
        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectName {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ObjectName {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ObjectName> for String {
    fn from(value: ObjectName) -> Self {
        value.0
    }
}

/// An ARCAD instance code: exactly two uppercase alphanumeric characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceCode([u8; 2]);

impl InstanceCode {
    /// Validate an instance code.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidIdentifier`] unless the code is
    /// exactly two uppercase alphanumeric ASCII characters.
    pub fn new(code: &str) -> Result<Self, GatewayError> {
        let code = code.trim().to_ascii_uppercase();
        let bytes = code.as_bytes();
        if bytes.len() == 2
            && bytes
                .iter()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            Ok(Self([bytes[0], bytes[1]]))
        } else {
            Err(GatewayError::InvalidIdentifier {
                value: code,
                reason: "instance codes are exactly two uppercase alphanumeric characters"
                    .to_string(),
            })
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        // Construction guarantees ASCII.
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl fmt::Display for InstanceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceCode {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for InstanceCode {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<InstanceCode> for String {
    fn from(value: InstanceCode) -> Self {
        value.as_str().to_string()
    }
}

/// An absolute IFS path, free of characters that would break out of a
/// single-quoted shell word.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IfsPath(String);

impl IfsPath {
    /// Validate an IFS path.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidPath`] if the path is not absolute or
    /// contains a single quote, backslash or control character.
    pub fn new(path: &str) -> Result<Self, GatewayError> {
        let path = path.trim();
        if !path.starts_with('/') {
            return Err(GatewayError::InvalidPath {
                path: path.to_string(),
                reason: "must be absolute".to_string(),
            });
        }
        if path
            .chars()
            .any(|c| c == '\'' || c == '\\' || c.is_control())
        {
            return Err(GatewayError::InvalidPath {
                path: path.to_string(),
                reason: "quotes, backslashes and control characters are not allowed".to_string(),
            });
        }
        Ok(Self(path.trim_end_matches('/').to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append a path component.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidPath`] if the component fails the same
    /// character rules as the path itself.
    pub fn join(&self, component: &str) -> Result<Self, GatewayError> {
        Self::new(&format!("{}/{}", self.0, component.trim_matches('/')))
    }
}

impl fmt::Display for IfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for IfsPath {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for IfsPath {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<IfsPath> for String {
    fn from(value: IfsPath) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_names_are_uppercased_and_bounded() {
        assert_eq!(LibraryName::new("arcad_sys").unwrap().as_str(), "ARCAD_SYS");
        assert!(LibraryName::new("").is_err());
        assert!(LibraryName::new("TOOLONGLIBNAME").is_err());
        assert!(LibraryName::new("BAD NAME").is_err());
        assert!(LibraryName::new("1LIB").is_err());
    }

    #[test]
    fn instance_codes_are_two_uppercase_alphanumerics() {
        assert_eq!(InstanceCode::new("a1").unwrap().as_str(), "A1");
        assert!(InstanceCode::new("A").is_err());
        assert!(InstanceCode::new("ABC").is_err());
        assert!(InstanceCode::new("A-").is_err());
    }

    #[test]
    fn ifs_paths_must_be_absolute_and_quote_free() {
        assert_eq!(IfsPath::new("/tmp/work/").unwrap().as_str(), "/tmp/work");
        assert!(IfsPath::new("relative/path").is_err());
        assert!(IfsPath::new("/tmp/it's").is_err());
    }

    #[test]
    fn ifs_path_join() {
        let base = IfsPath::new("/tmp").unwrap();
        assert_eq!(base.join("setup.jar").unwrap().as_str(), "/tmp/setup.jar");
    }
}
