//! Typed CL command assembly
//!
//! Remote CL commands are plain text on the wire, so every interpolated
//! value goes through a validated [`ClValue`] before it reaches the command
//! string. User-supplied free text (paths, Java properties) is single-quoted
//! with embedded quotes rejected at the type level by [`IfsPath`] or doubled
//! here for CL literals.

use afsctl_errors::{Error, GatewayError};
use afsctl_types::{IfsPath, LibraryName, ObjectName};
use std::fmt::Write as _;

/// A validated CL parameter value.
#[derive(Debug, Clone)]
pub enum ClValue {
    /// A bare object name: `INSTANCE(AFSDEMO)`.
    Name(ObjectName),
    /// A qualified object: `JOBQ(QGPL/QBATCH)`.
    Qualified(LibraryName, ObjectName),
    /// A quoted IFS path: `IFSPATH('/opt/afs')`.
    Path(IfsPath),
    /// A quoted free-text literal; embedded quotes are doubled.
    Literal(String),
    /// A number: `DBGPORT(8405)`.
    Number(i64),
    /// A special value such as `*YES`; validated against `*` + name rules.
    Special(&'static str),
}

impl ClValue {
    fn render(&self, out: &mut String) {
        match self {
            Self::Name(name) => out.push_str(name.as_str()),
            Self::Qualified(library, name) => {
                let _ = write!(out, "{library}/{name}");
            }
            Self::Path(path) => {
                let _ = write!(out, "'{path}'");
            }
            Self::Literal(text) => {
                out.push('\'');
                for c in text.chars() {
                    if c == '\'' {
                        out.push('\'');
                    }
                    out.push(c);
                }
                out.push('\'');
            }
            Self::Number(n) => {
                let _ = write!(out, "{n}");
            }
            Self::Special(s) => out.push_str(s),
        }
    }
}

/// Builder for one CL command string.
#[derive(Debug, Clone)]
pub struct ClCommand {
    qualifier: Option<LibraryName>,
    program: ObjectName,
    params: Vec<(&'static str, ClValue)>,
}

impl ClCommand {
    /// Start a command for the given CL command name.
    ///
    /// # Errors
    ///
    /// Returns an error if `program` is not a valid object name.
    pub fn new(program: &str) -> Result<Self, Error> {
        Ok(Self {
            qualifier: None,
            program: ObjectName::new(program).map_err(GatewayError::from)?,
            params: Vec::new(),
        })
    }

    /// Qualify the command with its library, as in `MYLIB/CHGAFSSVR`.
    #[must_use]
    pub fn in_library(mut self, library: LibraryName) -> Self {
        self.qualifier = Some(library);
        self
    }

    /// Append a `KEYWORD(value)` parameter. Parameter order is preserved.
    #[must_use]
    pub fn param(mut self, keyword: &'static str, value: ClValue) -> Self {
        debug_assert!(
            keyword
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
            "CL keywords are uppercase constants"
        );
        self.params.push((keyword, value));
        self
    }

    /// Append a parameter only when `value` is present.
    #[must_use]
    pub fn param_opt(self, keyword: &'static str, value: Option<ClValue>) -> Self {
        match value {
            Some(value) => self.param(keyword, value),
            None => self,
        }
    }

    /// Render the command string.
    #[must_use]
    pub fn build(&self) -> String {
        let mut out = String::new();
        if let Some(library) = &self.qualifier {
            let _ = write!(out, "{library}/");
        }
        out.push_str(self.program.as_str());
        for (keyword, value) in &self.params {
            let _ = write!(out, " {keyword}(");
            value.render(&mut out);
            out.push(')');
        }
        out
    }
}

/// Quote a string for safe inclusion in a POSIX shell command word.
/// Produces `'...'` with embedded single quotes spliced as `'\''`.
#[must_use]
pub fn sh_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_keyword_parameters_in_order() {
        let cmd = ClCommand::new("STRAFSSVR")
            .unwrap()
            .param("INSTANCE", ClValue::Name(ObjectName::new("AFSDEMO").unwrap()))
            .param("DBGPORT", ClValue::Number(8405))
            .build();
        assert_eq!(cmd, "STRAFSSVR INSTANCE(AFSDEMO) DBGPORT(8405)");
    }

    #[test]
    fn renders_qualified_program_and_values() {
        let lib = LibraryName::new("AFSLIB").unwrap();
        let cmd = ClCommand::new("CHGAFSSVR")
            .unwrap()
            .in_library(lib.clone())
            .param(
                "JOBQ",
                ClValue::Qualified(LibraryName::new("QGPL").unwrap(), ObjectName::new("QBATCH").unwrap()),
            )
            .param("IFSPATH", ClValue::Path(IfsPath::new("/opt/afs").unwrap()))
            .build();
        assert_eq!(
            cmd,
            "AFSLIB/CHGAFSSVR JOBQ(QGPL/QBATCH) IFSPATH('/opt/afs')"
        );
    }

    #[test]
    fn literals_double_embedded_quotes() {
        let cmd = ClCommand::new("CHGAFSSVR")
            .unwrap()
            .param("PROPS", ClValue::Literal("-Da='b';".to_string()))
            .build();
        assert_eq!(cmd, "CHGAFSSVR PROPS('-Da=''b'';')");
    }

    #[test]
    fn invalid_names_are_rejected_before_any_remote_call() {
        assert!(ClCommand::new("BAD NAME").is_err());
        assert!(ObjectName::new("DROP TABLE").is_err());
    }

    #[test]
    fn shell_quoting_handles_embedded_quotes() {
        assert_eq!(sh_quote("plain"), "'plain'");
        assert_eq!(sh_quote("it's"), "'it'\\''s'");
    }
}
