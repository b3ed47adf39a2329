//! Unattended-installer parameter assembly
//!
//! The Java installer takes `-Dkey=value` system properties. Parameters
//! keep their insertion order, booleans render as `y`/`n`, and empty values
//! are omitted entirely so the installer falls back to package defaults.

use afsctl_gateway::sh_quote;
use afsctl_types::{AfsInstallRequest, JettyInstallRequest};
use std::fmt::Write as _;

/// An ordered key/value parameter set for one installer run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallerParameters {
    entries: Vec<(String, String)>,
}

impl InstallerParameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any earlier value while keeping its
    /// original position.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key.to_string(), value));
        }
    }

    /// Set a boolean parameter as the installer's `y`/`n` convention.
    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.set(key, if value { "y" } else { "n" });
    }

    /// Set a parameter only when a non-empty value is present.
    pub fn set_opt(&mut self, key: &str, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            let value = value.into();
            if !value.is_empty() {
                self.set(key, value);
            }
        }
    }

    /// Look up a parameter value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render the `-Dkey=value` argument string for the java command line.
    #[must_use]
    pub fn java_args(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "-D{}", sh_quote(&format!("{key}={value}")));
        }
        out
    }

    /// Render the `key=value` lines written back to the installed
    /// `.properties` file.
    #[must_use]
    pub fn properties_content(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            let _ = writeln!(out, "{key}={value}");
        }
        out
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Assemble the property set for a fresh AFS server installation.
/// HTTPS stays off at install time; it is configured afterwards.
#[must_use]
pub fn afs_install_parameters(request: &AfsInstallRequest) -> InstallerParameters {
    let mut params = InstallerParameters::new();
    params.set_flag("ibmi.secure", false);
    params.set("install.directory", request.ifs_path.clone());
    params.set("afs.user", request.user.clone());
    params.set_opt("afs.starter.instance", request.instance.clone());
    params.set_opt("afs.starter.library", request.library.clone());
    params.set_opt("afs.starter.iasp", request.iasp.clone());
    params.set_opt("afs.http.port", request.port.map(|p| p.to_string()));
    params.set_opt("arcad.jobq", request.jobq_name.clone());
    params.set_opt("arcad.jobq.library", request.jobq_library.clone());
    params.set("afs.https.port", "0");
    params
}

/// Assemble the property set for a fresh Jetty web server installation.
#[must_use]
pub fn jetty_install_parameters(request: &JettyInstallRequest) -> InstallerParameters {
    let mut params = InstallerParameters::new();
    params.set_flag("ibmi.secure", false);
    params.set_opt("install.library", request.library.clone());
    params.set("install.directory", request.ifs_path.clone());
    params.set_opt("jetty.user", request.user.clone());
    params.set_opt("install.iasp", request.iasp.clone());
    params.set_opt("jetty.port", request.port.map(|p| p.to_string()));
    params.set("jetty.secure.port", "0");
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_order_and_replaces_in_place() {
        let mut params = InstallerParameters::new();
        params.set("a", "1");
        params.set("b", "2");
        params.set("a", "3");
        assert_eq!(
            params.iter().collect::<Vec<_>>(),
            vec![("a", "3"), ("b", "2")]
        );
    }

    #[test]
    fn empty_values_fall_back_to_package_defaults() {
        let mut params = InstallerParameters::new();
        params.set_opt("afs.starter.library", Some(String::new()));
        params.set_opt("afs.http.port", None::<String>);
        assert!(params.is_empty());
    }

    #[test]
    fn afs_parameters_pin_secure_defaults() {
        let request = AfsInstallRequest {
            ifs_path: "/opt/afs/demo".to_string(),
            user: "AFSUSER".to_string(),
            instance: Some("AFSDEMO".to_string()),
            port: Some(5260),
            ..AfsInstallRequest::default()
        };
        let params = afs_install_parameters(&request);
        assert_eq!(params.get("ibmi.secure"), Some("n"));
        assert_eq!(params.get("afs.https.port"), Some("0"));
        assert_eq!(params.get("afs.http.port"), Some("5260"));
        assert_eq!(params.get("afs.starter.library"), None);
    }

    #[test]
    fn renders_quoted_java_arguments_and_properties_lines() {
        let mut params = InstallerParameters::new();
        params.set("install.directory", "/opt/afs demo");
        params.set_flag("ibmi.secure", true);
        assert_eq!(
            params.java_args(),
            "-D'install.directory=/opt/afs demo' -D'ibmi.secure=y'"
        );
        assert_eq!(
            params.properties_content(),
            "install.directory=/opt/afs demo\nibmi.secure=y\n"
        );
    }

    #[test]
    fn jetty_parameters_disable_the_secure_port() {
        let params = jetty_install_parameters(&JettyInstallRequest {
            ifs_path: "/opt/jetty".to_string(),
            port: Some(8080),
            ..JettyInstallRequest::default()
        });
        assert_eq!(params.get("jetty.secure.port"), Some("0"));
        assert_eq!(params.get("jetty.port"), Some("8080"));
        assert_eq!(params.get("jetty.user"), None);
    }
}
