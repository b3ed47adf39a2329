//! `osgi.cm.ini`-style configuration parsing
//!
//! Sections are `[name]` lines, entries are `key = value` pairs. Section
//! names and keys are lowercased; entries before the first section header
//! and `#` comment lines are ignored.

use afsctl_types::ServerConfiguration;
use std::collections::BTreeMap;

/// Parse configuration file content into sectioned key/value maps.
#[must_use]
pub fn parse_configuration(content: &str) -> ServerConfiguration {
    let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let mut section: Option<String> = None;

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_ascii_lowercase();
            sections.entry(name.clone()).or_default();
            section = Some(name);
        } else if let Some(section) = &section {
            if let Some((key, value)) = line.split_once('=') {
                if let Some(entries) = sections.get_mut(section) {
                    entries.insert(
                        key.trim().to_ascii_lowercase(),
                        value.trim().to_string(),
                    );
                }
            }
        }
    }

    ServerConfiguration {
        sections,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# ARCAD server configuration
[REST]
port = 5260
portSSL=5261

[logging]
level = INFO
orphan line without equals
";

    #[test]
    fn parses_sections_and_lowercases_keys() {
        let config = parse_configuration(SAMPLE);
        assert_eq!(config.get("rest", "port"), Some("5260"));
        assert_eq!(config.get("REST", "PortSSL"), Some("5261"));
        assert_eq!(config.get("logging", "level"), Some("INFO"));
        assert_eq!(config.error, None);
    }

    #[test]
    fn ignores_comments_and_preamble() {
        let config = parse_configuration("key = before any section\n# comment\n[a]\nx = 1\n");
        assert_eq!(config.sections.len(), 1);
        assert_eq!(config.get("a", "x"), Some("1"));
    }
}
