//! Configuration file parsing.
//!
//! Parses individual `.cql.toml` files into `RawConfig` values whose fields
//! are all optional, so partial files can be merged.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{ConfigError, OutputFormat};

/// Raw configuration as parsed directly from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    /// When true, stop discovery here - ignore parent and global configs.
    pub root: Option<bool>,
    /// Parser defaults.
    pub parser: Option<RawParserSettings>,
    /// Rendering settings.
    pub output: Option<RawOutputSettings>,
}

/// Raw `[parser]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawParserSettings {
    /// Index used by clauses that name none.
    pub server_choice_field: Option<String>,
    /// Relation used by clauses that name none.
    pub server_choice_relation: Option<String>,
}

/// Raw `[output]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawOutputSettings {
    /// Default rendering.
    pub format: Option<OutputFormat>,
    /// FQ indent unit.
    pub indent: Option<String>,
    /// FQ newline string.
    pub newline: Option<String>,
    /// XCQL indent character, kept as a string until validated.
    pub xml_indent_char: Option<String>,
}

/// Parses a configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Checks if a config file has `root = true` set.
///
/// Returns false if the file cannot be read or parsed.
pub fn is_root_config(path: &Path) -> bool {
    parse_config_file(path).is_ok_and(|config| config.root == Some(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parses `contents`, panicking on error.
    fn parse(contents: &str) -> RawConfig {
        parse_config_str(contents, Path::new("test.toml")).unwrap()
    }

    #[test]
    fn empty_config() {
        let config = parse("");
        assert!(config.root.is_none());
        assert!(config.parser.is_none());
        assert!(config.output.is_none());
    }

    #[test]
    fn full_config() {
        let config = parse(
            r#"
root = true

[parser]
server_choice_field = "dc.anywhere"
server_choice_relation = "all"

[output]
format = "xcql"
indent = "\t"
newline = "\r\n"
xml_indent_char = "\t"
"#,
        );
        assert_eq!(config.root, Some(true));
        let parser = config.parser.unwrap();
        assert_eq!(parser.server_choice_field.as_deref(), Some("dc.anywhere"));
        assert_eq!(parser.server_choice_relation.as_deref(), Some("all"));
        let output = config.output.unwrap();
        assert_eq!(output.format, Some(OutputFormat::Xcql));
        assert_eq!(output.indent.as_deref(), Some("\t"));
        assert_eq!(output.newline.as_deref(), Some("\r\n"));
    }

    #[test]
    fn partial_section() {
        let config = parse("[output]\nformat = \"fq\"\n");
        let output = config.output.unwrap();
        assert_eq!(output.format, Some(OutputFormat::Fq));
        assert!(output.indent.is_none());
    }

    #[test]
    fn unknown_format_rejected() {
        let err = parse_config_str("[output]\nformat = \"yaml\"\n", Path::new("x.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }

    #[test]
    fn unknown_key_rejected() {
        let err = parse_config_str("[parser]\nserver_choice = \"x\"\n", Path::new("x.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("x.toml"));
    }

    #[test]
    fn missing_file() {
        let err = parse_config_file(Path::new("/nonexistent/.cql.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
        assert!(!is_root_config(Path::new("/nonexistent/.cql.toml")));
    }
}
