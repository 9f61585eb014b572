//! Configuration system for cql.
//!
//! cql uses TOML configuration files named `.cql.toml`. Configuration is resolved by walking up
//! the directory tree from the current working directory, collecting any `.cql.toml` files
//! found, then loading `~/.cql.toml` as the global config with lowest precedence.

#![warn(missing_docs)]

mod discovery;
mod error;
mod merge;
mod parse;

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use cql_query::{DEFAULT_SERVER_CHOICE_FIELD, DEFAULT_SERVER_CHOICE_RELATION, ServerChoice};
pub use discovery::{CONFIG_FILENAME, discover_config_files, global_config_path, is_global_config};
pub use error::ConfigError;
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{
    RawConfig, RawOutputSettings, RawParserSettings, is_root_config, parse_config_file,
    parse_config_str,
};
use serde::{Deserialize, Serialize};

/// Top-level merged configuration for cql.
///
/// This represents the fully resolved configuration after merging all discovered `.cql.toml`
/// files according to precedence rules.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parser defaults.
    pub parser: ParserSettings,
    /// Rendering settings.
    pub output: OutputSettings,
    /// Files that contributed, highest precedence first.
    pub sources: Vec<PathBuf>,
}

impl Config {
    /// Loads configuration by discovering and merging all relevant `.cql.toml` files.
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_files = discover_config_files(cwd);
        Self::load_from_files(&config_files)
    }

    /// Loads configuration from a specific list of config file paths.
    ///
    /// Files should be provided in precedence order: highest precedence first.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let parsed: Vec<ParsedConfig> = files
            .iter()
            .map(|path| {
                let config = parse_config_file(path)?;
                Ok(ParsedConfig {
                    path: path.clone(),
                    config,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        merge_configs(&parsed)
    }

    /// Serializes the effective settings to TOML format.
    ///
    /// The output has the same shape as a `.cql.toml` file.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let serializable = SerializableConfig {
            parser: &self.parser,
            output: &self.output,
        };
        Ok(toml::to_string_pretty(&serializable)?)
    }
}

/// Settings for the `[parser]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Index used by clauses that name none.
    pub server_choice_field: String,
    /// Relation used by clauses that name none.
    pub server_choice_relation: String,
}

impl ParserSettings {
    /// The server-choice defaults to hand to the parser.
    pub fn server_choice(&self) -> ServerChoice {
        ServerChoice::new(&self.server_choice_field, &self.server_choice_relation)
    }
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            server_choice_field: DEFAULT_SERVER_CHOICE_FIELD.to_string(),
            server_choice_relation: DEFAULT_SERVER_CHOICE_RELATION.to_string(),
        }
    }
}

/// Settings for the `[output]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Default rendering.
    pub format: OutputFormat,
    /// FQ indent unit.
    pub indent: String,
    /// FQ newline string.
    pub newline: String,
    /// XCQL indent character.
    pub xml_indent_char: char,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            indent: String::from("  "),
            newline: String::from("\n"),
            xml_indent_char: ' ',
        }
    }
}

/// How a query tree is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The XML form.
    Xcql,
    /// The JSON form.
    Fq,
    /// Canonical CQL text.
    #[default]
    Cql,
}

impl OutputFormat {
    /// The name used in config files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Xcql => "xcql",
            Self::Fq => "fq",
            Self::Cql => "cql",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xcql" | "xml" => Ok(Self::Xcql),
            "fq" | "json" => Ok(Self::Fq),
            "cql" => Ok(Self::Cql),
            _ => Err(format!("unknown format '{s}', expected one of: xcql, fq, cql")),
        }
    }
}

/// Borrowed view of the settings for TOML serialization.
#[derive(Serialize)]
struct SerializableConfig<'a> {
    /// Parser defaults.
    parser: &'a ParserSettings,
    /// Rendering settings.
    output: &'a OutputSettings,
}
