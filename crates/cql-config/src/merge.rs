//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single resolved `Config`,
//! applying precedence rules and validating each value against the file that
//! set it.

use std::path::{Path, PathBuf};

use crate::{
    Config, ConfigError, OutputSettings, ParserSettings,
    parse::{RawConfig, RawOutputSettings, RawParserSettings},
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges multiple configuration files into a single resolved `Config`.
///
/// Configs should be provided in precedence order: highest precedence first (closest to CWD),
/// lowest precedence last (global config). For every setting the first defined value wins.
pub fn merge_configs(configs: &[ParsedConfig]) -> Result<Config, ConfigError> {
    let mut parser = ParserSettings::default();
    let mut output = OutputSettings::default();

    // Iterate in reverse (lowest precedence first) so higher precedence overwrites
    for parsed in configs.iter().rev() {
        if let Some(ref raw) = parsed.config.parser {
            apply_parser_settings(&mut parser, raw, &parsed.path)?;
        }
        if let Some(ref raw) = parsed.config.output {
            apply_output_settings(&mut output, raw, &parsed.path)?;
        }
    }

    Ok(Config {
        parser,
        output,
        sources: configs.iter().map(|c| c.path.clone()).collect(),
    })
}

/// Applies a raw `[parser]` section, overwriting any present values.
fn apply_parser_settings(
    result: &mut ParserSettings,
    raw: &RawParserSettings,
    path: &Path,
) -> Result<(), ConfigError> {
    if let Some(ref v) = raw.server_choice_field {
        result.server_choice_field = non_empty(v, "parser.server_choice_field", path)?;
    }
    if let Some(ref v) = raw.server_choice_relation {
        result.server_choice_relation = non_empty(v, "parser.server_choice_relation", path)?;
    }
    Ok(())
}

/// Applies a raw `[output]` section, overwriting any present values.
fn apply_output_settings(
    result: &mut OutputSettings,
    raw: &RawOutputSettings,
    path: &Path,
) -> Result<(), ConfigError> {
    if let Some(v) = raw.format {
        result.format = v;
    }
    if let Some(ref v) = raw.indent {
        result.indent.clone_from(v);
    }
    if let Some(ref v) = raw.newline {
        result.newline.clone_from(v);
    }
    if let Some(ref v) = raw.xml_indent_char {
        let mut chars = v.chars();
        result.xml_indent_char = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(ConfigError::InvalidSetting {
                    path: path.to_path_buf(),
                    key: "output.xml_indent_char",
                    message: format!("expected exactly one character, got {v:?}"),
                });
            }
        };
    }
    Ok(())
}

/// Rejects empty or whitespace-only strings.
fn non_empty(value: &str, key: &'static str, path: &Path) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidSetting {
            path: path.to_path_buf(),
            key,
            message: "value cannot be empty".to_string(),
        });
    }
    Ok(value.to_string())
}
