//! Rendering and JSON serialization for CLI output.

use std::process::ExitCode;

use cql_config::{OutputFormat, OutputSettings};
use cql_query::{CqlError, CqlNode};
use serde::Serialize;

/// Renders query trees in one output format.
#[derive(Debug, Clone)]
pub struct Renderer {
    /// Selected format.
    pub format: OutputFormat,
    /// FQ indent unit.
    indent: String,
    /// FQ newline string.
    newline: String,
    /// XCQL indent character.
    xml_indent_char: char,
}

impl Renderer {
    /// Builds a renderer from output settings, with an optional format override.
    pub fn new(settings: &OutputSettings, format: Option<OutputFormat>) -> Self {
        Self {
            format: format.unwrap_or(settings.format),
            indent: settings.indent.clone(),
            newline: settings.newline.clone(),
            xml_indent_char: settings.xml_indent_char,
        }
    }

    /// Renders `node` in the selected format.
    pub fn render(&self, node: &CqlNode) -> String {
        match self.format {
            OutputFormat::Xcql => node.to_xcql_with(self.xml_indent_char),
            OutputFormat::Fq => node.to_fq_with(&self.indent, &self.newline),
            OutputFormat::Cql => node.to_cql(),
        }
    }
}

/// Prints rendered output, ending it with exactly one newline.
pub fn print_rendered(text: &str) {
    println!("{}", text.trim_end_matches('\n'));
}

/// Prints a parse error with its caret diagnostic to stderr.
pub fn print_error(err: &CqlError) {
    eprintln!("error: {}", err.to_string().trim_end());
}

/// JSON report for `cql check`.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    /// Number of queries checked.
    pub total: usize,
    /// Number of queries that failed to parse.
    pub failed: usize,
    /// Per-query results in input order.
    pub queries: Vec<CheckEntry>,
}

/// Result of checking one query.
#[derive(Debug, Serialize)]
pub struct CheckEntry {
    /// The query as given.
    pub query: String,
    /// Whether the query parsed.
    pub valid: bool,
    /// Canonical form, for valid queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    /// Failure details, for invalid queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CheckFailure>,
}

/// Machine-readable parse failure.
#[derive(Debug, Serialize)]
pub struct CheckFailure {
    /// Stable error identifier.
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Byte offset of the failure.
    pub position: usize,
    /// Lookahead token text, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Hint for resolving the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<&'static str>,
}

impl CheckEntry {
    /// Builds an entry from a parse outcome.
    pub fn new(query: &str, outcome: &Result<CqlNode, CqlError>) -> Self {
        match outcome {
            Ok(node) => Self {
                query: query.to_string(),
                valid: true,
                canonical: Some(node.to_cql()),
                error: None,
            },
            Err(err) => Self {
                query: query.to_string(),
                valid: false,
                canonical: None,
                error: Some(CheckFailure {
                    kind: err.kind.code(),
                    message: err.message().to_string(),
                    position: err.position,
                    token: err.token.clone(),
                    suggestion: err.suggestion(),
                }),
            },
        }
    }
}

impl CheckReport {
    /// Collects entries into a report.
    pub fn new(queries: Vec<CheckEntry>) -> Self {
        Self {
            total: queries.len(),
            failed: queries.iter().filter(|q| !q.valid).count(),
            queries,
        }
    }
}

/// Prints a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), ExitCode> {
    match serde_json::to_string_pretty(value) {
        Ok(json_str) => {
            println!("{json_str}");
            Ok(())
        }
        Err(e) => {
            eprintln!("error: failed to serialize JSON: {e}");
            Err(ExitCode::FAILURE)
        }
    }
}
