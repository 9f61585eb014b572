//! Clap argument definitions for the `cql` CLI.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use cql_config::OutputFormat;

/// Parse an output format from a string.
fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse()
}

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "cql")]
#[command(about = "Parse and convert Contextual Query Language queries")]
pub struct Cli {
    /// Increase diagnostic logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Use this configuration file instead of discovering .cql.toml files
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared flags that override the configured server-choice defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct ServerChoiceArgs {
    /// Index for clauses that name none [default: cql.serverChoice]
    #[arg(long, value_name = "FIELD")]
    pub field: Option<String>,

    /// Relation for clauses that name none [default: scr]
    #[arg(long, value_name = "RELATION")]
    pub relation: Option<String>,
}

/// Shared output format flag.
#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Output format: xcql (XML), fq (JSON), cql (canonical text) [default: cql]
    #[arg(short = 'f', long, value_parser = parse_format)]
    pub format: Option<OutputFormat>,
}

/// Arguments for `cql parse`.
#[derive(Args, Debug, Clone)]
pub struct ParseCommand {
    /// Queries to parse
    #[arg(required = true)]
    pub queries: Vec<String>,

    #[command(flatten)]
    /// Output format override.
    pub render: RenderArgs,

    #[command(flatten)]
    /// Server-choice overrides.
    pub server_choice: ServerChoiceArgs,
}

/// Arguments for `cql fq`.
#[derive(Args, Debug, Clone)]
pub struct FqCommand {
    /// FQ JSON text, a path to a file containing it, or - for stdin [default: -]
    pub input: Option<String>,

    #[command(flatten)]
    /// Output format override.
    pub render: RenderArgs,

    #[command(flatten)]
    /// Server-choice overrides.
    pub server_choice: ServerChoiceArgs,
}

/// Arguments for `cql check`.
#[derive(Args, Debug, Clone)]
pub struct CheckCommand {
    /// Queries to validate
    #[arg(required = true)]
    pub queries: Vec<String>,

    /// Output a JSON report
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    /// Server-choice overrides.
    pub server_choice: ServerChoiceArgs,
}

/// Supported `cql` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Parse queries and print them in the selected format
    #[command(after_help = "\
QUERY SYNTAX:
  fish                      Term against the server-choice index
  title any fish            Index, relation, term
  title = \"old man\"         Quoted term
  a and b, a or b           Boolean operators (also not, prox)
  a prox/distance<3 b       Modifiers on relations and operators
  (a or b) and c            Grouping
  > dc = \"http://...\" ...   Prefix declaration

EXAMPLES:
  cql parse 'title any fish'
  cql parse -f xcql 'dc.title = \"sea\" and date > 1990'
  cql parse -f fq --field dc.anywhere 'whale'")]
    Parse(ParseCommand),

    /// Convert an FQ (JSON) query back into another format
    Fq(FqCommand),

    /// Validate queries and report every failure
    Check(CheckCommand),

    /// Show effective configuration settings
    Config,
}

/// Parses CLI arguments, exiting with clap's usage error on failure.
pub fn parse_cli() -> Cli {
    Cli::parse()
}
