//! Implementation of `cql parse`.

use std::process::ExitCode;

use cql_query::parse_with;
use tracing::debug;

use crate::cli::{
    args::ParseCommand,
    context::CommandContext,
    output::{print_error, print_rendered},
};

/// Parses each query and prints it in the selected format.
///
/// Stops at the first query that fails to parse.
pub fn run(ctx: &CommandContext, cmd: &ParseCommand) -> ExitCode {
    let server_choice = ctx.server_choice(&cmd.server_choice);
    let renderer = ctx.renderer(&cmd.render);

    for query in &cmd.queries {
        debug!(query = %query, format = %renderer.format, "parsing query");
        match parse_with(query, &server_choice) {
            Ok(node) => print_rendered(&renderer.render(&node)),
            Err(e) => {
                print_error(&e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
