//! Command-line interface for the `cql` query tool.

use std::process::ExitCode;

use cql::cli::{args::parse_cli, commands, context::CommandContext, logging};

fn main() -> ExitCode {
    let cli = parse_cli();
    logging::init(cli.verbose);

    let ctx = match CommandContext::load(cli.config.as_deref()) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    commands::run(cli.command, &ctx)
}
