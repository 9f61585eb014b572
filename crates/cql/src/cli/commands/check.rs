//! Implementation of `cql check`.

use std::process::ExitCode;

use cql_query::parse_with;
use tracing::debug;

use crate::cli::{
    args::CheckCommand,
    context::CommandContext,
    output::{CheckEntry, CheckReport, print_error, print_json},
};

/// Validates every query, reporting all failures.
///
/// Exits with failure if any query is invalid.
pub fn run(ctx: &CommandContext, cmd: &CheckCommand) -> ExitCode {
    let server_choice = ctx.server_choice(&cmd.server_choice);

    let entries: Vec<CheckEntry> = cmd
        .queries
        .iter()
        .map(|query| {
            let outcome = parse_with(query, &server_choice);
            debug!(query = %query, valid = outcome.is_ok(), "checked query");
            if !cmd.json
                && let Err(e) = &outcome
            {
                print_error(e);
            }
            CheckEntry::new(query, &outcome)
        })
        .collect();

    let report = CheckReport::new(entries);

    if cmd.json {
        if let Err(code) = print_json(&report) {
            return code;
        }
    } else if report.failed == 0 {
        println!("ok: {} queries valid", report.total);
    } else {
        eprintln!("{} of {} queries invalid", report.failed, report.total);
    }

    if report.failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
