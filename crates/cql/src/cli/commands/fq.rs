//! Implementation of `cql fq`.

use std::{
    fs,
    io::{self, Read},
    path::Path,
    process::ExitCode,
};

use cql_query::parse_from_fq_with;
use tracing::debug;

use crate::cli::{
    args::FqCommand,
    context::CommandContext,
    output::{print_error, print_rendered},
};

/// Reads an FQ document and prints it in the selected format.
pub fn run(ctx: &CommandContext, cmd: &FqCommand) -> ExitCode {
    let text = match read_input(cmd.input.as_deref()) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("error: failed to read FQ input: {e}");
            return ExitCode::FAILURE;
        }
    };

    let server_choice = ctx.server_choice(&cmd.server_choice);
    let renderer = ctx.renderer(&cmd.render);

    match parse_from_fq_with(&text, &server_choice) {
        Ok(node) => {
            print_rendered(&renderer.render(&node));
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}

/// Resolves the input argument to FQ text.
///
/// `None` and `-` read stdin; an existing file is read from disk; anything else is taken as
/// the FQ text itself.
fn read_input(input: Option<&str>) -> io::Result<String> {
    match input {
        None | Some("-") => {
            debug!("reading FQ from stdin");
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
        Some(arg) if Path::new(arg).is_file() => {
            debug!(path = %arg, "reading FQ from file");
            fs::read_to_string(arg)
        }
        Some(arg) => Ok(arg.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_argument() {
        let text = read_input(Some("{\"term\": \"a\"}")).unwrap();
        assert_eq!(text, "{\"term\": \"a\"}");
    }

    #[test]
    fn file_argument() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query.json");
        fs::write(&path, "{\"term\": \"fish\"}").unwrap();
        let text = read_input(path.to_str()).unwrap();
        assert_eq!(text, "{\"term\": \"fish\"}");
    }
}
