//! Shared context for running CLI commands.

use std::{
    env,
    path::{Path, PathBuf},
    process::ExitCode,
};

use cql_config::Config;
use cql_query::ServerChoice;
use tracing::{debug, info};

use crate::cli::{
    args::{RenderArgs, ServerChoiceArgs},
    output::Renderer,
};

/// Command execution context built once per CLI invocation.
pub struct CommandContext {
    /// Current working directory.
    pub cwd: PathBuf,
    /// Loaded configuration (may be default if no config files found).
    pub config: Config,
}

impl CommandContext {
    /// Loads the current directory and configuration.
    ///
    /// An explicit config path replaces discovery.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        let config = load_config_or_failure(&cwd, explicit)?;
        Ok(Self { cwd, config })
    }

    /// Server-choice defaults with any command-line overrides applied.
    pub fn server_choice(&self, args: &ServerChoiceArgs) -> ServerChoice {
        let mut choice = self.config.parser.server_choice();
        if let Some(field) = &args.field {
            choice.field.clone_from(field);
        }
        if let Some(relation) = &args.relation {
            choice.relation.clone_from(relation);
        }
        choice
    }

    /// Renderer for the configured output settings and format override.
    pub fn renderer(&self, args: &RenderArgs) -> Renderer {
        Renderer::new(&self.config.output, args.format)
    }
}

/// Returns the current working directory or exits with a consistent error.
fn current_dir_or_failure() -> Result<PathBuf, ExitCode> {
    env::current_dir().map_err(|e| {
        eprintln!("error: could not determine current directory: {e}");
        ExitCode::FAILURE
    })
}

/// Loads configuration from the explicit file or by discovery from `cwd`.
fn load_config_or_failure(cwd: &Path, explicit: Option<&Path>) -> Result<Config, ExitCode> {
    let loaded = match explicit {
        Some(path) => {
            debug!(path = %path.display(), "using explicit config file");
            Config::load_from_files(&[path.to_path_buf()])
        }
        None => {
            debug!(cwd = %cwd.display(), "discovering config files");
            Config::load(cwd)
        }
    };

    let config = loaded.map_err(|e| {
        eprintln!("error: failed to load configuration: {e}");
        ExitCode::FAILURE
    })?;

    if config.sources.is_empty() {
        debug!("no config files found, using defaults");
    }
    for source in &config.sources {
        info!(path = %source.display(), "loaded config");
    }
    Ok(config)
}
