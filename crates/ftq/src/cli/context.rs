//! Shared context for running CLI commands.

use std::{
    env,
    path::{Path, PathBuf},
    process::ExitCode,
};

use ftq_config::{Config, MappingSnapshot};
use ftq_rewrite::RewriteOptions;
use log::debug;

use super::args::TargetArgs;

/// Command execution context built once per CLI invocation.
pub struct CommandContext {
    /// Current working directory.
    pub cwd: PathBuf,
    /// Loaded configuration (may be default if no config files found).
    pub config: Config,
}

/// Everything a command needs to rewrite a query.
pub struct Target {
    /// Index the query is rewritten for.
    pub index: String,
    /// Effective field mappings.
    pub mappings: MappingSnapshot,
    /// Rewrite options after CLI overrides.
    pub options: RewriteOptions,
}

impl CommandContext {
    /// Loads the current directory and configuration.
    pub fn load() -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        let config = Config::load(&cwd).map_err(|e| {
            eprintln!("error: failed to load configuration: {e}");
            ExitCode::FAILURE
        })?;
        debug!(
            "loaded configuration from {} file(s) for index '{}'",
            config.sources.len(),
            config.index.name
        );
        Ok(Self { cwd, config })
    }

    /// Loads only the current directory, skipping configuration parsing.
    ///
    /// Used by `init`, which must work even when an existing config file is invalid.
    pub fn load_cwd_only() -> Result<Self, ExitCode> {
        Ok(Self {
            cwd: current_dir_or_failure()?,
            config: Config::default(),
        })
    }

    /// Builds the effective field mappings, optionally swapping in another mapping file.
    pub fn mappings(&self, mapping_override: Option<&Path>) -> Result<MappingSnapshot, ExitCode> {
        let result = match mapping_override {
            Some(path) => {
                let mut config = self.config.clone();
                config.index.mapping = Some(self.cwd.join(path));
                config.mappings()
            }
            None => self.config.mappings(),
        };
        result.map_err(|e| {
            eprintln!("error: failed to load field mappings: {e}");
            ExitCode::FAILURE
        })
    }

    /// Resolves the rewrite target from configuration and CLI overrides.
    pub fn target(&self, args: &TargetArgs) -> Result<Target, ExitCode> {
        let index = &self.config.index;
        let mut options = RewriteOptions::default().with_as_filter(args.filter || index.as_filter);
        if let Some(field) = args.default_field.as_ref().or(index.default_field.as_ref()) {
            options = options.with_default_field(field.as_str());
        }

        Ok(Target {
            index: args.index.clone().unwrap_or_else(|| index.name.clone()),
            mappings: self.mappings(args.mapping.as_deref())?,
            options,
        })
    }
}

/// Returns the current working directory or exits with a consistent error.
fn current_dir_or_failure() -> Result<PathBuf, ExitCode> {
    env::current_dir().map_err(|e| {
        eprintln!("error: could not determine current directory: {e}");
        ExitCode::FAILURE
    })
}
