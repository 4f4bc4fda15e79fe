//! Implementation of `ftq init`.

use std::{fs, process::ExitCode};

use ftq_config::{CONFIG_FILENAME, global_config_path, global_template, local_template};
use ftq_style::{Highlighter, indent};

use crate::cli::{
    args::InitCommand,
    context::CommandContext,
    output::{failure, subheader},
};

/// Writes a commented-out `.ftq.toml` template.
pub fn run(ctx: &CommandContext, cmd: &InitCommand) -> ExitCode {
    let cwd = &ctx.cwd;

    let is_home_dir = global_config_path()
        .and_then(|p| p.parent().map(|home| home == cwd))
        .unwrap_or(false);
    let use_global = cmd.global || is_home_dir;

    let config_path = if use_global {
        match global_config_path() {
            Some(path) => path,
            None => return failure("could not determine home directory"),
        }
    } else {
        cwd.join(CONFIG_FILENAME)
    };

    if config_path.exists() && !cmd.force {
        eprintln!(
            "error: configuration file already exists: {}",
            config_path.display()
        );
        eprintln!("use --force to overwrite");
        return ExitCode::FAILURE;
    }

    let template = if use_global {
        global_template()
    } else {
        local_template()
    };

    if let Err(e) = fs::write(&config_path, &template) {
        return failure(format!("failed to write {}: {e}", config_path.display()));
    }

    println!("Created {}", config_path.display());
    println!();
    println!("{}", subheader("Configuration written:"));
    println!("{}", indent(&Highlighter::new().highlight_toml(&template), 2));

    ExitCode::SUCCESS
}
