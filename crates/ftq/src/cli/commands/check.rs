//! Implementation of `ftq check`.

use std::process::ExitCode;

use ftq_config::{ConfigWarning, discover_config_files};

use crate::cli::{
    context::CommandContext,
    output::{dim, subheader, success, warning},
};

/// Exit codes for `ftq check`.
mod exit_codes {
    use std::process::ExitCode;

    /// Configuration is valid with no warnings.
    pub const OK: ExitCode = ExitCode::SUCCESS;
    /// Configuration has warnings but is usable.
    pub const WARNINGS: ExitCode = ExitCode::FAILURE;
    /// Configuration has errors and cannot be used.
    pub const ERROR: ExitCode = ExitCode::FAILURE;
}

/// Shows configuration files, the index target, and validation warnings.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let config_files = discover_config_files(&ctx.cwd);
    if config_files.is_empty() {
        println!("{}", dim("No configuration files found."));
        println!();
        println!(
            "Run {} to create a configuration file.",
            subheader("ftq init")
        );
        return exit_codes::OK;
    }

    println!("{}", subheader("Config files:"));
    for path in &config_files {
        println!("   {}", path.display());
    }
    println!();

    let config = &ctx.config;
    println!("{}", subheader("Index:"));
    println!("   {}", config.index.name);
    if let Some(field) = &config.index.default_field {
        println!("   {}", dim(&format!("default field: {field}")));
    }
    if config.index.as_filter {
        println!("   {}", dim("rewritten as a base filter"));
    }
    if let Some(mapping) = &config.index.mapping {
        println!("   {}", dim(&format!("mapping: {}", mapping.display())));
    }
    println!();

    let mappings = match config.mappings() {
        Ok(mappings) => mappings,
        Err(e) => {
            eprintln!("error: failed to load field mappings: {e}");
            return exit_codes::ERROR;
        }
    };
    println!("{}", subheader("Fields:"));
    println!("   {} mapped", mappings.len());
    println!();

    let warnings = config.validate(&mappings);
    if warnings.is_empty() {
        println!("{}", success("No issues found."));
        return exit_codes::OK;
    }

    println!("{}", subheader(&format!("Warnings ({}):", warnings.len())));
    for w in &warnings {
        println!("   {}", warning(&w.to_string()));
    }
    println!();

    print_hints(&warnings);

    exit_codes::WARNINGS
}

/// Prints hints for resolving common warnings.
fn print_hints(warnings: &[ConfigWarning]) {
    for w in warnings {
        let hint = match w {
            ConfigWarning::NoFieldsDefined => {
                "Hint: add [fields.NAME] tables or set [index] mapping in .ftq.toml"
            }
            ConfigWarning::DefaultFieldUnmapped { .. } => {
                "Hint: map the default field or change [index] default_field"
            }
            ConfigWarning::UnknownAnalyzer { .. } => {
                "Hint: known analyzers are standard, simple, whitespace and keyword"
            }
            ConfigWarning::AliasCollision { .. } | ConfigWarning::NestedPathNotPrefix { .. } => {
                continue;
            }
        };
        println!("{}", dim(hint));
    }
}
