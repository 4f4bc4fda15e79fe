//! Clap argument definitions for the `ftq` CLI.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Parses a `FIELD=VALUE` pair.
fn parse_field_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((field, value)) if !field.is_empty() => Ok((field.to_string(), value.to_string())),
        _ => Err(format!("expected FIELD=VALUE, got '{s}'")),
    }
}

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "ftq", version)]
#[command(about = "Rewrite full-text query strings into search-engine query documents")]
pub struct Cli {
    /// Log verbosity (-v for debug, -vv for trace; RUST_LOG takes precedence)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Flags that override the configured rewrite target.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Index to rewrite against [default: from configuration]
    #[arg(long)]
    pub index: Option<String>,

    /// Field unscoped terms match [default: from configuration]
    #[arg(short = 'd', long)]
    pub default_field: Option<String>,

    /// Wrap the query as a non-scoring base filter
    #[arg(long)]
    pub filter: bool,

    /// Elasticsearch-style JSON mapping file, replacing the configured one
    #[arg(short = 'm', long)]
    pub mapping: Option<PathBuf>,
}

/// Arguments for `ftq rewrite`.
#[derive(Args, Debug, Clone)]
pub struct RewriteCommand {
    /// Query strings to rewrite
    #[arg(required = true)]
    pub queries: Vec<String>,

    #[command(flatten)]
    /// Rewrite target overrides.
    pub target: TargetArgs,

    /// Print each document on a single line
    #[arg(long)]
    pub compact: bool,
}

/// Arguments for `ftq ast`.
#[derive(Args, Debug, Clone)]
pub struct AstCommand {
    /// Query string to inspect
    pub query: String,

    #[command(flatten)]
    /// Rewrite target overrides.
    pub target: TargetArgs,

    /// Show the parser's tree instead of the rewritten one
    #[arg(long, conflicts_with = "tokens")]
    pub parsed: bool,

    /// Show the lexer's token stream
    #[arg(long)]
    pub tokens: bool,
}

/// Arguments for `ftq highlight`.
#[derive(Args, Debug, Clone)]
pub struct HighlightCommand {
    /// Query string to highlight with
    pub query: String,

    /// Field value to analyze, as FIELD=VALUE (repeatable)
    #[arg(short = 't', long = "text", required = true, value_parser = parse_field_value)]
    pub texts: Vec<(String, String)>,

    #[command(flatten)]
    /// Rewrite target overrides.
    pub target: TargetArgs,

    /// Output tokens as JSON records
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `ftq fields`.
#[derive(Args, Debug, Clone)]
pub struct FieldsCommand {
    /// Elasticsearch-style JSON mapping file, replacing the configured one
    #[arg(short = 'm', long)]
    pub mapping: Option<PathBuf>,

    /// Output fields as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `ftq init`.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Create global ~/.ftq.toml instead
    #[arg(long)]
    pub global: bool,

    /// Overwrite existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Supported `ftq` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite queries into wire query documents
    #[command(after_help = "\
QUERY SYNTAX:
  term                Term in the default field
  title:term          Term in a specific field
  \"exact phrase\"~2    Phrase, optionally with slop
  a b / a AND b       Both must match
  a OR b              Either matches
  -a / NOT a          Must not match
  title:(a OR b)      Field scope over a group
  term^2              Boost
  ru?t* / rust~1      Wildcard / fuzzy
  title:/ru[sz]t/     Regular expression
  price:[10 TO 20}    Range, inclusive [ ] or exclusive { }
  price:>=10          Comparator range
  title:*             Field has a value
  *                   Every document

EXAMPLES:
  ftq rewrite 'rust OR golang -deprecated'
  ftq rewrite --compact 'title:\"error handling\"~2^3'
  ftq rewrite --filter 'status:open created:>=now-7d'")]
    Rewrite(RewriteCommand),

    /// Show the rewritten, parsed, or tokenized form of a query
    Ast(AstCommand),

    /// Show which tokens of field values a query matches
    #[command(after_help = "\
EXAMPLES:
  ftq highlight 'rust OR \"error handling\"' --text 'body=Error handling in Rust'
  ftq highlight 'title:rust' -t 'title=The Rust Book' -t 'body=rust' --json")]
    Highlight(HighlightCommand),

    /// List the mapped fields
    Fields(FieldsCommand),

    /// Initialize ftq configuration in current directory
    Init(InitCommand),

    /// Validate configuration and field mappings
    Check,

    /// Show effective configuration settings
    Config,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn field_value_pairs() {
        assert_eq!(
            parse_field_value("body=a=b").unwrap(),
            ("body".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_field_value("title=").unwrap(),
            ("title".to_string(), String::new())
        );
        assert!(parse_field_value("novalue").is_err());
        assert!(parse_field_value("=x").is_err());
    }
}
