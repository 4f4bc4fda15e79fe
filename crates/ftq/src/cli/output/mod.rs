//! Rendering helpers for CLI output.
//!
//! Output is colored only when stdout is a terminal, so piped documents stay parseable.

use std::{
    fmt::Display,
    io::{self, IsTerminal},
    process::ExitCode,
};

pub use ftq_style::{dim, header, subheader, success, warning};
use ftq_style::{Highlighter, style_dump};
use serde::Serialize;

/// True when stdout is attached to a terminal.
pub fn is_tty() -> bool {
    io::stdout().is_terminal()
}

/// Prints a value as JSON, highlighted on a terminal.
pub fn print_json<T: Serialize + ?Sized>(value: &T, compact: bool) -> Result<(), ExitCode> {
    let rendered = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    match rendered {
        Ok(json) if is_tty() => {
            print!("{}", Highlighter::new().highlight_json(&format!("{json}\n")));
            Ok(())
        }
        Ok(json) => {
            println!("{json}");
            Ok(())
        }
        Err(e) => Err(failure(format!("failed to serialize JSON: {e}"))),
    }
}

/// Prints a rewritten-tree dump, styled on a terminal.
pub fn print_dump(dump: &str) {
    if is_tty() {
        println!("{}", style_dump(dump));
    } else {
        println!("{dump}");
    }
}

/// Reports an error on stderr and returns a failing exit code.
pub fn failure(message: impl Display) -> ExitCode {
    eprintln!("error: {message}");
    ExitCode::FAILURE
}
