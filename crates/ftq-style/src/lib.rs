//! Terminal styling for ftq.
//!
//! Syntax highlighting of wire documents and configuration files, ANSI tones for status
//! output, and a colorizer for rewritten-tree dumps.

use syntect::{
    easy::HighlightLines,
    highlighting::Style,
    parsing::SyntaxSet,
    util::{LinesWithEndings, as_24_bit_terminal_escaped},
};
use two_face::{
    syntax::extra_newlines as extra_syntaxes,
    theme::{EmbeddedLazyThemeSet, EmbeddedThemeName, extra as extra_themes},
};

/// Resets all terminal formatting.
pub const RESET: &str = "\x1b[0m";

/// Clause labels emitted by the tree dumper.
const CLAUSE_LABELS: &[&str] = &["must:", "filter:", "should:", "must_not:"];

/// Highlights structured text for terminal output.
pub struct Highlighter {
    /// Language definitions, including TOML and JSON.
    syntax_set: SyntaxSet,
    /// Lazily decoded color themes.
    theme_set: EmbeddedLazyThemeSet,
    /// Theme used for every highlight.
    theme: EmbeddedThemeName,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    /// Creates a highlighter using the Dracula theme.
    pub fn new() -> Self {
        Self {
            syntax_set: extra_syntaxes(),
            theme_set: extra_themes(),
            theme: EmbeddedThemeName::Dracula,
        }
    }

    /// Highlights a JSON document.
    pub fn highlight_json(&self, content: &str) -> String {
        self.highlight(content, "json")
    }

    /// Highlights TOML configuration.
    pub fn highlight_toml(&self, content: &str) -> String {
        self.highlight(content, "toml")
    }

    /// Highlights `content` as the syntax named by extension or name.
    ///
    /// Unknown syntaxes fall back to plain text.
    pub fn highlight(&self, content: &str, syntax_name: &str) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_extension(syntax_name)
            .or_else(|| self.syntax_set.find_syntax_by_name(syntax_name))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut lines = HighlightLines::new(syntax, self.theme_set.get(self.theme));
        let mut output = String::with_capacity(content.len() * 2);
        for line in LinesWithEndings::from(content) {
            let ranges: Vec<(Style, &str)> = lines
                .highlight_line(line, &self.syntax_set)
                .unwrap_or_else(|_| vec![(Style::default(), line)]);
            output.push_str(&as_24_bit_terminal_escaped(&ranges, false));
        }
        output.push_str(RESET);
        output
    }
}

/// ANSI tones used across the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Bold cyan.
    Header,
    /// Bold.
    Strong,
    /// Faint.
    Dim,
    /// Green.
    Success,
    /// Yellow.
    Warning,
    /// Red.
    Error,
}

impl Tone {
    /// The escape sequence that starts this tone.
    pub fn code(self) -> &'static str {
        match self {
            Self::Header => "\x1b[1m\x1b[36m",
            Self::Strong => "\x1b[1m",
            Self::Dim => "\x1b[2m",
            Self::Success => "\x1b[32m",
            Self::Warning => "\x1b[33m",
            Self::Error => "\x1b[31m",
        }
    }

    /// Wraps `text` in this tone.
    pub fn paint(self, text: &str) -> String {
        format!("{}{text}{RESET}", self.code())
    }
}

/// Formats a section header.
pub fn header(text: &str) -> String {
    Tone::Header.paint(text)
}

/// Formats a subheader.
pub fn subheader(text: &str) -> String {
    Tone::Strong.paint(text)
}

/// Formats secondary text.
pub fn dim(text: &str) -> String {
    Tone::Dim.paint(text)
}

/// Formats a success message.
pub fn success(text: &str) -> String {
    Tone::Success.paint(text)
}

/// Formats a warning.
pub fn warning(text: &str) -> String {
    Tone::Warning.paint(text)
}

/// Formats an error.
pub fn error(text: &str) -> String {
    Tone::Error.paint(text)
}

/// A dimmed horizontal rule.
pub fn rule(width: usize) -> String {
    dim(&"─".repeat(width))
}

/// Indents every non-empty line of `content` by `width` spaces.
pub fn indent(content: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    content
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Colorizes a rewritten-tree dump.
///
/// Node names are highlighted and clause labels dimmed. Node arguments and indentation
/// pass through unchanged, so stripping escapes restores the original dump.
pub fn style_dump(dump: &str) -> String {
    dump.lines()
        .map(style_dump_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Colorizes one dump line.
fn style_dump_line(line: &str) -> String {
    let body = line.trim_start();
    let indentation = &line[..line.len() - body.len()];

    if CLAUSE_LABELS.contains(&body) {
        return format!("{indentation}{}", dim(body));
    }

    let split = body.find('(').unwrap_or(body.len());
    let (name, args) = body.split_at(split);
    format!("{indentation}{}{args}", header(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Removes ANSI escapes.
    fn strip(input: &str) -> String {
        let mut out = String::new();
        let mut chars = input.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_highlight_json() {
        let hl = Highlighter::new();
        let out = hl.highlight_json("{\"match_all\": {}}\n");
        assert!(out.contains("\x1b["));
        assert!(out.ends_with(RESET));
        assert_eq!(strip(&out), "{\"match_all\": {}}\n");
    }

    #[test]
    fn test_highlight_toml() {
        let hl = Highlighter::new();
        let out = hl.highlight_toml("[index]\nname = \"docs\"\n");
        assert!(out.contains("\x1b[38;2;"));
        assert!(out.ends_with(RESET));
    }

    #[test]
    fn test_unknown_syntax_is_plain() {
        let hl = Highlighter::new();
        assert_eq!(strip(&hl.highlight("a b c", "no-such-syntax")), "a b c");
    }

    #[test]
    fn test_syntaxes_available() {
        let ss = extra_syntaxes();
        assert!(ss.find_syntax_by_extension("json").is_some());
        assert!(ss.find_syntax_by_extension("toml").is_some());
    }

    #[test]
    fn test_tones() {
        let h = header("Fields");
        assert!(h.starts_with("\x1b[1m\x1b[36m"));
        assert!(h.ends_with(RESET));
        assert_eq!(strip(&warning("careful")), "careful");
        assert_eq!(error("x"), "\x1b[31mx\x1b[0m");
    }

    #[test]
    fn test_indent_skips_blank_lines() {
        assert_eq!(indent("a\n\nb", 2), "  a\n\n  b");
    }

    #[test]
    fn test_style_dump_round_trips() {
        let dump = "Bool\n  must:\n    Match(body, \"rust\")\n  must_not:\n    Exists(status)";
        let styled = style_dump(dump);
        assert_eq!(strip(&styled), dump);
        assert!(styled.contains(&dim("must_not:")));
        assert!(styled.contains(&format!("    {}(body, \"rust\")", header("Match"))));
    }
}
