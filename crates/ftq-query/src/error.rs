//! Error types for query lexing and parsing.
//!
//! `LexError` and `ParseError` carry the byte offset of the problem. `QueryError` wraps
//! either one together with the query text so it can render a caret diagnostic.

use std::{error, fmt};

use thiserror::Error;

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} (at offset {offset})")]
pub struct LexError {
    /// Byte offset in the input where the error occurred.
    pub offset: usize,
    /// What went wrong.
    pub reason: String,
}

impl LexError {
    /// Creates a new lexer error.
    pub fn new(reason: impl Into<String>, offset: usize) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }
}

/// Parse error with position information.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, found {found} (at offset {offset})")]
pub struct ParseError {
    /// Byte offset in the input where the error occurred.
    pub offset: usize,
    /// Description of what the grammar required here.
    pub expected: String,
    /// Description of what was actually present.
    pub found: String,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(offset: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            offset,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// A unified error type for query lexing and parsing.
///
/// This type provides detailed error messages with context, including
/// the original query string and a position indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    /// The kind of error that occurred.
    pub kind: QueryErrorKind,
    /// The original query string (if available).
    pub query: Option<String>,
}

/// The specific kind of query error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Tokenization failed.
    Lex(LexError),
    /// The token stream violated the grammar.
    Parse(ParseError),
}

impl QueryError {
    /// Creates a lex error.
    pub fn lex(reason: impl Into<String>, offset: usize, query: impl Into<String>) -> Self {
        Self {
            kind: QueryErrorKind::Lex(LexError::new(reason, offset)),
            query: Some(query.into()),
        }
    }

    /// Creates a parse error.
    pub fn parse(err: ParseError, query: Option<String>) -> Self {
        Self {
            kind: QueryErrorKind::Parse(err),
            query,
        }
    }

    /// Sets the query string for this error.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Returns the byte offset the error points at.
    pub fn offset(&self) -> usize {
        match &self.kind {
            QueryErrorKind::Lex(err) => err.offset,
            QueryErrorKind::Parse(err) => err.offset,
        }
    }

    /// Returns the error message without context.
    pub fn message(&self) -> String {
        match &self.kind {
            QueryErrorKind::Lex(err) => err.reason.clone(),
            QueryErrorKind::Parse(err) => format!("expected {}, found {}", err.expected, err.found),
        }
    }

    /// Returns the parse error, if this is one.
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match &self.kind {
            QueryErrorKind::Parse(err) => Some(err),
            QueryErrorKind::Lex(_) => None,
        }
    }

    /// Returns the lex error, if this is one.
    pub fn as_lex_error(&self) -> Option<&LexError> {
        match &self.kind {
            QueryErrorKind::Lex(err) => Some(err),
            QueryErrorKind::Parse(_) => None,
        }
    }

    /// Returns a suggestion for common errors.
    pub fn suggestion(&self) -> Option<&'static str> {
        match &self.kind {
            QueryErrorKind::Lex(err) if err.reason.contains("unclosed quote") => {
                Some("Add a closing quote (\") to complete the phrase")
            }
            QueryErrorKind::Lex(err) if err.reason.contains("unterminated regex") => {
                Some("Regular expressions are written as /pattern/")
            }
            QueryErrorKind::Lex(err) if err.reason.contains("escape") => {
                Some("Inside phrases only \\\" and \\\\ are valid escapes")
            }
            QueryErrorKind::Parse(err) if err.expected.contains("closing parenthesis") => {
                Some("Add a closing parenthesis ) to match the opening one")
            }
            QueryErrorKind::Parse(err) if err.found == "OR" || err.found == "AND" => {
                Some("Boolean operators require expressions on both sides, e.g., 'rust OR golang'")
            }
            QueryErrorKind::Parse(err) if err.expected.contains("'TO'") => {
                Some("Ranges are written as [low TO high], e.g., price:[10 TO 20]")
            }
            _ => None,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "query syntax error: {}", self.message())?;

        if let Some(query) = &self.query {
            writeln!(f, "  {query}")?;
            let clamped = self.offset().min(query.len());
            writeln!(f, "  {}^", " ".repeat(clamped))?;
        }

        if let Some(suggestion) = self.suggestion() {
            write!(f, "hint: {suggestion}")?;
        }

        Ok(())
    }
}

impl error::Error for QueryError {}

impl From<LexError> for QueryError {
    fn from(err: LexError) -> Self {
        Self {
            kind: QueryErrorKind::Lex(err),
            query: None,
        }
    }
}

impl From<ParseError> for QueryError {
    fn from(err: ParseError) -> Self {
        Self {
            kind: QueryErrorKind::Parse(err),
            query: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_display() {
        let err = QueryError::lex("unclosed quote", 0, "\"hello world");
        let display = err.to_string();
        assert!(display.contains("unclosed quote"));
        assert!(display.contains("\"hello world"));
        assert!(display.contains("^"));
        assert!(display.contains("hint:"));
    }

    #[test]
    fn parse_error_display_points_at_offset() {
        let err = QueryError::parse(
            ParseError::new(5, "closing parenthesis ')'", "end of query"),
            Some("(rust".to_string()),
        );
        let display = err.to_string();
        assert!(display.contains("expected closing parenthesis ')', found end of query"));
        assert!(display.contains("  (rust\n       ^"));
        assert!(display.contains("hint:"));
    }

    #[test]
    fn error_with_query() {
        let err = QueryError::from(ParseError::new(0, "x", "y")).with_query("xyz:value");
        assert_eq!(err.query.as_deref(), Some("xyz:value"));
    }

    #[test]
    fn offset_past_end_is_clamped() {
        let err = QueryError::lex("boom", 99, "ab");
        assert!(err.to_string().contains("  ab\n    ^"));
    }

    #[test]
    fn message_extraction() {
        let err = QueryError::lex("test message", 0, "query");
        assert_eq!(err.message(), "test message");
        assert!(err.as_lex_error().is_some());
        assert!(err.as_parse_error().is_none());
    }

    #[test]
    fn operator_error_suggestion() {
        let err = QueryError::from(ParseError::new(0, "expression", "OR"));
        assert!(err.suggestion().unwrap().contains("both sides"));
    }

    #[test]
    fn parse_error_standalone_display() {
        let err = ParseError::new(3, "'TO'", "term 'x'");
        assert_eq!(err.to_string(), "expected 'TO', found term 'x' (at offset 3)");
    }
}
