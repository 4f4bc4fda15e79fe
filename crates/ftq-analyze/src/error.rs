//! Error types for the ftq-analyze crate.

use thiserror::Error;

/// Errors that can occur while analyzing or highlighting.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The analyzer name is not one of the built-in analyzers.
    #[error("unknown analyzer '{0}' (expected one of: standard, simple, whitespace, keyword)")]
    UnknownAnalyzer(String),

    /// A regex or wildcard leaf did not compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as written in the query.
        pattern: String,
        /// Compilation error.
        source: regex::Error,
    },
}
