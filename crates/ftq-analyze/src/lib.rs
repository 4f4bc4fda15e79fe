//! Field analysis and query highlighting for ftq.
//!
//! Field values are analyzed into [`Token`]s with the analyzer their mapping names. A
//! rewritten query can then be matched against those tokens to find what it would
//! highlight. Tokens are always reported in canonical order: by field name, then position.
//!
//! # Example
//!
//! ```
//! use ftq_analyze::{Token, sorted_tokens};
//!
//! let tokens = sorted_tokens([
//!     Token::new("b", "x", 2, 0, 1),
//!     Token::new("a", "y", 5, 0, 1),
//!     Token::new("a", "z", 1, 0, 1),
//! ]);
//! let order: Vec<_> = tokens.iter().map(|t| (t.field_name.as_str(), t.position)).collect();
//! assert_eq!(order, vec![("a", 1), ("a", 5), ("b", 2)]);
//! ```

mod analyzer;
mod error;
mod highlight;
mod token;

pub use analyzer::Analyzer;
pub use error::AnalyzeError;
use ftq_config::FieldMapping;
pub use highlight::highlight;
pub use token::{AnalyzedField, Token, sort_tokens, sorted_tokens};

/// Analyzes a value of a mapped field with the field's analyzer.
///
/// Tokens are named after the field's canonical path, which is what rewritten queries
/// refer to.
pub fn analyze_field(mapping: &FieldMapping, value: &str) -> Result<AnalyzedField, AnalyzeError> {
    let analyzer = Analyzer::from_name(mapping.analyzer_name())?;
    Ok(analyzer.analyze(&mapping.path, value))
}
