//! Field analyzers.
//!
//! Approximations of the built-in analyzers of an Elasticsearch-style engine:
//!
//! - `standard` - splits on anything that is not a letter or digit, lowercases
//! - `simple` - splits on anything that is not a letter, lowercases
//! - `whitespace` - splits on whitespace, keeps case
//! - `keyword` - the whole value is one token

use std::ops::Range;

use crate::{AnalyzeError, AnalyzedField, Token};

/// A built-in analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analyzer {
    /// Letters and digits, lowercased.
    Standard,
    /// Letters only, lowercased.
    Simple,
    /// Whitespace separated, case preserved.
    Whitespace,
    /// Whole value.
    Keyword,
}

impl Analyzer {
    /// Looks up an analyzer by its configuration name.
    pub fn from_name(name: &str) -> Result<Self, AnalyzeError> {
        match name {
            "standard" => Ok(Self::Standard),
            "simple" => Ok(Self::Simple),
            "whitespace" => Ok(Self::Whitespace),
            "keyword" => Ok(Self::Keyword),
            other => Err(AnalyzeError::UnknownAnalyzer(other.to_string())),
        }
    }

    /// Analyzes a field value into position-ordered tokens.
    pub fn analyze(self, field_name: &str, text: &str) -> AnalyzedField {
        let tokens = self
            .spans(text)
            .into_iter()
            .enumerate()
            .map(|(position, span)| Token {
                field_name: field_name.to_string(),
                term: self.normalize(&text[span.clone()]),
                position: u32::try_from(position).unwrap_or(u32::MAX),
                start_offset: span.start,
                end_offset: span.end,
            })
            .collect();

        AnalyzedField {
            field_name: field_name.to_string(),
            tokens,
        }
    }

    /// Analyzes query text into its terms.
    pub fn terms(self, text: &str) -> Vec<String> {
        self.spans(text)
            .into_iter()
            .map(|span| self.normalize(&text[span]))
            .collect()
    }

    /// Applies the analyzer's case folding to a single term.
    pub fn normalize(self, term: &str) -> String {
        match self {
            Self::Standard | Self::Simple => term.to_lowercase(),
            Self::Whitespace | Self::Keyword => term.to_string(),
        }
    }

    /// Byte ranges of the tokens in `text`.
    fn spans(self, text: &str) -> Vec<Range<usize>> {
        match self {
            Self::Standard => runs(text, char::is_alphanumeric),
            Self::Simple => runs(text, char::is_alphabetic),
            Self::Whitespace => runs(text, |c| !c.is_whitespace()),
            Self::Keyword if text.is_empty() => Vec::new(),
            Self::Keyword => vec![0..text.len()],
        }
    }
}

/// Maximal runs of characters satisfying `keep`.
fn runs(text: &str, keep: impl Fn(char) -> bool) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = None;

    for (offset, c) in text.char_indices() {
        match (keep(c), start) {
            (true, None) => start = Some(offset),
            (false, Some(s)) => {
                spans.push(s..offset);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push(s..text.len());
    }

    spans
}
