//! Query-term highlighting.
//!
//! Walks the positive clauses of a rewritten query and selects the tokens of the analyzed
//! fields that each leaf matches. `must_not` clauses never highlight.

use std::{cmp::Ordering, collections::BTreeSet, ops::Bound};

use ftq_rewrite::{Query, ResolvedField, TypedValue};
use log::{debug, trace};
use regex::Regex;
use strsim::levenshtein;

use crate::{AnalyzeError, AnalyzedField, Analyzer, Token, sort_tokens};

/// Returns the tokens matched by `query`, in canonical order and without duplicates.
pub fn highlight(query: &Query, fields: &[AnalyzedField]) -> Result<Vec<Token>, AnalyzeError> {
    let mut highlighter = Highlighter {
        fields,
        matched: BTreeSet::new(),
    };
    highlighter.visit(query)?;

    let mut tokens: Vec<Token> = highlighter
        .matched
        .into_iter()
        .map(|(field, token)| fields[field].tokens[token].clone())
        .collect();
    sort_tokens(&mut tokens);

    debug!("highlighted {} tokens", tokens.len());
    Ok(tokens)
}

/// Collects matched tokens as (field index, token index) pairs.
struct Highlighter<'a> {
    /// Fields being highlighted.
    fields: &'a [AnalyzedField],
    /// Matches found so far.
    matched: BTreeSet<(usize, usize)>,
}

impl Highlighter<'_> {
    /// Visits a node, recursing through compound queries.
    fn visit(&mut self, query: &Query) -> Result<(), AnalyzeError> {
        match query {
            Query::MatchAll => Ok(()),
            Query::Nested { query, .. } | Query::Boost { query, .. } => self.visit(query),
            Query::Bool(clauses) => {
                for clause in clauses
                    .must
                    .iter()
                    .chain(&clauses.filter)
                    .chain(&clauses.should)
                {
                    self.visit(clause)?;
                }
                Ok(())
            }
            leaf => self.visit_leaf(leaf),
        }
    }

    /// Matches a leaf against the tokens of its field.
    fn visit_leaf(&mut self, leaf: &Query) -> Result<(), AnalyzeError> {
        let Some(field) = leaf.field() else {
            return Ok(());
        };
        trace!("highlighting {} on '{}'", leaf.kind(), field.path);

        for (index, analyzed) in self.fields.iter().enumerate() {
            if analyzed.field_name != field.path {
                continue;
            }
            let hits = leaf_hits(leaf, field, &analyzed.tokens)?;
            self.matched.extend(hits.into_iter().map(|token| (index, token)));
        }
        Ok(())
    }
}

/// Indices of the tokens a leaf matches.
fn leaf_hits(leaf: &Query, field: &ResolvedField, tokens: &[Token]) -> Result<Vec<usize>, AnalyzeError> {
    let analyzer = Analyzer::from_name(field.analyzer_name())?;

    let hits = match leaf {
        Query::Term { value, .. } => select(tokens, |term| term_equals(term, value)),
        Query::Match { text, .. } => {
            let terms = analyzer.terms(text);
            select(tokens, |term| terms.iter().any(|t| t == term))
        }
        Query::Phrase { text, slop, .. } => phrase_hits(tokens, &analyzer.terms(text), *slop),
        Query::Range { lower, upper, .. } => {
            select(tokens, |term| above(term, lower) && below(term, upper))
        }
        Query::Wildcard { pattern, .. } => {
            let regex = wildcard_regex(&analyzer.normalize(pattern))?;
            select(tokens, |term| regex.is_match(term))
        }
        Query::Regex { pattern, .. } => {
            let regex = compile(pattern, &format!("^(?:{pattern})$"))?;
            select(tokens, |term| regex.is_match(term))
        }
        Query::Fuzzy {
            value, distance, ..
        } => {
            let value = analyzer.normalize(value);
            let max = distance.map_or_else(|| auto_fuzziness(&value), usize::from);
            select(tokens, |term| levenshtein(term, &value) <= max)
        }
        Query::Exists { .. } => (0..tokens.len()).collect(),
        Query::MatchAll | Query::Nested { .. } | Query::Bool(_) | Query::Boost { .. } => {
            Vec::new()
        }
    };
    Ok(hits)
}

/// Indices of tokens whose term satisfies `predicate`.
fn select(tokens: &[Token], predicate: impl Fn(&str) -> bool) -> Vec<usize> {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| predicate(&token.term))
        .map(|(index, _)| index)
        .collect()
}

/// Exact equality between a token and a typed value.
fn term_equals(term: &str, value: &TypedValue) -> bool {
    match value {
        TypedValue::Text(text) => term == text,
        TypedValue::Integer(n) => term.parse::<i64>().is_ok_and(|t| t == *n),
        TypedValue::Float(n) => term.parse::<f64>().is_ok_and(|t| t == *n),
        TypedValue::Boolean(b) => term.eq_ignore_ascii_case(if *b { "true" } else { "false" }),
    }
}

/// Orders a token against a typed value; numbers compare numerically, text lexically.
fn compare(term: &str, value: &TypedValue) -> Option<Ordering> {
    match value {
        TypedValue::Text(text) => Some(term.cmp(text)),
        TypedValue::Integer(n) => term.parse::<i64>().ok().map(|t| t.cmp(n)),
        TypedValue::Float(n) => term.parse::<f64>().ok().and_then(|t| t.partial_cmp(n)),
        TypedValue::Boolean(_) => None,
    }
}

/// True if `term` lies above the lower end of a range.
fn above(term: &str, bound: &Bound<TypedValue>) -> bool {
    match bound {
        Bound::Unbounded => true,
        Bound::Included(value) => matches!(
            compare(term, value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Bound::Excluded(value) => compare(term, value) == Some(Ordering::Greater),
    }
}

/// True if `term` lies below the upper end of a range.
fn below(term: &str, bound: &Bound<TypedValue>) -> bool {
    match bound {
        Bound::Unbounded => true,
        Bound::Included(value) => {
            matches!(compare(term, value), Some(Ordering::Less | Ordering::Equal))
        }
        Bound::Excluded(value) => compare(term, value) == Some(Ordering::Less),
    }
}

/// Finds every occurrence of `terms` in order, allowing `slop` extra positions in total.
fn phrase_hits(tokens: &[Token], terms: &[String], slop: u32) -> Vec<usize> {
    let Some((first, rest)) = terms.split_first() else {
        return Vec::new();
    };
    let mut hits = Vec::new();

    for (start, token) in tokens.iter().enumerate() {
        if token.term != *first {
            continue;
        }

        let mut chain = vec![start];
        let mut last = token.position;
        for term in rest {
            let next = tokens
                .iter()
                .enumerate()
                .filter(|(_, t)| t.position > last && t.term == *term)
                .min_by_key(|(_, t)| t.position);
            let Some((index, next)) = next else {
                break;
            };
            chain.push(index);
            last = next.position;
        }

        if chain.len() != terms.len() {
            continue;
        }
        let span = last - token.position;
        let gaps = u32::try_from(rest.len()).unwrap_or(u32::MAX);
        if span.saturating_sub(gaps) <= slop {
            hits.extend(chain);
        }
    }

    hits
}

/// Edit distance the engine picks for a fuzzy term without an explicit one.
fn auto_fuzziness(term: &str) -> usize {
    match term.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

/// Translates a `*` / `?` pattern into an anchored regex. `\x` matches `x` literally.
fn wildcard_regex(pattern: &str) -> Result<Regex, AnalyzeError> {
    let mut source = String::from("^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            '\\' => {
                let literal = chars.next().unwrap_or('\\');
                source.push_str(&regex::escape(literal.encode_utf8(&mut [0; 4])));
            }
            c => source.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');
    compile(pattern, &source)
}

/// Compiles a regex, reporting failures against the pattern as written.
fn compile(pattern: &str, source: &str) -> Result<Regex, AnalyzeError> {
    Regex::new(source).map_err(|source| AnalyzeError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use ftq_config::{FieldMapping, FieldType};
    use ftq_rewrite::BoolQuery;

    use super::*;

    fn field(name: &str, field_type: FieldType) -> ResolvedField {
        ResolvedField::from(&FieldMapping::new(name, field_type))
    }

    fn body() -> ResolvedField {
        field("body", FieldType::Text)
    }

    fn analyzed() -> Vec<AnalyzedField> {
        vec![
            Analyzer::Standard.analyze("body", "Error handling in Rust makes error paths explicit"),
            Analyzer::Keyword.analyze("status", "open"),
            Analyzer::Keyword.analyze("views", "42"),
        ]
    }

    fn terms(query: &Query) -> Vec<(String, u32)> {
        highlight(query, &analyzed())
            .unwrap()
            .into_iter()
            .map(|t| (t.term, t.position))
            .collect()
    }

    fn pairs(items: &[(&str, u32)]) -> Vec<(String, u32)> {
        items.iter().map(|(t, p)| ((*t).to_string(), *p)).collect()
    }

    #[test]
    fn test_match_uses_field_analyzer() {
        let query = Query::Match {
            field: body(),
            text: "ERROR".into(),
        };
        assert_eq!(terms(&query), pairs(&[("error", 0), ("error", 5)]));
    }

    #[test]
    fn test_phrase_with_and_without_slop() {
        let phrase = |text: &str, slop| Query::Phrase {
            field: body(),
            text: text.into(),
            slop,
        };
        assert_eq!(
            terms(&phrase("error handling", 0)),
            pairs(&[("error", 0), ("handling", 1)])
        );
        assert!(terms(&phrase("error rust", 0)).is_empty());
        assert_eq!(
            terms(&phrase("error rust", 2)),
            pairs(&[("error", 0), ("rust", 3)])
        );
    }

    #[test]
    fn test_negated_clauses_do_not_highlight() {
        let query = Query::Bool(BoolQuery {
            must: vec![Query::Match {
                field: body(),
                text: "rust".into(),
            }],
            must_not: vec![Query::Match {
                field: body(),
                text: "error".into(),
            }],
            ..Default::default()
        });
        assert_eq!(terms(&query), pairs(&[("rust", 3)]));
    }

    #[test]
    fn test_patterns_and_fuzzy() {
        let wildcard = Query::Wildcard {
            field: body(),
            pattern: "EXPL*".into(),
        };
        assert_eq!(terms(&wildcard), pairs(&[("explicit", 7)]));

        let regex = Query::Regex {
            field: body(),
            pattern: "ru.t".into(),
        };
        assert_eq!(terms(&regex), pairs(&[("rust", 3)]));

        let fuzzy = Query::Fuzzy {
            field: body(),
            value: "handlng".into(),
            distance: None,
        };
        assert_eq!(terms(&fuzzy), pairs(&[("handling", 1)]));
    }

    #[test]
    fn test_escaped_wildcards_are_literal() {
        let fields = vec![Analyzer::Whitespace.analyze("code", "a*b a?c")];
        let code = field("code", FieldType::Keyword);
        let hits = |pattern: &str| {
            let query = Query::Wildcard {
                field: code.clone(),
                pattern: pattern.into(),
            };
            highlight(&query, &fields).unwrap().len()
        };

        assert_eq!(hits("a\\*b*"), 1);
        assert_eq!(hits("a\\?c*"), 1);
        assert_eq!(hits("a\\*c*"), 0);
        assert_eq!(hits("a\\?b*"), 0);
        assert_eq!(hits("a?b*"), 1);
    }

    #[test]
    fn test_typed_terms_and_ranges() {
        let term = Query::Term {
            field: field("status", FieldType::Keyword),
            value: TypedValue::Text("open".into()),
        };
        assert_eq!(terms(&term), pairs(&[("open", 0)]));

        let range = |lower, upper| Query::Range {
            field: field("views", FieldType::Long),
            lower,
            upper,
        };
        let hit = range(Bound::Included(TypedValue::Integer(42)), Bound::Unbounded);
        assert_eq!(terms(&hit), pairs(&[("42", 0)]));
        let miss = range(Bound::Excluded(TypedValue::Integer(42)), Bound::Unbounded);
        assert!(terms(&miss).is_empty());
    }

    #[test]
    fn test_results_are_sorted_and_unique() {
        let query = Query::Bool(BoolQuery {
            should: vec![
                Query::Exists {
                    field: field("status", FieldType::Keyword),
                },
                Query::Match {
                    field: body(),
                    text: "rust error".into(),
                },
                Query::Match {
                    field: body(),
                    text: "rust".into(),
                },
            ],
            ..Default::default()
        });
        let tokens = highlight(&query, &analyzed()).unwrap();
        let keys: Vec<_> = tokens
            .iter()
            .map(|t| (t.field_name.as_str(), t.position))
            .collect();
        assert_eq!(keys, vec![("body", 0), ("body", 3), ("body", 5), ("status", 0)]);
    }

    #[test]
    fn test_invalid_regex() {
        let query = Query::Regex {
            field: body(),
            pattern: "(".into(),
        };
        assert!(matches!(
            highlight(&query, &analyzed()),
            Err(AnalyzeError::InvalidPattern { .. })
        ));
    }
}
