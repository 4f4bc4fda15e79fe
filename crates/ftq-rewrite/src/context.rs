//! Per-query rewrite context.
//!
//! A [`QueryRewriter`] is built for one query string: it parses the query up front, then
//! rewrites, serializes or dumps it against the field mappings it borrows.

use ftq_config::FieldLookup;
use ftq_query::{QueryError, QueryExpr, parse};
use log::debug;
use serde_json::Value;

use crate::{Error, Query, RewriteError, Rewriter, dump, to_json};

/// Options that shape how a query is rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Field that unscoped leaves (and leaves on unknown fields) resolve to.
    pub default_field: Option<String>,
    /// Wrap the whole query as a single non-scoring filter.
    pub as_filter: bool,
}

impl RewriteOptions {
    /// Sets the default field.
    #[must_use]
    pub fn with_default_field(mut self, field: impl Into<String>) -> Self {
        self.default_field = Some(field.into());
        self
    }

    /// Sets whether the query is wrapped as a filter.
    #[must_use]
    pub fn with_as_filter(mut self, as_filter: bool) -> Self {
        self.as_filter = as_filter;
        self
    }
}

/// A parsed query bound to an index and its field mappings.
pub struct QueryRewriter<'m, M: FieldLookup + ?Sized> {
    /// Index the query targets.
    index: String,
    /// Field mappings of the index.
    mappings: &'m M,
    /// Rewrite options.
    options: RewriteOptions,
    /// The query as written.
    query: String,
    /// Parsed query; `None` when the query is empty.
    parsed: Option<QueryExpr>,
}

impl<'m, M: FieldLookup + ?Sized> QueryRewriter<'m, M> {
    /// Parses `query` and binds it to an index.
    pub fn new(
        index: impl Into<String>,
        mappings: &'m M,
        options: RewriteOptions,
        query: &str,
    ) -> Result<Self, QueryError> {
        let index = index.into();
        debug!("parsing query for index '{index}': {query}");
        let parsed = parse(query)?;
        Ok(Self {
            index,
            mappings,
            options,
            query: query.to_string(),
            parsed,
        })
    }

    /// Index identifier.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// The query string as given.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Rewrite options in effect.
    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// The parsed, not yet rewritten, query.
    pub fn parsed(&self) -> Option<&QueryExpr> {
        self.parsed.as_ref()
    }

    /// Resolves the parsed query against the mappings.
    pub fn rewrite(&self) -> Result<Query, RewriteError> {
        Rewriter::new(self.mappings, &self.options).rewrite(self.parsed.as_ref())
    }

    /// Rewrites and serializes the query into its wire document.
    pub fn to_json(&self) -> Result<Value, Error> {
        Ok(to_json(&self.rewrite()?)?)
    }

    /// Rewrites the query and renders it as an indented tree.
    pub fn dump(&self) -> Result<String, RewriteError> {
        Ok(dump(&self.rewrite()?))
    }
}

#[cfg(test)]
mod tests {
    use ftq_config::{FieldMapping, FieldType, MappingSnapshot};
    use serde_json::json;

    use super::*;

    fn mappings() -> MappingSnapshot {
        MappingSnapshot::from_fields([
            FieldMapping::new("title", FieldType::Text),
            FieldMapping::new("body", FieldType::Text),
        ])
    }

    #[test]
    fn test_rewriter_keeps_context() {
        let mappings = mappings();
        let options = RewriteOptions::default().with_default_field("body");
        let rewriter = QueryRewriter::new("docs", &mappings, options, "title:rust").unwrap();

        assert_eq!(rewriter.index(), "docs");
        assert_eq!(rewriter.query(), "title:rust");
        assert_eq!(rewriter.options().default_field.as_deref(), Some("body"));
        assert!(rewriter.parsed().is_some());
    }

    #[test]
    fn test_to_json() {
        let mappings = mappings();
        let rewriter =
            QueryRewriter::new("docs", &mappings, RewriteOptions::default(), "title:rust").unwrap();
        assert_eq!(
            rewriter.to_json().unwrap(),
            json!({"match": {"title": {"query": "rust"}}})
        );
    }

    #[test]
    fn test_parse_error_surfaces_on_construction() {
        let mappings = mappings();
        let result = QueryRewriter::new("docs", &mappings, RewriteOptions::default(), "(a AND b");
        let err = result.err().unwrap();
        assert_eq!(err.as_parse_error().unwrap().offset, 8);
    }

    #[test]
    fn test_rewrite_error_through_to_json() {
        let mappings = mappings();
        let rewriter =
            QueryRewriter::new("docs", &mappings, RewriteOptions::default(), "rust").unwrap();
        assert!(matches!(
            rewriter.to_json(),
            Err(Error::Rewrite(RewriteError::NoDefaultField { .. }))
        ));
    }

    #[test]
    fn test_dyn_lookup() {
        let mappings = mappings();
        let lookup: &dyn FieldLookup = &mappings;
        let rewriter =
            QueryRewriter::new("docs", lookup, RewriteOptions::default(), "title:\"a b\"").unwrap();
        assert_eq!(rewriter.dump().unwrap(), "Phrase(title, \"a b\")");
    }
}
