//! Semantic rewrite pass.
//!
//! Resolves every leaf of a parsed [`QueryExpr`] against the field mappings, converts values
//! to the field's type and normalizes the boolean structure into a [`Query`].

use std::ops::Bound;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use ftq_config::{FieldLookup, FieldType};
use ftq_query::{BoolOp, Leaf, LeafKind, QueryExpr, RangeBound};
use log::{debug, warn};

use crate::{BoolQuery, Query, ResolvedField, RewriteError, RewriteOptions, TypedValue};

/// Timestamp layouts accepted on date fields besides plain dates and RFC 3339.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Result of rewriting a negated operand.
enum Negation {
    /// The negation cancelled out (`NOT NOT x`).
    Positive(Query),
    /// Clauses that must not match.
    Excluded(Vec<Query>),
}

/// Rewrites parsed query expressions against a field lookup.
pub struct Rewriter<'a, M: FieldLookup + ?Sized> {
    /// Field mappings leaves resolve against.
    mappings: &'a M,
    /// Default field and filter behaviour.
    options: &'a RewriteOptions,
}

impl<'a, M: FieldLookup + ?Sized> Rewriter<'a, M> {
    /// Creates a rewriter.
    pub fn new(mappings: &'a M, options: &'a RewriteOptions) -> Self {
        Self { mappings, options }
    }

    /// Rewrites a parsed query. `None` (an empty query) becomes [`Query::MatchAll`].
    pub fn rewrite(&self, expr: Option<&QueryExpr>) -> Result<Query, RewriteError> {
        let Some(expr) = expr else {
            debug!("empty query rewritten to match_all");
            return Ok(Query::MatchAll);
        };

        let root = self.rewrite_expr(expr, None)?;
        if self.options.as_filter {
            return Ok(Query::Bool(BoolQuery {
                filter: vec![root],
                ..Default::default()
            }));
        }
        Ok(root)
    }

    /// Rewrites one expression; `scope` is the field of an enclosing `field:( … )` group.
    fn rewrite_expr(&self, expr: &QueryExpr, scope: Option<&str>) -> Result<Query, RewriteError> {
        match expr {
            QueryExpr::Leaf(leaf) => self.rewrite_leaf(leaf, scope),
            QueryExpr::Field { name, expr } => self.rewrite_expr(expr, Some(name)),
            QueryExpr::Boost { expr, factor } => {
                Ok(self.rewrite_expr(expr, scope)?.boosted(*factor))
            }
            QueryExpr::Bool { op, children } => match op {
                BoolOp::And => self.rewrite_and(children, scope),
                BoolOp::Or => self.rewrite_or(children, scope),
                BoolOp::Not => self.rewrite_not(children, scope),
            },
        }
    }

    /// AND: positive operands become `must`, negated operands become `must_not`.
    fn rewrite_and(&self, children: &[QueryExpr], scope: Option<&str>) -> Result<Query, RewriteError> {
        let mut clauses = BoolQuery::default();

        for child in children {
            if let QueryExpr::Bool {
                op: BoolOp::Not,
                children: negated,
            } = child
            {
                match self.negate(negated, scope)? {
                    Negation::Positive(query) => push_must(&mut clauses, query),
                    Negation::Excluded(queries) => clauses.must_not.extend(queries),
                }
                continue;
            }
            push_must(&mut clauses, self.rewrite_expr(child, scope)?);
        }

        Ok(collapse(clauses))
    }

    /// OR: every operand becomes a `should` clause.
    fn rewrite_or(&self, children: &[QueryExpr], scope: Option<&str>) -> Result<Query, RewriteError> {
        let mut should = Vec::with_capacity(children.len());

        for child in children {
            match self.rewrite_expr(child, scope)? {
                Query::Bool(inner)
                    if inner.must.is_empty()
                        && inner.filter.is_empty()
                        && inner.must_not.is_empty() =>
                {
                    should.extend(inner.should);
                }
                other => should.push(other),
            }
        }

        Ok(collapse(BoolQuery {
            should,
            ..Default::default()
        }))
    }

    /// A NOT outside an AND becomes a bool with only `must_not` clauses.
    fn rewrite_not(&self, children: &[QueryExpr], scope: Option<&str>) -> Result<Query, RewriteError> {
        Ok(match self.negate(children, scope)? {
            Negation::Positive(query) => query,
            Negation::Excluded(must_not) => Query::Bool(BoolQuery {
                must_not,
                ..Default::default()
            }),
        })
    }

    /// Rewrites the operands of a NOT group.
    fn negate(&self, children: &[QueryExpr], scope: Option<&str>) -> Result<Negation, RewriteError> {
        match children {
            [only] => self.negate_expr(only, scope),
            _ => Ok(Negation::Excluded(self.rewrite_all(children, scope)?)),
        }
    }

    /// Rewrites a single negated expression, cancelling double negation and spreading a
    /// negated OR into separate `must_not` clauses.
    fn negate_expr(&self, expr: &QueryExpr, scope: Option<&str>) -> Result<Negation, RewriteError> {
        match expr {
            QueryExpr::Bool {
                op: BoolOp::Not,
                children,
            } => {
                debug!("double negation cancelled");
                let query = match children.as_slice() {
                    [only] => self.rewrite_expr(only, scope)?,
                    _ => self.rewrite_or(children, scope)?,
                };
                Ok(Negation::Positive(query))
            }
            QueryExpr::Bool {
                op: BoolOp::Or,
                children,
            } => Ok(Negation::Excluded(self.rewrite_all(children, scope)?)),
            QueryExpr::Field { name, expr } => self.negate_expr(expr, Some(name)),
            other => Ok(Negation::Excluded(vec![self.rewrite_expr(other, scope)?])),
        }
    }

    /// Rewrites each expression in order.
    fn rewrite_all(&self, exprs: &[QueryExpr], scope: Option<&str>) -> Result<Vec<Query>, RewriteError> {
        exprs.iter().map(|e| self.rewrite_expr(e, scope)).collect()
    }

    /// Resolves a leaf's field and converts it into a typed query node.
    fn rewrite_leaf(&self, leaf: &Leaf, scope: Option<&str>) -> Result<Query, RewriteError> {
        let name = leaf.field.as_deref().or(scope);
        if name.is_none() && matches!(&leaf.kind, LeafKind::Wildcard(p) if is_match_all(p)) {
            return Ok(Query::MatchAll);
        }

        let field = self.resolve(name, &leaf.kind)?;
        let nested = field.nested.clone();
        let query = leaf_query(field, &leaf.kind)?;

        Ok(match nested {
            Some(path) => Query::Nested {
                path,
                query: Box::new(query),
            },
            None => query,
        })
    }

    /// Looks up the field a leaf applies to, falling back to the default field.
    fn resolve(&self, name: Option<&str>, kind: &LeafKind) -> Result<ResolvedField, RewriteError> {
        let target = match name {
            Some(name) => {
                if let Some(mapping) = self.mappings.lookup(name) {
                    debug!("resolved field '{name}' to '{}'", mapping.path);
                    return Ok(ResolvedField::from(mapping));
                }
                let Some(default) = self.options.default_field.as_deref() else {
                    return Err(RewriteError::UnknownField {
                        field_name: name.to_string(),
                    });
                };
                warn!("unknown field '{name}', using default field '{default}'");
                default
            }
            None => self
                .options
                .default_field
                .as_deref()
                .ok_or_else(|| RewriteError::NoDefaultField {
                    value: literal(kind),
                })?,
        };

        self.mappings
            .lookup(target)
            .map(ResolvedField::from)
            .ok_or_else(|| RewriteError::UnknownField {
                field_name: target.to_string(),
            })
    }
}

/// Adds a clause to an AND, merging in bools that only carry `must`/`must_not` clauses.
fn push_must(clauses: &mut BoolQuery, query: Query) {
    match query {
        Query::Bool(inner) if inner.filter.is_empty() && inner.should.is_empty() => {
            clauses.must.extend(inner.must);
            clauses.must_not.extend(inner.must_not);
        }
        other => clauses.must.push(other),
    }
}

/// Unwraps a bool holding a single positive clause.
fn collapse(mut clauses: BoolQuery) -> Query {
    let positive = clauses.must.len() + clauses.should.len();
    if positive == 1 && clauses.filter.is_empty() && clauses.must_not.is_empty() {
        if let Some(only) = clauses.must.pop().or_else(|| clauses.should.pop()) {
            return only;
        }
    }
    Query::Bool(clauses)
}

/// Converts a leaf literal into a query on a resolved field.
fn leaf_query(field: ResolvedField, kind: &LeafKind) -> Result<Query, RewriteError> {
    match kind {
        LeafKind::Term(value) => term_query(field, value),
        LeafKind::Phrase { text, slop } if field.field_type == FieldType::Text => {
            Ok(Query::Phrase {
                field,
                text: text.clone(),
                slop: *slop,
            })
        }
        // Unanalyzed fields store the whole value as one term.
        LeafKind::Phrase { text, .. } => term_query(field, text),
        LeafKind::Range { lower, upper } => range_query(field, lower, upper),
        LeafKind::Wildcard(pattern) if is_match_all(pattern) => {
            debug!("wildcard '{pattern}' on '{}' rewritten to exists", field.name);
            Ok(Query::Exists { field })
        }
        LeafKind::Wildcard(pattern) => {
            require_string(&field, kind)?;
            Ok(Query::Wildcard {
                field,
                pattern: pattern.clone(),
            })
        }
        LeafKind::Fuzzy { value, distance } => {
            require_string(&field, kind)?;
            Ok(Query::Fuzzy {
                field,
                value: value.clone(),
                distance: *distance,
            })
        }
        LeafKind::Regex(pattern) => {
            require_string(&field, kind)?;
            Ok(Query::Regex {
                field,
                pattern: pattern.clone(),
            })
        }
    }
}

/// A match on analyzed fields, an exact typed term everywhere else.
fn term_query(field: ResolvedField, value: &str) -> Result<Query, RewriteError> {
    if field.field_type == FieldType::Text {
        return Ok(Query::Match {
            field,
            text: value.to_string(),
        });
    }

    let typed = typed_value(field.field_type, value).ok_or_else(|| RewriteError::TermType {
        field: field.name.clone(),
        value: value.to_string(),
        expected: expected(field.field_type).to_string(),
    })?;
    Ok(Query::Term {
        field,
        value: typed,
    })
}

/// Builds a range, or an exists query when both ends are open.
fn range_query(
    field: ResolvedField,
    lower: &RangeBound,
    upper: &RangeBound,
) -> Result<Query, RewriteError> {
    if !field.field_type.is_ordered() {
        let bound = lower.value().or_else(|| upper.value()).unwrap_or("*");
        return Err(RewriteError::RangeType {
            field: field.name.clone(),
            bound: bound.to_string(),
            expected: format!("rangeable ({} fields have no order)", field.field_type),
        });
    }

    if matches!((lower, upper), (RangeBound::Unbounded, RangeBound::Unbounded)) {
        debug!("open range on '{}' rewritten to exists", field.name);
        return Ok(Query::Exists { field });
    }

    let lower = range_bound(&field, lower)?;
    let upper = range_bound(&field, upper)?;
    Ok(Query::Range {
        field,
        lower,
        upper,
    })
}

/// Converts one end of a range to the field's type.
fn range_bound(field: &ResolvedField, bound: &RangeBound) -> Result<Bound<TypedValue>, RewriteError> {
    let convert = |raw: &str| {
        typed_value(field.field_type, raw).ok_or_else(|| RewriteError::RangeType {
            field: field.name.clone(),
            bound: raw.to_string(),
            expected: expected(field.field_type).to_string(),
        })
    };

    Ok(match bound {
        RangeBound::Unbounded => Bound::Unbounded,
        RangeBound::Inclusive(value) => Bound::Included(convert(value)?),
        RangeBound::Exclusive(value) => Bound::Excluded(convert(value)?),
    })
}

/// Parses a literal as a value of `field_type`.
fn typed_value(field_type: FieldType, raw: &str) -> Option<TypedValue> {
    match field_type {
        FieldType::Text | FieldType::Keyword => Some(TypedValue::Text(raw.to_string())),
        FieldType::Long => raw.parse().ok().map(TypedValue::Integer),
        FieldType::Double => raw
            .parse()
            .ok()
            .filter(|n: &f64| n.is_finite())
            .map(TypedValue::Float),
        FieldType::Date => is_date(raw).then(|| TypedValue::Text(raw.to_string())),
        FieldType::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" => Some(TypedValue::Boolean(true)),
            "false" => Some(TypedValue::Boolean(false)),
            _ => None,
        },
    }
}

/// Describes the values a field type accepts.
fn expected(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Text | FieldType::Keyword => "a string",
        FieldType::Long => "an integer",
        FieldType::Double => "a number",
        FieldType::Date => "a date (YYYY-MM-DD, RFC 3339 or date math from 'now')",
        FieldType::Boolean => "true or false",
    }
}

/// True for calendar dates, timestamps and `now`-relative date math.
fn is_date(raw: &str) -> bool {
    if raw
        .strip_prefix("now")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['+', '-', '/']))
    {
        return true;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(raw).is_ok()
        || DATETIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(raw, format).is_ok())
}

/// Patterns made only of `*` match every value.
fn is_match_all(pattern: &str) -> bool {
    !pattern.is_empty() && pattern.chars().all(|c| c == '*')
}

/// Rejects pattern leaves on fields that do not hold strings.
fn require_string(field: &ResolvedField, kind: &LeafKind) -> Result<(), RewriteError> {
    if field.field_type.is_string() {
        return Ok(());
    }
    Err(RewriteError::IncompatibleLeaf {
        field: field.name.clone(),
        kind: kind.name().to_string(),
        field_type: field.field_type,
    })
}

/// Query-string form of an unscoped leaf, for diagnostics.
fn literal(kind: &LeafKind) -> String {
    QueryExpr::leaf(None, kind.clone()).to_query_string()
}

#[cfg(test)]
mod tests {
    use ftq_config::{FieldMapping, MappingSnapshot};
    use ftq_query::parse;

    use super::*;

    fn mappings() -> MappingSnapshot {
        MappingSnapshot::from_fields([
            FieldMapping::new("title", FieldType::Text).with_alias("heading"),
            FieldMapping::new("body", FieldType::Text),
            FieldMapping::new("status", FieldType::Keyword),
            FieldMapping::new("views", FieldType::Long).with_path("stats.views"),
            FieldMapping::new("price", FieldType::Double),
            FieldMapping::new("created", FieldType::Date),
            FieldMapping::new("published", FieldType::Boolean),
            FieldMapping::new("comments.body", FieldType::Text).with_nested("comments"),
        ])
    }

    fn options(default_field: Option<&str>) -> RewriteOptions {
        RewriteOptions {
            default_field: default_field.map(String::from),
            as_filter: false,
        }
    }

    fn rewrite_with(query: &str, options: &RewriteOptions) -> Result<Query, RewriteError> {
        let mappings = mappings();
        let expr = parse(query).unwrap();
        Rewriter::new(&mappings, options).rewrite(expr.as_ref())
    }

    fn rewrite(query: &str) -> Query {
        rewrite_with(query, &options(Some("body"))).unwrap()
    }

    fn field(name: &str) -> ResolvedField {
        ResolvedField::from(mappings().lookup(name).unwrap())
    }

    fn matches(name: &str, text: &str) -> Query {
        Query::Match {
            field: field(name),
            text: text.into(),
        }
    }

    #[test]
    fn test_empty_query_matches_all() {
        assert_eq!(rewrite(""), Query::MatchAll);
        assert_eq!(rewrite("   "), Query::MatchAll);
    }

    #[test]
    fn test_unscoped_term_uses_default_field() {
        assert_eq!(rewrite("rust"), matches("body", "rust"));
    }

    #[test]
    fn test_alias_resolves_to_field() {
        assert_eq!(rewrite("heading:rust"), matches("title", "rust"));
    }

    #[test]
    fn test_keyword_term_is_exact() {
        assert_eq!(
            rewrite("status:open"),
            Query::Term {
                field: field("status"),
                value: TypedValue::Text("open".into())
            }
        );
    }

    #[test]
    fn test_typed_terms() {
        assert_eq!(
            rewrite("views:42"),
            Query::Term {
                field: field("views"),
                value: TypedValue::Integer(42)
            }
        );
        assert_eq!(
            rewrite("price:9.5"),
            Query::Term {
                field: field("price"),
                value: TypedValue::Float(9.5)
            }
        );
        assert_eq!(
            rewrite("published:TRUE"),
            Query::Term {
                field: field("published"),
                value: TypedValue::Boolean(true)
            }
        );
    }

    #[test]
    fn test_term_type_error() {
        let err = rewrite_with("views:many", &options(None)).unwrap_err();
        assert_eq!(
            err,
            RewriteError::TermType {
                field: "views".into(),
                value: "many".into(),
                expected: "an integer".into(),
            }
        );
    }

    #[test]
    fn test_phrase_on_date_field_is_a_term() {
        assert_eq!(
            rewrite("created:\"2020-01-01 10:30:00\""),
            Query::Term {
                field: field("created"),
                value: TypedValue::Text("2020-01-01 10:30:00".into())
            }
        );
    }

    #[test]
    fn test_and_with_negation() {
        let expected = Query::Bool(BoolQuery {
            must: vec![matches("body", "a"), matches("body", "c")],
            must_not: vec![matches("body", "b")],
            ..Default::default()
        });
        assert_eq!(rewrite("a -b c"), expected);
        assert_eq!(rewrite("a AND NOT b AND c"), expected);
    }

    #[test]
    fn test_not_or_spreads_into_must_not() {
        assert_eq!(
            rewrite("NOT (a OR b)"),
            Query::Bool(BoolQuery {
                must_not: vec![matches("body", "a"), matches("body", "b")],
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_double_negation_cancels() {
        assert_eq!(rewrite("NOT NOT a"), matches("body", "a"));
        assert_eq!(rewrite("--a"), matches("body", "a"));
        assert_eq!(
            rewrite("x NOT NOT a"),
            Query::Bool(BoolQuery {
                must: vec![matches("body", "x"), matches("body", "a")],
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_or_flattens_field_groups() {
        assert_eq!(
            rewrite("a OR title:(b OR c)"),
            Query::Bool(BoolQuery {
                should: vec![
                    matches("body", "a"),
                    matches("title", "b"),
                    matches("title", "c")
                ],
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_and_flattens_field_groups() {
        assert_eq!(
            rewrite("a title:(b -c)"),
            Query::Bool(BoolQuery {
                must: vec![matches("body", "a"), matches("title", "b")],
                must_not: vec![matches("title", "c")],
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_boost_normalization() {
        assert_eq!(rewrite("title:rust^1.0"), rewrite("title:rust"));
        assert_eq!(
            rewrite("(title:rust^2)^3"),
            Query::Boost {
                query: Box::new(matches("title", "rust")),
                factor: 6.0
            }
        );
    }

    #[test]
    fn test_wildcards() {
        assert_eq!(rewrite("*"), Query::MatchAll);
        assert_eq!(rewrite("title:*"), Query::Exists { field: field("title") });
        assert_eq!(rewrite("views:[* TO *]"), Query::Exists { field: field("views") });
        assert_eq!(
            rewrite("status:op*"),
            Query::Wildcard {
                field: field("status"),
                pattern: "op*".into()
            }
        );
    }

    #[test]
    fn test_incompatible_leaf() {
        let err = rewrite_with("views:4*", &options(None)).unwrap_err();
        assert_eq!(
            err,
            RewriteError::IncompatibleLeaf {
                field: "views".into(),
                kind: "wildcard".into(),
                field_type: FieldType::Long,
            }
        );
        assert!(rewrite_with("price:10~1", &options(None)).is_err());
        assert!(rewrite_with("published:/tr.e/", &options(None)).is_err());
    }

    #[test]
    fn test_ranges() {
        assert_eq!(
            rewrite("views:[10 TO 20}"),
            Query::Range {
                field: field("views"),
                lower: Bound::Included(TypedValue::Integer(10)),
                upper: Bound::Excluded(TypedValue::Integer(20)),
            }
        );
        assert_eq!(
            rewrite("price:>=1.5"),
            Query::Range {
                field: field("price"),
                lower: Bound::Included(TypedValue::Float(1.5)),
                upper: Bound::Unbounded,
            }
        );
        assert_eq!(
            rewrite("created:[2020-01-01 TO now]"),
            Query::Range {
                field: field("created"),
                lower: Bound::Included(TypedValue::Text("2020-01-01".into())),
                upper: Bound::Included(TypedValue::Text("now".into())),
            }
        );
    }

    #[test]
    fn test_range_type_errors() {
        let err = rewrite_with("views:[ten TO 20]", &options(None)).unwrap_err();
        assert!(matches!(err, RewriteError::RangeType { ref bound, .. } if bound == "ten"));

        let err = rewrite_with("created:<yesterday", &options(None)).unwrap_err();
        assert!(matches!(err, RewriteError::RangeType { ref field, .. } if field == "created"));

        let err = rewrite_with("published:[false TO true]", &options(None)).unwrap_err();
        assert!(matches!(err, RewriteError::RangeType { ref bound, .. } if bound == "false"));
    }

    #[test]
    fn test_nested_fields_are_wrapped() {
        assert_eq!(
            rewrite("comments.body:great"),
            Query::Nested {
                path: "comments".into(),
                query: Box::new(matches("comments.body", "great")),
            }
        );
    }

    #[test]
    fn test_as_filter_wraps_root() {
        let options = RewriteOptions {
            default_field: Some("body".into()),
            as_filter: true,
        };
        assert_eq!(
            rewrite_with("rust", &options).unwrap(),
            Query::Bool(BoolQuery {
                filter: vec![matches("body", "rust")],
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_unknown_field_without_default() {
        let err = rewrite_with("unknownfield:x", &options(None)).unwrap_err();
        assert_eq!(
            err,
            RewriteError::UnknownField {
                field_name: "unknownfield".into()
            }
        );
    }

    #[test]
    fn test_unknown_field_falls_back_to_default() {
        assert_eq!(rewrite("unknownfield:x"), matches("body", "x"));
    }

    #[test]
    fn test_unscoped_without_default() {
        let err = rewrite_with("\"some words\"", &options(None)).unwrap_err();
        assert_eq!(
            err,
            RewriteError::NoDefaultField {
                value: "\"some words\"".into()
            }
        );
    }

    #[test]
    fn test_unmapped_default_field() {
        let err = rewrite_with("rust", &options(Some("missing"))).unwrap_err();
        assert_eq!(
            err,
            RewriteError::UnknownField {
                field_name: "missing".into()
            }
        );
    }

    #[test]
    fn test_rewrite_is_deterministic() {
        let query = "title:(rust OR golang)^2 -status:closed views:>10 \"error handling\"~2";
        assert_eq!(rewrite(query), rewrite(query));
    }
}
