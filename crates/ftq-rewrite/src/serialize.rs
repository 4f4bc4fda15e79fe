//! Wire document serializer.
//!
//! Renders a [`Query`] into the structured query document consumed by an
//! Elasticsearch-style search engine. Key order is fixed per node kind.

use std::ops::Bound;

use serde_json::{Map, Number, Value};

use crate::{Query, SerializationError, TypedValue};

/// Scoring-control flags engines add to bool queries.
const SCORING_FLAGS: &[&str] = &["disable_coord", "adjust_pure_negative"];

/// Serializes a rewritten query into its wire document.
pub fn to_json(query: &Query) -> Result<Value, SerializationError> {
    serialize(query, None)
}

/// Serializes one node; `boost` is appended to the node's parameter object.
fn serialize(query: &Query, boost: Option<f32>) -> Result<Value, SerializationError> {
    let node = query.kind();
    let mut params = Map::new();

    let path = match query {
        Query::MatchAll => None,
        Query::Term { field, value } => {
            params.insert("value".into(), typed(value, node)?);
            Some(&field.path)
        }
        Query::Match { field, text } => {
            params.insert("query".into(), Value::from(text.as_str()));
            Some(&field.path)
        }
        Query::Phrase { field, text, slop } => {
            params.insert("query".into(), Value::from(text.as_str()));
            if *slop > 0 {
                params.insert("slop".into(), Value::from(*slop));
            }
            Some(&field.path)
        }
        Query::Range {
            field,
            lower,
            upper,
        } => {
            insert_bound(&mut params, lower, "gte", "gt", node)?;
            insert_bound(&mut params, upper, "lte", "lt", node)?;
            Some(&field.path)
        }
        Query::Wildcard { field, pattern } | Query::Regex { field, pattern } => {
            params.insert("value".into(), Value::from(pattern.as_str()));
            Some(&field.path)
        }
        Query::Fuzzy {
            field,
            value,
            distance,
        } => {
            params.insert("value".into(), Value::from(value.as_str()));
            if let Some(distance) = distance {
                params.insert("fuzziness".into(), Value::from(*distance));
            }
            Some(&field.path)
        }
        Query::Exists { field } => {
            params.insert("field".into(), Value::from(field.path.as_str()));
            None
        }
        Query::Nested { path, query } => {
            params.insert("path".into(), Value::from(path.as_str()));
            params.insert("query".into(), to_json(query)?);
            None
        }
        Query::Bool(clauses) => {
            for (label, queries) in clauses.clauses() {
                if queries.is_empty() {
                    continue;
                }
                let rendered = queries.iter().map(to_json).collect::<Result<Vec<_>, _>>()?;
                params.insert(label.into(), Value::Array(rendered));
            }
            None
        }
        Query::Boost { query, factor } => {
            let factor = boost.map_or(*factor, |outer| outer * factor);
            return serialize(query, Some(factor));
        }
    };

    if let Some(factor) = boost
        && factor != 1.0
    {
        params.insert("boost".into(), float(widen(factor), node, "boost")?);
    }

    let body = match path {
        Some(path) => Map::from_iter([(path.clone(), Value::Object(params))]),
        None => params,
    };
    Ok(Value::Object(Map::from_iter([(
        node.to_string(),
        Value::Object(body),
    )])))
}

/// Writes one end of a range under its inclusive or exclusive key.
fn insert_bound(
    params: &mut Map<String, Value>,
    bound: &Bound<TypedValue>,
    inclusive: &str,
    exclusive: &str,
    node: &str,
) -> Result<(), SerializationError> {
    match bound {
        Bound::Included(value) => {
            params.insert(inclusive.into(), typed(value, node)?);
        }
        Bound::Excluded(value) => {
            params.insert(exclusive.into(), typed(value, node)?);
        }
        Bound::Unbounded => {}
    }
    Ok(())
}

/// Converts a typed value into JSON.
fn typed(value: &TypedValue, node: &str) -> Result<Value, SerializationError> {
    Ok(match value {
        TypedValue::Text(text) => Value::from(text.as_str()),
        TypedValue::Integer(n) => Value::from(*n),
        TypedValue::Float(n) => float(*n, node, "value")?,
        TypedValue::Boolean(b) => Value::from(*b),
    })
}

/// Converts a float, rejecting NaN and infinities.
fn float(n: f64, node: &str, what: &str) -> Result<Value, SerializationError> {
    Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| SerializationError::new(node, format!("{what} {n} is not a finite number")))
}

/// Widens a boost through its shortest decimal form so `1.2` stays `1.2`.
fn widen(factor: f32) -> f64 {
    factor
        .to_string()
        .parse()
        .unwrap_or_else(|_| f64::from(factor))
}

/// Strips scoring-control flags and boosts of exactly 1.0 from a wire document.
///
/// Documents produced by [`to_json`] never carry these; engines echoing a query back often
/// do, and normalizing makes the two comparable.
pub fn normalize(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, v| {
                !(SCORING_FLAGS.contains(&key.as_str()) || (key == "boost" && v.as_f64() == Some(1.0)))
            });
            map.values_mut().for_each(normalize);
        }
        Value::Array(items) => items.iter_mut().for_each(normalize),
        _ => {}
    }
}
