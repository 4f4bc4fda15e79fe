//! Field mappings.
//!
//! A field mapping tells the rewriter how a queryable field is stored: its canonical path,
//! value type, analyzer, aliases and the nested object it lives in. Mappings come from
//! `[fields.NAME]` tables or from an Elasticsearch-style JSON mapping document.

use std::{collections::HashMap, fmt, fs, path::Path};

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ConfigError;

/// Analyzer names understood by the highlighter.
pub const ANALYZERS: &[&str] = &["standard", "simple", "whitespace", "keyword"];

/// The value type of a mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Analyzed full text.
    Text,
    /// Exact, unanalyzed string.
    Keyword,
    /// 64-bit integer.
    #[serde(alias = "integer", alias = "short", alias = "byte")]
    Long,
    /// Floating point number.
    #[serde(alias = "float", alias = "half_float", alias = "scaled_float")]
    Double,
    /// Date or timestamp.
    Date,
    /// `true` / `false`.
    Boolean,
}

impl FieldType {
    /// Maps an Elasticsearch mapping type name onto a field type.
    pub fn from_es(name: &str) -> Option<Self> {
        Some(match name {
            "text" | "string" => Self::Text,
            "keyword" => Self::Keyword,
            "long" | "integer" | "short" | "byte" => Self::Long,
            "double" | "float" | "half_float" | "scaled_float" => Self::Double,
            "date" => Self::Date,
            "boolean" => Self::Boolean,
            _ => return None,
        })
    }

    /// True for types whose values are strings (wildcard, fuzzy and regex apply).
    pub fn is_string(self) -> bool {
        matches!(self, Self::Text | Self::Keyword)
    }

    /// The analyzer in effect given an explicit one: that analyzer, else `standard` for
    /// text and `keyword` for everything else.
    pub fn analyzer_name(self, explicit: Option<&str>) -> &str {
        match (explicit, self) {
            (Some(analyzer), _) => analyzer,
            (None, Self::Text) => "standard",
            (None, _) => "keyword",
        }
    }

    /// True for types that support ordered range comparisons.
    pub fn is_ordered(self) -> bool {
        !matches!(self, Self::Boolean)
    }

    /// Lowercase name as written in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Keyword => "keyword",
            Self::Long => "long",
            Self::Double => "double",
            Self::Date => "date",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one queryable field is mapped in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    /// Name users write in queries.
    pub name: String,
    /// Canonical path of the field in the index.
    pub path: String,
    /// Value type.
    pub field_type: FieldType,
    /// Explicit analyzer, if any.
    pub analyzer: Option<String>,
    /// Path of the enclosing nested object, if the field lives in one.
    pub nested: Option<String>,
    /// Alternative names resolving to this field.
    pub aliases: Vec<String>,
}

impl FieldMapping {
    /// Creates a mapping whose path equals its name.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            field_type,
            analyzer: None,
            nested: None,
            aliases: Vec::new(),
        }
    }

    /// Sets the canonical path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the analyzer.
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    /// Places the field inside a nested object.
    #[must_use]
    pub fn with_nested(mut self, nested: impl Into<String>) -> Self {
        self.nested = Some(nested.into());
        self
    }

    /// Adds an alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// The analyzer in effect for this field.
    pub fn analyzer_name(&self) -> &str {
        self.field_type.analyzer_name(self.analyzer.as_deref())
    }
}

/// Resolves field names (and aliases) to their mappings.
pub trait FieldLookup {
    /// Returns the mapping for `name`, which may be a field name or an alias.
    fn lookup(&self, name: &str) -> Option<&FieldMapping>;
}

/// An immutable set of field mappings indexed by name and alias.
#[derive(Debug, Clone, Default)]
pub struct MappingSnapshot {
    /// Mappings in definition order.
    fields: Vec<FieldMapping>,
    /// Name or alias to position in `fields`.
    index: HashMap<String, usize>,
}

impl MappingSnapshot {
    /// Builds a snapshot. When two mappings share a name the first one wins; an alias never
    /// shadows a field name or an earlier alias.
    pub fn from_fields(fields: impl IntoIterator<Item = FieldMapping>) -> Self {
        let mut snapshot = Self::default();
        for field in fields {
            if snapshot.fields.iter().any(|f| f.name == field.name) {
                debug!("ignoring duplicate mapping for field '{}'", field.name);
                continue;
            }
            snapshot.fields.push(field);
        }

        for (position, field) in snapshot.fields.iter().enumerate() {
            snapshot.index.insert(field.name.clone(), position);
        }
        for (position, field) in snapshot.fields.iter().enumerate() {
            for alias in &field.aliases {
                snapshot.index.entry(alias.clone()).or_insert(position);
            }
        }

        snapshot
    }

    /// Parses an Elasticsearch-style JSON mapping document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let value: Value =
            serde_json::from_str(json).map_err(|source| ConfigError::ParseMapping {
                path: "<inline>".into(),
                source,
            })?;
        Ok(Self::from_fields(fields_from_json(&value)?))
    }

    /// Reads and parses an Elasticsearch-style JSON mapping file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::from_fields(load_mapping_file(path)?))
    }

    /// All mappings, in definition order.
    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    /// Number of mapped fields (aliases not counted).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if no fields are mapped.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FieldLookup for MappingSnapshot {
    fn lookup(&self, name: &str) -> Option<&FieldMapping> {
        self.index.get(name).map(|&position| &self.fields[position])
    }
}

/// Reads a JSON mapping file into field mappings.
pub fn load_mapping_file(path: &Path) -> Result<Vec<FieldMapping>, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value =
        serde_json::from_str(&contents).map_err(|source| ConfigError::ParseMapping {
            path: path.to_path_buf(),
            source,
        })?;
    fields_from_json(&value)
}

/// Extracts field mappings from a parsed mapping document.
///
/// Accepts `{"mappings":{"properties":…}}`, a single mapping type under `mappings`
/// (`{"mappings":{"doc":{"properties":…}}}`), or a bare `{"properties":…}`.
pub fn fields_from_json(document: &Value) -> Result<Vec<FieldMapping>, ConfigError> {
    let properties = root_properties(document).ok_or_else(|| ConfigError::InvalidMapping {
        reason: "no \"properties\" object found".into(),
    })?;

    let mut fields = Vec::new();
    let mut aliases = Vec::new();
    collect_properties(properties, "", None, &mut fields, &mut aliases);

    for (alias, target) in aliases {
        let Some(field) = fields.iter_mut().find(|f| f.path == target) else {
            return Err(ConfigError::InvalidMapping {
                reason: format!("alias '{alias}' points at unmapped field '{target}'"),
            });
        };
        field.aliases.push(alias);
    }

    debug!("loaded {} fields from JSON mapping", fields.len());
    Ok(fields)
}

/// Finds the top-level `properties` object of a mapping document.
fn root_properties(document: &Value) -> Option<&Map<String, Value>> {
    let mappings = document.get("mappings").unwrap_or(document);
    if let Some(properties) = mappings.get("properties").and_then(Value::as_object) {
        return Some(properties);
    }

    // Older documents wrap the properties in a single named mapping type.
    let types = mappings.as_object()?;
    if types.len() != 1 {
        return None;
    }
    types
        .values()
        .next()?
        .get("properties")
        .and_then(Value::as_object)
}

/// Walks a `properties` object, flattening object and nested properties into dotted paths.
fn collect_properties(
    properties: &Map<String, Value>,
    prefix: &str,
    nested: Option<&str>,
    fields: &mut Vec<FieldMapping>,
    aliases: &mut Vec<(String, String)>,
) {
    for (name, definition) in properties {
        let path = format!("{prefix}{name}");
        let kind = definition.get("type").and_then(Value::as_str);
        let children = definition.get("properties").and_then(Value::as_object);

        match (kind, children) {
            (Some("nested"), Some(children)) => {
                collect_properties(children, &format!("{path}."), Some(&path), fields, aliases);
            }
            (None | Some("object"), Some(children)) => {
                collect_properties(children, &format!("{path}."), nested, fields, aliases);
            }
            (Some("alias"), _) => {
                if let Some(target) = definition.get("path").and_then(Value::as_str) {
                    aliases.push((path, target.to_string()));
                }
            }
            (Some(kind), _) => {
                let Some(field_type) = FieldType::from_es(kind) else {
                    debug!("skipping field '{path}' with unsupported type '{kind}'");
                    continue;
                };
                let field = leaf_mapping(&path, field_type, definition, nested);
                let sub_fields = definition.get("fields").and_then(Value::as_object);
                fields.push(field);

                for (sub_name, sub_definition) in sub_fields.into_iter().flatten() {
                    let sub_path = format!("{path}.{sub_name}");
                    match sub_definition
                        .get("type")
                        .and_then(Value::as_str)
                        .and_then(FieldType::from_es)
                    {
                        Some(sub_type) => fields.push(leaf_mapping(
                            &sub_path,
                            sub_type,
                            sub_definition,
                            nested,
                        )),
                        None => debug!("skipping multi-field '{sub_path}'"),
                    }
                }
            }
            (None, None) => debug!("skipping untyped field '{path}'"),
        }
    }
}

/// Builds the mapping of a typed leaf property.
fn leaf_mapping(
    path: &str,
    field_type: FieldType,
    definition: &Value,
    nested: Option<&str>,
) -> FieldMapping {
    FieldMapping {
        name: path.to_string(),
        path: path.to_string(),
        field_type,
        analyzer: definition
            .get("analyzer")
            .and_then(Value::as_str)
            .map(String::from),
        nested: nested.map(String::from),
        aliases: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPPING: &str = r#"{
        "mappings": {
            "properties": {
                "title": {
                    "type": "text",
                    "analyzer": "standard",
                    "fields": { "raw": { "type": "keyword" } }
                },
                "heading": { "type": "alias", "path": "title" },
                "price": { "type": "double" },
                "views": { "type": "integer" },
                "location": { "type": "geo_point" },
                "author": {
                    "properties": {
                        "name": { "type": "keyword" }
                    }
                },
                "comments": {
                    "type": "nested",
                    "properties": {
                        "body": { "type": "text" },
                        "meta": { "properties": { "score": { "type": "long" } } }
                    }
                }
            }
        }
    }"#;

    #[test]
    fn parses_leaf_types() {
        let snapshot = MappingSnapshot::from_json_str(MAPPING).unwrap();
        assert_eq!(snapshot.lookup("price").unwrap().field_type, FieldType::Double);
        assert_eq!(snapshot.lookup("views").unwrap().field_type, FieldType::Long);
        assert!(snapshot.lookup("location").is_none());
    }

    #[test]
    fn multi_fields_become_dotted_fields() {
        let snapshot = MappingSnapshot::from_json_str(MAPPING).unwrap();
        let raw = snapshot.lookup("title.raw").unwrap();
        assert_eq!(raw.field_type, FieldType::Keyword);
        assert_eq!(raw.path, "title.raw");
    }

    #[test]
    fn aliases_resolve_to_target() {
        let snapshot = MappingSnapshot::from_json_str(MAPPING).unwrap();
        let title = snapshot.lookup("heading").unwrap();
        assert_eq!(title.name, "title");
        assert_eq!(title.aliases, vec!["heading"]);
    }

    #[test]
    fn object_properties_flatten_without_nesting() {
        let snapshot = MappingSnapshot::from_json_str(MAPPING).unwrap();
        let name = snapshot.lookup("author.name").unwrap();
        assert_eq!(name.nested, None);
    }

    #[test]
    fn nested_properties_carry_nested_path() {
        let snapshot = MappingSnapshot::from_json_str(MAPPING).unwrap();
        assert_eq!(
            snapshot.lookup("comments.body").unwrap().nested.as_deref(),
            Some("comments")
        );
        assert_eq!(
            snapshot.lookup("comments.meta.score").unwrap().nested.as_deref(),
            Some("comments")
        );
    }

    #[test]
    fn accepts_typed_and_bare_documents() {
        let typed = r#"{"mappings":{"doc":{"properties":{"a":{"type":"keyword"}}}}}"#;
        let bare = r#"{"properties":{"a":{"type":"keyword"}}}"#;
        assert_eq!(MappingSnapshot::from_json_str(typed).unwrap().len(), 1);
        assert_eq!(MappingSnapshot::from_json_str(bare).unwrap().len(), 1);
    }

    #[test]
    fn rejects_document_without_properties() {
        let err = MappingSnapshot::from_json_str(r#"{"settings":{}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMapping { .. }));
    }

    #[test]
    fn rejects_dangling_alias() {
        let json = r#"{"properties":{"a":{"type":"alias","path":"missing"}}}"#;
        let err = MappingSnapshot::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn first_definition_wins() {
        let snapshot = MappingSnapshot::from_fields([
            FieldMapping::new("a", FieldType::Keyword),
            FieldMapping::new("a", FieldType::Long),
        ]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.lookup("a").unwrap().field_type, FieldType::Keyword);
    }

    #[test]
    fn alias_never_shadows_field_name() {
        let snapshot = MappingSnapshot::from_fields([
            FieldMapping::new("a", FieldType::Keyword).with_alias("b"),
            FieldMapping::new("b", FieldType::Long),
        ]);
        assert_eq!(snapshot.lookup("b").unwrap().field_type, FieldType::Long);
    }

    #[test]
    fn default_analyzers() {
        assert_eq!(
            FieldMapping::new("t", FieldType::Text).analyzer_name(),
            "standard"
        );
        assert_eq!(
            FieldMapping::new("k", FieldType::Keyword).analyzer_name(),
            "keyword"
        );
        assert_eq!(
            FieldMapping::new("t", FieldType::Text)
                .with_analyzer("whitespace")
                .analyzer_name(),
            "whitespace"
        );
        assert_eq!(FieldType::Date.analyzer_name(None), "keyword");
        assert_eq!(FieldType::Long.analyzer_name(Some("simple")), "simple");
    }

    #[test]
    fn field_type_serde_aliases() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(rename = "type")]
            field_type: FieldType,
        }
        let holder: Holder = toml::from_str("type = \"integer\"").unwrap();
        assert_eq!(holder.field_type, FieldType::Long);
    }
}
