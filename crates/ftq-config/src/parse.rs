//! Configuration file parsing.
//!
//! Parses individual `.ftq.toml` files into intermediate `RawConfig` structures
//! that preserve the optional nature of all fields before merging.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;
use serde_with::{OneOrMany, serde_as};
#[cfg(test)]
use toml::de::Error as TomlError;

use crate::{ConfigError, FieldType};

/// Raw configuration as parsed directly from a TOML file.
///
/// All fields are optional to support partial configs that will be merged.
/// This mirrors the TOML schema exactly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    /// When true, stop discovery here - ignore parent and global configs.
    pub root: Option<bool>,
    /// Index settings section.
    pub index: Option<RawIndex>,
    /// Field definitions: name -> field config.
    pub fields: Option<BTreeMap<String, RawField>>,
}

/// Raw `[index]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawIndex {
    /// Index identifier.
    pub name: Option<String>,
    /// Field used for unscoped query terms.
    pub default_field: Option<String>,
    /// Wrap every query as a base filter.
    pub as_filter: Option<bool>,
    /// Path to an Elasticsearch-style JSON mapping, relative to the config file.
    pub mapping: Option<String>,
}

/// Raw `[fields.NAME]` table.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawField {
    /// Value type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Analyzer name.
    pub analyzer: Option<String>,
    /// Alternative names. Accepts either a single string or an array of strings.
    #[serde_as(as = "OneOrMany<_>")]
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Enclosing nested object path.
    pub nested: Option<String>,
    /// Canonical path in the index (defaults to the field name).
    pub path: Option<String>,
}

/// Parses a configuration file from disk.
///
/// Returns a `RawConfig` with all fields as optionals, ready for merging.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses configuration from a TOML string without path context.
///
/// Useful for validating template content (tests only).
#[cfg(test)]
pub fn parse_config(contents: &str) -> Result<RawConfig, TomlError> {
    toml::from_str(contents)
}

/// Checks if a config file has `root = true` set.
///
/// This is used during discovery to stop traversal at root configs.
/// Returns false if the file cannot be read or parsed.
pub fn is_root_config(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(config) = toml::from_str::<RawConfig>(&contents) else {
        return false;
    };
    config.root == Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config_str("", Path::new("test.toml")).unwrap();
        assert!(config.root.is_none());
        assert!(config.index.is_none());
        assert!(config.fields.is_none());
    }

    #[test]
    fn test_parse_index_section() {
        let toml = r#"
[index]
name = "db.schema.table.index"
default_field = "body"
as_filter = true
mapping = "./mapping.json"
"#;
        let config = parse_config_str(toml, Path::new("test.toml")).unwrap();
        let index = config.index.unwrap();
        assert_eq!(index.name.as_deref(), Some("db.schema.table.index"));
        assert_eq!(index.default_field.as_deref(), Some("body"));
        assert_eq!(index.as_filter, Some(true));
        assert_eq!(index.mapping.as_deref(), Some("./mapping.json"));
    }

    #[test]
    fn test_parse_partial_index() {
        let config =
            parse_config_str("[index]\ndefault_field = \"body\"\n", Path::new("t")).unwrap();
        let index = config.index.unwrap();
        assert!(index.name.is_none());
        assert!(index.as_filter.is_none());
    }

    #[test]
    fn test_parse_minimal_field() {
        let toml = r#"
[fields.title]
type = "text"
"#;
        let config = parse_config_str(toml, Path::new("test.toml")).unwrap();
        let fields = config.fields.unwrap();
        let title = fields.get("title").unwrap();
        assert_eq!(title.field_type, FieldType::Text);
        assert!(title.analyzer.is_none());
        assert!(title.aliases.is_empty());
        assert!(title.nested.is_none());
        assert!(title.path.is_none());
    }

    #[test]
    fn test_parse_field_single_alias() {
        let toml = r#"
[fields.title]
type = "text"
aliases = "heading"
"#;
        let config = parse_config_str(toml, Path::new("test.toml")).unwrap();
        let fields = config.fields.unwrap();
        assert_eq!(fields["title"].aliases, vec!["heading"]);
    }

    #[test]
    fn test_parse_field_alias_list_and_nested() {
        let toml = r#"
[fields."comments.body"]
type = "text"
analyzer = "whitespace"
aliases = ["comment", "reply"]
nested = "comments"
path = "comments.body"
"#;
        let config = parse_config_str(toml, Path::new("test.toml")).unwrap();
        let fields = config.fields.unwrap();
        let body = &fields["comments.body"];
        assert_eq!(body.analyzer.as_deref(), Some("whitespace"));
        assert_eq!(body.aliases, vec!["comment", "reply"]);
        assert_eq!(body.nested.as_deref(), Some("comments"));
    }

    #[test]
    fn test_parse_field_without_type_fails() {
        let toml = "[fields.title]\nanalyzer = \"standard\"\n";
        let result = parse_config_str(toml, Path::new("test.toml"));
        assert!(matches!(result, Err(ConfigError::ParseToml { .. })));
    }

    #[test]
    fn test_parse_unknown_field_type_fails() {
        let toml = "[fields.geo]\ntype = \"geo_point\"\n";
        assert!(parse_config_str(toml, Path::new("test.toml")).is_err());
    }

    #[test]
    fn test_parse_unknown_key_fails() {
        let toml = "[index]\nlimit = 5\n";
        assert!(parse_config_str(toml, Path::new("test.toml")).is_err());
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = parse_config_str("this is not valid toml [[[", Path::new("test.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("test.toml"));
    }

    #[test]
    fn test_parse_root() {
        let config = parse_config_str("root = true\n", Path::new("test.toml")).unwrap();
        assert_eq!(config.root, Some(true));
    }
}
