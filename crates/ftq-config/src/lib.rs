//! Configuration and field mappings for ftq.
//!
//! ftq uses TOML configuration files named `.ftq.toml`. Configuration is resolved by walking up
//! the directory tree from the current working directory, collecting any `.ftq.toml` files
//! found, then loading `~/.ftq.toml` as the global config with lowest precedence.
//!
//! The configuration names the target index, the default field for unscoped query terms, and
//! the field mappings the rewriter resolves query fields against. Mappings are declared in
//! `[fields.NAME]` tables, loaded from an Elasticsearch-style JSON mapping file, or both.

mod discovery;
mod error;
mod mapping;
mod merge;
mod parse;
mod resolve;
mod templates;
#[cfg(test)]
mod test_support;
mod validate;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

pub use discovery::{CONFIG_FILENAME, discover_config_files, global_config_path, is_global_config};
pub use error::ConfigError;
use log::debug;
pub use mapping::{
    ANALYZERS, FieldLookup, FieldMapping, FieldType, MappingSnapshot, fields_from_json,
    load_mapping_file,
};
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{RawConfig, RawField, RawIndex, parse_config_file, parse_config_str};
pub use resolve::resolve_mapping_path;
use serde::Serialize;
pub use templates::{global_template, local_template};
pub use validate::ConfigWarning;
use validate::validate_config;

/// Index name used when no configuration names one.
pub const DEFAULT_INDEX_NAME: &str = "default";

/// Top-level merged configuration.
///
/// This represents the fully resolved configuration after merging all discovered `.ftq.toml`
/// files according to precedence rules.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Index settings.
    pub index: IndexSettings,
    /// Field mappings declared in `[fields.NAME]` tables, sorted by name.
    pub fields: Vec<FieldMapping>,
    /// Directory containing the most specific config file.
    pub config_root: Option<PathBuf>,
    /// Config files that contributed, highest precedence first.
    pub sources: Vec<PathBuf>,
}

impl Config {
    /// Loads configuration by discovering and merging all relevant `.ftq.toml` files.
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_files = discover_config_files(cwd);
        Self::load_from_files(&config_files)
    }

    /// Loads configuration from a specific list of config file paths.
    ///
    /// Files should be provided in precedence order: highest precedence first.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let parsed = files
            .iter()
            .map(|path| {
                Ok(ParsedConfig {
                    path: path.clone(),
                    config: parse_config_file(path)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        merge_configs(&parsed)
    }

    /// Builds the field lookup the rewriter uses.
    ///
    /// `[fields]` tables take precedence over fields of the same name in the JSON mapping file.
    pub fn mappings(&self) -> Result<MappingSnapshot, ConfigError> {
        let mut fields = self.fields.clone();
        if let Some(path) = &self.index.mapping {
            debug!("loading mapping file {}", path.display());
            fields.extend(load_mapping_file(path)?);
        }
        Ok(MappingSnapshot::from_fields(fields))
    }

    /// Validates the configuration against its effective mappings and returns any warnings.
    ///
    /// This checks for:
    /// - No fields mapped at all
    /// - A default field that is not mapped
    /// - Aliases that collide with another field or alias
    /// - Nested paths that are not a prefix of the field path
    /// - Analyzer names the highlighter does not know
    pub fn validate(&self, mappings: &MappingSnapshot) -> Vec<ConfigWarning> {
        validate_config(self, mappings)
    }

    /// Serializes the effective configuration to TOML format.
    ///
    /// The output uses the same schema as a `.ftq.toml` file.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let serializable = SerializableConfig {
            index: SerializableIndex {
                name: &self.index.name,
                default_field: self.index.default_field.as_deref(),
                as_filter: self.index.as_filter,
                mapping: self.index.mapping.as_ref().map(|p| p.display().to_string()),
            },
            fields: self
                .fields
                .iter()
                .map(|f| (f.name.as_str(), SerializableField::from(f)))
                .collect(),
        };
        Ok(toml::to_string_pretty(&serializable)?)
    }
}

/// Settings from the `[index]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    /// Index identifier the rewriter targets.
    pub name: String,
    /// Field unscoped query terms are matched against.
    pub default_field: Option<String>,
    /// Wrap every query as a single base filter.
    pub as_filter: bool,
    /// Resolved path of the JSON mapping file.
    pub mapping: Option<PathBuf>,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_INDEX_NAME.to_string(),
            default_field: None,
            as_filter: false,
            mapping: None,
        }
    }
}

/// TOML view of [`Config`].
#[derive(Serialize)]
struct SerializableConfig<'a> {
    /// Index settings.
    index: SerializableIndex<'a>,
    /// Fields keyed by name, sorted for deterministic output.
    fields: BTreeMap<&'a str, SerializableField<'a>>,
}

/// TOML view of [`IndexSettings`].
#[derive(Serialize)]
struct SerializableIndex<'a> {
    /// Index identifier.
    name: &'a str,
    /// Default field.
    #[serde(skip_serializing_if = "Option::is_none")]
    default_field: Option<&'a str>,
    /// Base filter flag.
    as_filter: bool,
    /// Mapping file.
    #[serde(skip_serializing_if = "Option::is_none")]
    mapping: Option<String>,
}

/// TOML view of a [`FieldMapping`].
#[derive(Serialize)]
struct SerializableField<'a> {
    /// Value type.
    #[serde(rename = "type")]
    field_type: FieldType,
    /// Analyzer.
    #[serde(skip_serializing_if = "Option::is_none")]
    analyzer: Option<&'a str>,
    /// Aliases.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    aliases: Vec<String>,
    /// Nested object path.
    #[serde(skip_serializing_if = "Option::is_none")]
    nested: Option<&'a str>,
    /// Canonical path, only when it differs from the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a str>,
}

impl<'a> From<&'a FieldMapping> for SerializableField<'a> {
    fn from(field: &'a FieldMapping) -> Self {
        Self {
            field_type: field.field_type,
            analyzer: field.analyzer.as_deref(),
            aliases: field.aliases.clone(),
            nested: field.nested.as_deref(),
            path: (field.path != field.name).then_some(field.path.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.index.name, DEFAULT_INDEX_NAME);
        assert!(config.index.default_field.is_none());
        assert!(!config.index.as_filter);
        assert!(config.fields.is_empty());
        assert!(config.config_root.is_none());
    }

    #[test]
    fn test_mappings_from_fields_only() {
        let config = Config {
            fields: vec![FieldMapping::new("title", FieldType::Text).with_alias("heading")],
            ..Default::default()
        };
        let mappings = config.mappings().unwrap();
        assert_eq!(mappings.lookup("heading").unwrap().name, "title");
    }

    #[test]
    fn test_to_toml() {
        let config = Config {
            index: IndexSettings {
                name: "db.schema.table.index".into(),
                default_field: Some("body".into()),
                ..Default::default()
            },
            fields: vec![
                FieldMapping::new("body", FieldType::Text),
                FieldMapping::new("views", FieldType::Long).with_path("stats.views"),
            ],
            ..Default::default()
        };
        let toml = config.to_toml().unwrap();

        assert!(toml.contains("[index]"));
        assert!(toml.contains("name = \"db.schema.table.index\""));
        assert!(toml.contains("default_field = \"body\""));
        assert!(toml.contains("[fields.views]"));
        assert!(toml.contains("path = \"stats.views\""));

        // The output is itself a valid config.
        let reparsed = parse_config_str(&toml, Path::new("effective")).unwrap();
        assert_eq!(reparsed.fields.unwrap().len(), 2);
    }
}
