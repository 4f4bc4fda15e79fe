//! Configuration validation.
//!
//! Validates a loaded configuration and its effective mappings, reporting warnings for
//! definitions that load fine but will surprise at query time.

use std::{collections::HashMap, fmt};

use crate::{ANALYZERS, Config, FieldLookup, MappingSnapshot};

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// No fields are mapped.
    NoFieldsDefined,
    /// The default field does not resolve to a mapping.
    DefaultFieldUnmapped {
        /// The configured default field.
        field: String,
    },
    /// An alias is also the name of a field or an alias of another field.
    AliasCollision {
        /// The colliding alias.
        alias: String,
        /// Field declaring the alias.
        field: String,
        /// The other field using the same name.
        other: String,
    },
    /// A field's nested path does not enclose its path.
    NestedPathNotPrefix {
        /// Name of the field.
        field: String,
        /// Declared nested path.
        nested: String,
        /// Field path.
        path: String,
    },
    /// A field names an analyzer the highlighter does not implement.
    UnknownAnalyzer {
        /// Name of the field.
        field: String,
        /// The unknown analyzer.
        analyzer: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFieldsDefined => write!(f, "no fields are mapped"),
            Self::DefaultFieldUnmapped { field } => {
                write!(f, "default field '{field}' is not mapped")
            }
            Self::AliasCollision {
                alias,
                field,
                other,
            } => write!(
                f,
                "alias '{alias}' of field '{field}' collides with field '{other}'"
            ),
            Self::NestedPathNotPrefix {
                field,
                nested,
                path,
            } => write!(
                f,
                "field '{field}' is nested under '{nested}' but its path is '{path}'"
            ),
            Self::UnknownAnalyzer { field, analyzer } => {
                write!(f, "field '{field}' uses unknown analyzer '{analyzer}'")
            }
        }
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config, mappings: &MappingSnapshot) -> Vec<ConfigWarning> {
    if mappings.is_empty() {
        return vec![ConfigWarning::NoFieldsDefined];
    }

    let mut warnings = Vec::new();

    if let Some(field) = &config.index.default_field
        && mappings.lookup(field).is_none()
    {
        warnings.push(ConfigWarning::DefaultFieldUnmapped {
            field: field.clone(),
        });
    }

    warnings.extend(alias_collisions(mappings));

    for field in mappings.fields() {
        if let Some(nested) = &field.nested
            && !field.path.starts_with(&format!("{nested}."))
        {
            warnings.push(ConfigWarning::NestedPathNotPrefix {
                field: field.name.clone(),
                nested: nested.clone(),
                path: field.path.clone(),
            });
        }

        if let Some(analyzer) = &field.analyzer
            && !ANALYZERS.contains(&analyzer.as_str())
        {
            warnings.push(ConfigWarning::UnknownAnalyzer {
                field: field.name.clone(),
                analyzer: analyzer.clone(),
            });
        }
    }

    warnings
}

/// Finds aliases that shadow a field name or repeat another field's alias.
fn alias_collisions(mappings: &MappingSnapshot) -> Vec<ConfigWarning> {
    let mut owners: HashMap<&str, &str> = mappings
        .fields()
        .iter()
        .map(|f| (f.name.as_str(), f.name.as_str()))
        .collect();
    let mut warnings = Vec::new();

    for field in mappings.fields() {
        for alias in &field.aliases {
            match owners.get(alias.as_str()) {
                Some(&other) if other != field.name => {
                    warnings.push(ConfigWarning::AliasCollision {
                        alias: alias.clone(),
                        field: field.name.clone(),
                        other: other.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    owners.insert(alias.as_str(), field.name.as_str());
                }
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldMapping, FieldType, IndexSettings};

    fn config_with_default(field: Option<&str>) -> Config {
        Config {
            index: IndexSettings {
                default_field: field.map(String::from),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_no_fields() {
        let warnings = Config::default().validate(&MappingSnapshot::default());
        assert_eq!(warnings, vec![ConfigWarning::NoFieldsDefined]);
    }

    #[test]
    fn test_validate_clean_config() {
        let mappings = MappingSnapshot::from_fields([
            FieldMapping::new("body", FieldType::Text).with_alias("content"),
            FieldMapping::new("comments.body", FieldType::Text).with_nested("comments"),
        ]);
        let warnings = config_with_default(Some("content")).validate(&mappings);
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn test_validate_default_field_unmapped() {
        let mappings = MappingSnapshot::from_fields([FieldMapping::new("body", FieldType::Text)]);
        let warnings = config_with_default(Some("text")).validate(&mappings);
        assert_eq!(
            warnings,
            vec![ConfigWarning::DefaultFieldUnmapped {
                field: "text".into()
            }]
        );
    }

    #[test]
    fn test_validate_alias_collisions() {
        let mappings = MappingSnapshot::from_fields([
            FieldMapping::new("title", FieldType::Text).with_alias("name"),
            FieldMapping::new("name", FieldType::Keyword),
            FieldMapping::new("subject", FieldType::Text).with_alias("heading"),
            FieldMapping::new("caption", FieldType::Text).with_alias("heading"),
        ]);
        let warnings = config_with_default(None).validate(&mappings);
        assert!(warnings.contains(&ConfigWarning::AliasCollision {
            alias: "name".into(),
            field: "title".into(),
            other: "name".into(),
        }));
        assert!(warnings.contains(&ConfigWarning::AliasCollision {
            alias: "heading".into(),
            field: "caption".into(),
            other: "subject".into(),
        }));
    }

    #[test]
    fn test_validate_nested_prefix_and_analyzer() {
        let mappings = MappingSnapshot::from_fields([
            FieldMapping::new("author", FieldType::Keyword).with_nested("comments"),
            FieldMapping::new("body", FieldType::Text).with_analyzer("snowball"),
        ]);
        let warnings = config_with_default(None).validate(&mappings);
        assert_eq!(warnings.len(), 2);
        assert_eq!(
            warnings[0].to_string(),
            "field 'author' is nested under 'comments' but its path is 'author'"
        );
        assert_eq!(
            warnings[1].to_string(),
            "field 'body' uses unknown analyzer 'snowball'"
        );
    }
}
