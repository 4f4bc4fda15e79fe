//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single resolved `Config`,
//! applying precedence rules and resolving the mapping path.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::{
    Config, ConfigError, FieldMapping, IndexSettings,
    parse::{RawConfig, RawField, RawIndex},
    resolve::resolve_mapping_path,
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges multiple configuration files into a single resolved `Config`.
///
/// Configs should be provided in precedence order: highest precedence first (closest to CWD),
/// lowest precedence last (global config).
///
/// Merge rules:
/// - `[index]` scalars: first defined value wins (highest precedence)
/// - `mapping` is resolved relative to the file that defines it
/// - Fields: merged by name, first definition wins completely
pub fn merge_configs(configs: &[ParsedConfig]) -> Result<Config, ConfigError> {
    if configs.is_empty() {
        return Ok(Config::default());
    }

    Ok(Config {
        index: merge_index(configs)?,
        fields: merge_fields(configs)?,
        config_root: configs
            .first()
            .and_then(|c| c.path.parent())
            .map(Path::to_path_buf),
        sources: configs.iter().map(|c| c.path.clone()).collect(),
    })
}

/// Merges `[index]` sections, taking the first defined value for each key.
fn merge_index(configs: &[ParsedConfig]) -> Result<IndexSettings, ConfigError> {
    let mut result = IndexSettings::default();

    // Lowest precedence first so higher precedence overwrites.
    for parsed in configs.iter().rev() {
        if let Some(index) = &parsed.config.index {
            apply_raw_index(&mut result, index, config_dir(&parsed.path))?;
        }
    }

    Ok(result)
}

/// Applies a raw `[index]` section, overwriting any present values.
fn apply_raw_index(
    result: &mut IndexSettings,
    raw: &RawIndex,
    config_dir: &Path,
) -> Result<(), ConfigError> {
    if let Some(name) = &raw.name {
        result.name.clone_from(name);
    }
    if let Some(field) = &raw.default_field {
        result.default_field = Some(field.clone());
    }
    if let Some(as_filter) = raw.as_filter {
        result.as_filter = as_filter;
    }
    if let Some(mapping) = &raw.mapping {
        result.mapping = Some(resolve_mapping_path(mapping, config_dir)?);
    }
    Ok(())
}

/// Merges field tables from all configs; the first definition of a name wins.
fn merge_fields(configs: &[ParsedConfig]) -> Result<Vec<FieldMapping>, ConfigError> {
    let mut seen: BTreeMap<String, FieldMapping> = BTreeMap::new();

    for parsed in configs {
        let Some(fields) = &parsed.config.fields else {
            continue;
        };
        for (name, raw) in fields {
            if seen.contains_key(name) {
                continue;
            }
            seen.insert(name.clone(), convert_field(name, raw)?);
        }
    }

    Ok(seen.into_values().collect())
}

/// Converts a raw field table into a mapping, rejecting unusable definitions.
fn convert_field(name: &str, raw: &RawField) -> Result<FieldMapping, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidField {
        field: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("field name is empty"));
    }
    if raw.path.as_deref().is_some_and(|p| p.trim().is_empty()) {
        return Err(invalid("path is empty"));
    }
    if raw.nested.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(invalid("nested path is empty"));
    }
    if raw.aliases.iter().any(|a| a == name) {
        return Err(invalid("field lists itself as an alias"));
    }

    Ok(FieldMapping {
        name: name.to_string(),
        path: raw.path.clone().unwrap_or_else(|| name.to_string()),
        field_type: raw.field_type,
        analyzer: raw.analyzer.clone(),
        nested: raw.nested.clone(),
        aliases: raw.aliases.clone(),
    })
}

/// Directory a config file lives in.
fn config_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}
