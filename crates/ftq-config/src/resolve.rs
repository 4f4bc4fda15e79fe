//! Path resolution for mapping files.
//!
//! `[index] mapping` may be absolute, tilde-prefixed, or relative to the config file that
//! declares it.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::ConfigError;

/// Resolves a mapping file path to an absolute, canonical path.
///
/// The file must exist and be a regular file.
pub fn resolve_mapping_path(path: &str, config_dir: &Path) -> Result<PathBuf, ConfigError> {
    let expanded = expand_tilde(path)?;
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        config_dir.join(expanded)
    };

    let canonical = absolute
        .canonicalize()
        .map_err(|source| ConfigError::PathResolution {
            path: absolute.clone(),
            source,
        })?;

    if !canonical.is_file() {
        return Err(ConfigError::MappingNotFile { path: canonical });
    }

    Ok(canonical)
}

/// Expands a leading `~` or `~/` to the home directory.
fn expand_tilde(path: &str) -> Result<PathBuf, ConfigError> {
    let rest = match path {
        "~" => "",
        _ => match path.strip_prefix("~/") {
            Some(rest) => rest,
            None => return Ok(PathBuf::from(path)),
        },
    };

    let home = BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDirectory)?;
    Ok(if rest.is_empty() { home } else { home.join(rest) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestDir;

    #[test]
    fn test_resolve_relative_path() {
        let test_dir = TestDir::new();
        let mapping = test_dir.create_file("conf/mapping.json", "{}");

        let resolved = resolve_mapping_path("./mapping.json", &test_dir.path().join("conf"));
        assert_eq!(resolved.unwrap(), mapping.canonicalize().unwrap());
    }

    #[test]
    fn test_resolve_parent_relative_path() {
        let test_dir = TestDir::new();
        let mapping = test_dir.create_file("shared/mapping.json", "{}");
        let project = test_dir.create_dir("project");

        let resolved = resolve_mapping_path("../shared/mapping.json", &project).unwrap();
        assert_eq!(resolved, mapping.canonicalize().unwrap());
    }

    #[test]
    fn test_resolve_absolute_path_ignores_config_dir() {
        let test_dir = TestDir::new();
        let mapping = test_dir.create_file("mapping.json", "{}");
        let absolute = mapping.canonicalize().unwrap();

        let resolved =
            resolve_mapping_path(absolute.to_str().unwrap(), Path::new("/elsewhere")).unwrap();
        assert_eq!(resolved, absolute);
    }

    #[test]
    fn test_resolve_missing_file() {
        let test_dir = TestDir::new();
        let err = resolve_mapping_path("./missing.json", test_dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::PathResolution { .. }));
    }

    #[test]
    fn test_resolve_directory_is_rejected() {
        let test_dir = TestDir::new();
        test_dir.create_dir("mapping");
        let err = resolve_mapping_path("mapping", test_dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::MappingNotFile { .. }));
    }

    #[test]
    fn test_expand_tilde() {
        let home = BaseDirs::new().unwrap().home_dir().to_path_buf();
        assert_eq!(expand_tilde("~").unwrap(), home);
        assert_eq!(expand_tilde("~/maps/a.json").unwrap(), home.join("maps/a.json"));
        assert_eq!(expand_tilde("foo/~/bar").unwrap(), PathBuf::from("foo/~/bar"));
    }
}
