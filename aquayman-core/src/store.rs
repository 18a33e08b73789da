//! YAML persistence for organization documents.
//!
//! Loads are strict (unknown enum values fail the parse); saves are atomic:
//! serialize → `<file>.tmp` sibling → `rename`. The `.tmp` is always in the
//! same directory as the target, so the rename never crosses filesystems.

use std::path::{Path, PathBuf};

use crate::error::{io_err, ConfigError};
use crate::types::Config;

/// Load an organization document from `path`.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_from_file(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Atomically write `config` to `path`, replacing any existing file.
pub fn save_to_file(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let tmp = tmp_path(path);
    let yaml = serde_yaml::to_string(config)?;

    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tempfile::TempDir;

    use super::*;
    use crate::types::{RepositoryConfig, RepositoryRole, Visibility};

    fn sample() -> Config {
        Config {
            organization: "acme".into(),
            repositories: vec![RepositoryConfig {
                name: "app".into(),
                visibility: Visibility::Public,
                description: "the app".into(),
                teams: BTreeMap::from([("devs".to_string(), RepositoryRole::Write)]),
                users: BTreeMap::new(),
            }],
            ..Config::default()
        }
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.yaml");
        save_to_file(&sample(), &path).expect("save");
        let loaded = load_from_file(&path).expect("load");
        assert_eq!(loaded, sample());
    }

    #[test]
    fn save_cleans_up_tmp() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.yaml");
        save_to_file(&sample(), &path).expect("save");
        assert!(!dir.path().join("config.yaml.tmp").exists());
    }

    #[test]
    fn load_missing_returns_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let err = load_from_file(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.yaml");
        save_to_file(
            &Config {
                organization: "acme".into(),
                ..Config::default()
            },
            &path,
        )
        .expect("save");
        let yaml = std::fs::read_to_string(&path).expect("read");
        assert_eq!(yaml.trim(), "organization: acme");
    }
}
