use crate::Result;
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 95 MiB, which keeps each part under the common 100 MB upload limit.
pub const DEFAULT_CHUNK_SIZE: u64 = 95 * 1024 * 1024;

pub const DEFAULT_OUTPUT: &str = "gradle-backup.zip";

const DEFAULT_BACKUP_DIRS: &[&str] = &[
    "caches/modules-2",
    "caches/jars-9",
    "caches/8.14.3",
    "caches/journal-1",
    "caches/build-cache-1",
    "wrapper",
];

// Everything here is regenerated by Gradle on the next build.
const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    ".lock",
    "transforms",
    "daemon",
    "native",
    "notifications",
    "workers",
    ".tmp",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub source_root: PathBuf,
    pub backup_dirs: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub output: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        let source_root = BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".gradle"))
            .unwrap_or_else(|| PathBuf::from(".gradle"));

        Self {
            source_root,
            backup_dirs: DEFAULT_BACKUP_DIRS.iter().map(|s| s.to_string()).collect(),
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS.iter().map(|s| s.to_string()).collect(),
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl ArchiveConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Loads the per-user config file if one exists, otherwise the built-in defaults.
    pub fn discover() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "cachepack").map(|dirs| dirs.config_dir().join("config.toml"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitConfig {
    pub chunk_size: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_gradle_layout() {
        let config = ArchiveConfig::default();
        assert!(config.source_root.ends_with(".gradle"));
        assert_eq!(config.backup_dirs.len(), 6);
        assert!(config.exclude_patterns.contains(&"transforms".to_string()));
        assert_eq!(config.output, PathBuf::from("gradle-backup.zip"));
        assert_eq!(SplitConfig::default().chunk_size, 99_614_720);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ArchiveConfig::from_toml(
            r#"
            source_root = "/srv/gradle"
            exclude_patterns = ["transforms"]
            "#,
        )
        .unwrap();

        assert_eq!(config.source_root, PathBuf::from("/srv/gradle"));
        assert_eq!(config.exclude_patterns, vec!["transforms".to_string()]);
        assert_eq!(config.backup_dirs, ArchiveConfig::default().backup_dirs);
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let result = ArchiveConfig::from_toml("backup_dirs = 3");
        assert!(matches!(result, Err(crate::Error::ConfigParse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "output = \"out.zip\"\nbackup_dirs = [\"wrapper\"]\n").unwrap();

        let config = ArchiveConfig::load(&path).unwrap();
        assert_eq!(config.output, PathBuf::from("out.zip"));
        assert_eq!(config.backup_dirs, vec!["wrapper".to_string()]);
    }
}
