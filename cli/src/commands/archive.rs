use anyhow::{Context, Result};
use cachepack_core::config::{self, DEFAULT_CHUNK_SIZE};
use cachepack_core::{ArchiveConfig, Archiver, CancelFlag};
use clap::Args;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args)]
pub struct ArchiveCommand {
    #[arg(long, env = "CACHEPACK_CONFIG", help = "Config file (TOML)")]
    config: Option<PathBuf>,

    #[arg(long, env = "CACHEPACK_SOURCE_ROOT", help = "Directory to back up (default: ~/.gradle)")]
    source_root: Option<PathBuf>,

    #[arg(short, long, help = "Archive to write (default: gradle-backup.zip)")]
    output: Option<PathBuf>,

    #[arg(long, help = "Additional exclude pattern, matched anywhere in the full path")]
    exclude: Vec<String>,
}

impl ArchiveCommand {
    pub fn run(&self, cli: &crate::Cli, cancel: &CancelFlag) -> Result<()> {
        let config = self.resolve_config()?;

        info!("Source: {}", config.source_root.display());
        info!("Target: {}", config.output.display());

        let summary = Archiver::new(config)
            .with_cancel(cancel.clone())
            .run()
            .context("Backup failed")?;

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("✅ Backup completed: {}", summary.output.display());
            println!(
                "💾 Size: {:.1} MB -> {:.1} MB ({:.1}% saved)",
                summary.total_bytes as f64 / 1024.0 / 1024.0,
                summary.compressed_bytes as f64 / 1024.0 / 1024.0,
                summary.compression_ratio()
            );
            println!("📁 Included: {}", summary.included);
            println!("🚫 Excluded: {}", summary.excluded);
        }

        if summary.compressed_bytes > DEFAULT_CHUNK_SIZE {
            warn!(
                "{} is larger than {} MB and must be split before upload",
                summary.output.display(),
                DEFAULT_CHUNK_SIZE / 1024 / 1024
            );
        }

        Ok(())
    }

    fn resolve_config(&self) -> Result<ArchiveConfig> {
        let mut config = match &self.config {
            Some(path) => ArchiveConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ArchiveConfig::discover().with_context(|| {
                format!(
                    "Failed to load config {}",
                    config::default_config_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                )
            })?,
        };

        if let Some(root) = &self.source_root {
            config.source_root = root.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        config.exclude_patterns.extend(self.exclude.iter().cloned());

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cachepack.toml");
        fs::write(
            &path,
            "source_root = \"/from/file\"\nexclude_patterns = [\"transforms\"]\n",
        )
        .unwrap();

        let cmd = ArchiveCommand {
            config: Some(path),
            source_root: Some(PathBuf::from("/from/flag")),
            output: Some(PathBuf::from("out.zip")),
            exclude: vec!["daemon".to_string()],
        };
        let config = cmd.resolve_config().unwrap();

        assert_eq!(config.source_root, PathBuf::from("/from/flag"));
        assert_eq!(config.output, PathBuf::from("out.zip"));
        assert_eq!(config.exclude_patterns, vec!["transforms", "daemon"]);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cmd = ArchiveCommand {
            config: Some(PathBuf::from("/definitely/not/here.toml")),
            source_root: None,
            output: None,
            exclude: Vec::new(),
        };
        assert!(cmd.resolve_config().is_err());
    }
}
