use anyhow::{Context, Result};
use cachepack_core::{CancelFlag, Splitter};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct SplitCommand {
    #[arg(help = "File to split")]
    file: PathBuf,

    #[arg(
        long,
        value_parser = parse_chunk_size,
        default_value = "95MiB",
        help = "Maximum part size, e.g. 95MiB or 50000000"
    )]
    chunk_size: u64,
}

impl SplitCommand {
    pub fn run(&self, cli: &crate::Cli, cancel: &CancelFlag) -> Result<()> {
        let summary = Splitter::new(self.chunk_size)?
            .with_cancel(cancel.clone())
            .split(&self.file)
            .with_context(|| format!("Failed to split {}", self.file.display()))?;

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        println!(
            "✅ Split {} ({:.1} MB) into {} parts",
            summary.input.display(),
            summary.input_bytes as f64 / 1024.0 / 1024.0,
            summary.parts.len()
        );
        for part in &summary.parts {
            println!("  {}", part.display());
        }

        Ok(())
    }
}

fn parse_chunk_size(value: &str) -> Result<u64, String> {
    let size = parse_size::parse_size(value).map_err(|e| e.to_string())?;
    if size == 0 {
        return Err("chunk size must be greater than zero".to_string());
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chunk_size() {
        assert_eq!(parse_chunk_size("95MiB").unwrap(), 95 * 1024 * 1024);
        assert_eq!(parse_chunk_size("1024").unwrap(), 1024);
        assert!(parse_chunk_size("0").is_err());
        assert!(parse_chunk_size("lots").is_err());
    }
}
