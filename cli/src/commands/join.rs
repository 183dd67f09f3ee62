use anyhow::{Context, Result};
use cachepack_core::splitter;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct JoinCommand {
    #[arg(help = "Original file name; parts are read from <FILE>.partNN")]
    file: PathBuf,

    #[arg(short, long, help = "Where to write the rebuilt file (default: FILE)")]
    output: Option<PathBuf>,

    #[arg(long, help = "Overwrite the output if it already exists")]
    force: bool,
}

impl JoinCommand {
    pub fn run(&self, cli: &crate::Cli) -> Result<()> {
        let parts = splitter::discover_parts(&self.file)
            .with_context(|| format!("Failed to find parts of {}", self.file.display()))?;
        let output = self.output.clone().unwrap_or_else(|| self.file.clone());

        let bytes = splitter::join(&parts, &output, self.force)
            .with_context(|| format!("Failed to rebuild {}", output.display()))?;

        if cli.json {
            let report = serde_json::json!({
                "output": output,
                "bytes": bytes,
                "parts": parts,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!(
                "✅ Rebuilt {} from {} parts ({:.1} MB)",
                output.display(),
                parts.len(),
                bytes as f64 / 1024.0 / 1024.0
            );
        }

        Ok(())
    }
}
