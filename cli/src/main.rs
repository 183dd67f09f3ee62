mod commands;

use anyhow::Result;
use cachepack_core::{CancelFlag, Error};
use clap::{Parser, Subcommand};
use commands::{archive::ArchiveCommand, join::JoinCommand, split::SplitCommand};
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(
    name = "cachepack",
    version,
    about = "Back up a Gradle cache into a zip archive and split it for upload",
    long_about = "Cachepack packs the reusable parts of a Gradle user home into a portable zip \
                  archive and splits large archives into size-bounded parts"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    verbose: bool,

    #[arg(short, long, global = true, help = "Enable quiet mode")]
    quiet: bool,

    #[arg(long, global = true, help = "Print the result summary as JSON")]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Create a zip backup of the cache directory")]
    Archive(ArchiveCommand),

    #[command(about = "Split a file into size-bounded parts")]
    Split(SplitCommand),

    #[command(about = "Rebuild a file from its parts")]
    Join(JoinCommand),
}

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage errors exit with 1; --help and --version still exit with 0.
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose, cli.quiet)?;

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || handler_flag.cancel())?;

    debug!("Starting cachepack");

    let result = match cli.command {
        Commands::Archive(ref cmd) => cmd.run(&cli, &cancel),
        Commands::Split(ref cmd) => cmd.run(&cli, &cancel),
        Commands::Join(ref cmd) => cmd.run(&cli),
    };

    if let Err(err) = &result {
        if matches!(err.downcast_ref::<Error>(), Some(Error::Interrupted)) {
            error!("Interrupted; any partially written output is incomplete");
            std::process::exit(1);
        }
    }

    result
}

fn init_tracing(verbose: bool, quiet: bool) -> Result<()> {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(format!(
            "cachepack={},cachepack_core={}",
            level, level
        )))
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_archive_needs_no_arguments() {
        let cli = Cli::try_parse_from(["cachepack", "archive"]).unwrap();
        assert!(matches!(cli.command, Commands::Archive(_)));
        assert!(!cli.json);
    }

    #[test]
    fn test_split_requires_exactly_one_file() {
        let missing = Cli::try_parse_from(["cachepack", "split"]).err().unwrap();
        assert_eq!(missing.kind(), ErrorKind::MissingRequiredArgument);
        assert!(missing.use_stderr());

        let extra = Cli::try_parse_from(["cachepack", "split", "a.zip", "b.zip"]).err().unwrap();
        assert!(extra.use_stderr());

        let ok = Cli::try_parse_from(["cachepack", "split", "gradle-backup.zip"]).unwrap();
        assert!(matches!(ok.command, Commands::Split(_)));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["cachepack", "join", "gradle-backup.zip", "--json", "-q"])
            .unwrap();
        assert!(cli.json);
        assert!(cli.quiet);
    }

    #[test]
    fn test_help_is_not_a_usage_error() {
        let help = Cli::try_parse_from(["cachepack", "--help"]).err().unwrap();
        assert!(!help.use_stderr());
    }
}
