use crate::config::ArchiveConfig;
use crate::filter::ExclusionFilter;
use crate::types::{ArchiveSummary, CancelFlag};
use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const MAX_DEFLATE_LEVEL: i64 = 9;
const PROGRESS_INTERVAL: u64 = 100;

/// Packs the configured backup directories of a source root into a single
/// deflate-compressed zip archive.
pub struct Archiver {
    config: ArchiveConfig,
    filter: ExclusionFilter,
    cancel: CancelFlag,
}

impl Archiver {
    pub fn new(config: ArchiveConfig) -> Self {
        let filter = ExclusionFilter::new(config.exclude_patterns.iter().cloned());
        Self {
            config,
            filter,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run(&self) -> Result<ArchiveSummary> {
        let root = &self.config.source_root;
        if !root.is_dir() {
            return Err(Error::SourceRootNotFound { path: root.clone() });
        }

        info!("Archiving {} into {}", root.display(), self.config.output.display());

        let output = File::create(&self.config.output)?;
        // Resolved after creation so a walk through the output's directory can skip it.
        let own_output = fs::canonicalize(&self.config.output)?;
        let mut zip = ZipWriter::new(output);
        let mut summary = ArchiveSummary {
            output: self.config.output.clone(),
            ..Default::default()
        };

        for backup_dir in &self.config.backup_dirs {
            self.check_cancelled()?;

            let source_path = root.join(backup_dir);
            if !source_path.exists() {
                info!("Skipping {}: does not exist", backup_dir);
                summary.skipped_dirs.push(backup_dir.clone());
                continue;
            }

            info!("Processing {}", backup_dir);

            if source_path.is_dir() {
                self.add_tree(&mut zip, &source_path, &own_output, &mut summary)?;
            } else if is_same_file(&source_path, &own_output) {
                debug!("Skipping the archive being written: {}", source_path.display());
            } else if self.filter.is_excluded(&source_path) {
                debug!("Excluded: {}", source_path.display());
                summary.excluded += 1;
            } else {
                self.add_file(&mut zip, &source_path, &mut summary);
            }
        }

        let output = zip.finish()?;
        summary.compressed_bytes = output.metadata()?.len();

        info!(
            "Archived {} files ({} bytes), excluded {}",
            summary.included, summary.total_bytes, summary.excluded
        );
        Ok(summary)
    }

    fn add_tree<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        dir: &Path,
        own_output: &Path,
        summary: &mut ArchiveSummary,
    ) -> Result<()> {
        let mut entries = WalkDir::new(dir).follow_links(false).into_iter();

        while let Some(next) = entries.next() {
            self.check_cancelled()?;

            let entry = match next {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    summary.excluded += 1;
                    continue;
                }
            };

            let path = entry.path();
            let file_type = entry.file_type();

            if let Some(pattern) = self.filter.matching_pattern(path) {
                if file_type.is_dir() {
                    // Never descend into an excluded directory.
                    entries.skip_current_dir();
                    debug!("Pruned {} (matches {:?})", path.display(), pattern);
                } else {
                    debug!("Excluded {} (matches {:?})", path.display(), pattern);
                }
                summary.excluded += 1;
                continue;
            }

            if file_type.is_dir() {
                continue;
            }

            if file_type.is_symlink() && path.is_dir() {
                debug!("Not following directory symlink {}", path.display());
                summary.excluded += 1;
                continue;
            }

            if !file_type.is_file() && !file_type.is_symlink() {
                debug!("Skipping special file {}", path.display());
                summary.excluded += 1;
                continue;
            }

            if is_same_file(path, own_output) {
                debug!("Skipping the archive being written: {}", path.display());
                continue;
            }

            self.add_file(zip, path, summary);
        }

        Ok(())
    }

    fn add_file<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        path: &Path,
        summary: &mut ArchiveSummary,
    ) {
        match self.write_entry(zip, path) {
            Ok(size) => {
                summary.included += 1;
                summary.total_bytes += size;

                if summary.included % PROGRESS_INTERVAL == 0 {
                    info!(
                        "{} files processed ({:.1} MB)",
                        summary.included,
                        summary.total_bytes as f64 / 1024.0 / 1024.0
                    );
                }
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                summary.excluded += 1;
            }
        }
    }

    fn write_entry<W: Write + Seek>(&self, zip: &mut ZipWriter<W>, path: &Path) -> Result<u64> {
        let name = self.entry_name(path)?;
        let mut file = File::open(path)?;
        let size = file.metadata()?.len();

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(MAX_DEFLATE_LEVEL))
            .large_file(size >= u64::from(u32::MAX));

        zip.start_file(name.as_str(), options)?;
        match io::copy(&mut file, zip) {
            Ok(written) => {
                debug!("Added {} ({} bytes)", name, written);
                Ok(written)
            }
            Err(e) => {
                zip.abort_file()?;
                Err(e.into())
            }
        }
    }

    /// Archive name of `path`: relative to the source root, `/`-separated.
    fn entry_name(&self, path: &Path) -> Result<String> {
        let relative = path
            .strip_prefix(&self.config.source_root)
            .map_err(|_| Error::Other(format!("{} is outside the source root", path.display())))?;

        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Ok(parts.join("/"))
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Interrupted);
        }
        Ok(())
    }
}

/// True when `path` resolves to `canonical`. Only entries sharing the output's
/// file name, or symlinks that may point at it, are canonicalized.
fn is_same_file(path: &Path, canonical: &Path) -> bool {
    if path.file_name() != canonical.file_name() && !path.is_symlink() {
        return false;
    }
    fs::canonicalize(path).map(|p| p == canonical).unwrap_or(false)
}

/// Convenience wrapper for a one-shot archive run.
pub fn archive(config: ArchiveConfig) -> Result<ArchiveSummary> {
    Archiver::new(config).run()
}
