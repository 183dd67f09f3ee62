use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    pub output: PathBuf,
    pub included: u64,
    pub excluded: u64,
    pub total_bytes: u64,
    pub compressed_bytes: u64,
    pub skipped_dirs: Vec<String>,
}

impl ArchiveSummary {
    /// Percentage saved by compression, 0 when nothing was archived.
    pub fn compression_ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_bytes as f64 / self.total_bytes as f64) * 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SplitSummary {
    pub input: PathBuf,
    pub input_bytes: u64,
    pub chunk_size: u64,
    pub parts: Vec<PathBuf>,
}

/// Shared stop signal, set from a Ctrl-C handler and polled between items.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
