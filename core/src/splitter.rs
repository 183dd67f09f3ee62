use crate::types::{CancelFlag, SplitSummary};
use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MIN_INDEX_WIDTH: usize = 2;

/// Cuts a file into `<name>.partNN` pieces of at most `chunk_size` bytes.
pub struct Splitter {
    chunk_size: u64,
    cancel: CancelFlag,
}

impl Splitter {
    pub fn new(chunk_size: u64) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidChunkSize);
        }
        Ok(Self {
            chunk_size,
            cancel: CancelFlag::new(),
        })
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn split<P: AsRef<Path>>(&self, input: P) -> Result<SplitSummary> {
        let input = input.as_ref();
        if !input.is_file() {
            return Err(Error::InputNotFound {
                path: input.to_path_buf(),
            });
        }

        let file = File::open(input)?;
        let input_bytes = file.metadata()?.len();
        let expected = expected_parts(input_bytes, self.chunk_size);
        let width = index_width(expected);

        info!(
            "Splitting {} ({} bytes) into {} parts of at most {} bytes",
            input.display(),
            input_bytes,
            expected,
            self.chunk_size
        );

        let mut reader = BufReader::new(file);
        let mut parts = Vec::new();

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Interrupted);
            }
            // Checked before creating the part so a trailing empty chunk is never written.
            if reader.fill_buf()?.is_empty() {
                break;
            }

            let path = part_path(input, parts.len(), width);
            let mut part = File::create(&path)?;
            let written = io::copy(&mut reader.by_ref().take(self.chunk_size), &mut part)?;
            debug!("Wrote {} ({} bytes)", path.display(), written);
            parts.push(path);
        }

        if parts.is_empty() {
            warn!("{} is empty, no parts written", input.display());
        } else if parts.len() as u64 != expected {
            warn!(
                "{} changed while splitting: expected {} parts, wrote {}",
                input.display(),
                expected,
                parts.len()
            );
        }

        Ok(SplitSummary {
            input: input.to_path_buf(),
            input_bytes,
            chunk_size: self.chunk_size,
            parts,
        })
    }
}

/// Splits `input` and returns the part paths in index order.
pub fn split<P: AsRef<Path>>(input: P, chunk_size: u64) -> Result<Vec<PathBuf>> {
    Ok(Splitter::new(chunk_size)?.split(input)?.parts)
}

pub fn expected_parts(size: u64, chunk_size: u64) -> u64 {
    size.div_ceil(chunk_size)
}

/// Digits needed for the largest index, never fewer than two, so that
/// lexicographic order of part names always equals index order.
pub fn index_width(parts: u64) -> usize {
    let last = parts.saturating_sub(1);
    last.to_string().len().max(MIN_INDEX_WIDTH)
}

pub fn part_path(input: &Path, index: usize, width: usize) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(format!(".part{:0width$}", index, width = width));
    PathBuf::from(name)
}

/// Finds the `<input>.partN` files next to `input`, ordered by numeric index.
pub fn discover_parts<P: AsRef<Path>>(input: P) -> Result<Vec<PathBuf>> {
    let input = input.as_ref();
    let file_name = input
        .file_name()
        .ok_or_else(|| Error::Other(format!("{} has no file name", input.display())))?
        .to_string_lossy()
        .into_owned();
    let prefix = format!("{}.part", file_name);

    let dir = match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(suffix) = name.strip_prefix(&prefix) else {
            continue;
        };
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        if let Ok(index) = suffix.parse::<usize>() {
            found.push((index, input.with_file_name(&name)));
        }
    }

    if found.is_empty() {
        return Err(Error::NoParts {
            path: input.to_path_buf(),
        });
    }

    found.sort_by_key(|(index, _)| *index);

    let mut parts = Vec::with_capacity(found.len());
    for (expected, (index, path)) in found.into_iter().enumerate() {
        if index > expected {
            return Err(Error::MissingPart {
                path: input.to_path_buf(),
                index: expected,
            });
        }
        if index < expected {
            return Err(Error::Other(format!(
                "Duplicate part {} for {}",
                index,
                input.display()
            )));
        }
        parts.push(path);
    }

    Ok(parts)
}

/// Concatenates `parts` in order into `output`, returning the bytes written.
pub fn join<P: AsRef<Path>>(parts: &[PathBuf], output: P, overwrite: bool) -> Result<u64> {
    let output = output.as_ref();
    if parts.is_empty() {
        return Err(Error::NoParts {
            path: output.to_path_buf(),
        });
    }
    if output.exists() && !overwrite {
        return Err(Error::OutputExists {
            path: output.to_path_buf(),
        });
    }
    if let Ok(target) = fs::canonicalize(output) {
        let is_part = parts
            .iter()
            .any(|p| fs::canonicalize(p).is_ok_and(|p| p == target));
        if is_part {
            return Err(Error::Other(format!(
                "{} is one of the parts being joined",
                output.display()
            )));
        }
    }

    let total = match concat_parts(parts, output) {
        Ok(total) => total,
        Err(e) => {
            // A half-written output would look like a valid rebuild.
            if let Err(remove_err) = fs::remove_file(output)
                && remove_err.kind() != io::ErrorKind::NotFound
            {
                warn!("Failed to remove partial {}: {}", output.display(), remove_err);
            }
            return Err(e);
        }
    };

    info!("Joined {} parts into {} ({} bytes)", parts.len(), output.display(), total);
    Ok(total)
}

fn concat_parts(parts: &[PathBuf], output: &Path) -> Result<u64> {
    let mut out = File::create(output)?;
    let mut total = 0u64;
    for part in parts {
        let mut input = File::open(part)?;
        let written = io::copy(&mut input, &mut out)?;
        debug!("Appended {} ({} bytes)", part.display(), written);
        total += written;
    }
    Ok(total)
}
