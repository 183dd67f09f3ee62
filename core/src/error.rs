use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Source root not found at {path}")]
    SourceRootNotFound { path: PathBuf },

    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("No parts found for {path}")]
    NoParts { path: PathBuf },

    #[error("Part {index} is missing for {path}")]
    MissingPart { path: PathBuf, index: usize },

    #[error("Output already exists: {path}")]
    OutputExists { path: PathBuf },

    #[error("Interrupted")]
    Interrupted,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
