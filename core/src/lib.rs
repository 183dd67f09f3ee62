pub mod archiver;
pub mod config;
pub mod error;
pub mod filter;
pub mod splitter;
pub mod types;

pub use archiver::Archiver;
pub use config::{ArchiveConfig, SplitConfig};
pub use error::{Error, Result};
pub use splitter::Splitter;
pub use types::*;
