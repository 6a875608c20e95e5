//! Errors raised by the shared MusicAmp types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures building descriptors, parsing shared values or loading config
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A track location that does not exist on disk
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unparseable value (fade curve name, non-file track path, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
