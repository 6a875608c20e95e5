//! Error types for amp-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for amp-player module
#[derive(Error, Debug)]
pub enum Error {
    /// Errors raised by shared amp-common types
    #[error(transparent)]
    Common(#[from] amp_common::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tag or duration probing failed
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// The audio backend refused to open or drive a source
    #[error("Audio backend error: {0}")]
    Backend(String),

    /// Every attempt to open a network stream failed or timed out
    #[error("Could not open stream {uri} after {attempts} attempts")]
    StreamOpen { uri: String, attempts: u32 },

    /// Playlist text is not an M3U playlist
    #[error("Invalid playlist: {0}")]
    InvalidPlaylist(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Playlist operation rejected
    #[error("Playlist error: {0}")]
    Playlist(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),
}

/// Convenience Result type using amp-player Error
pub type Result<T> = std::result::Result<T, Error>;
