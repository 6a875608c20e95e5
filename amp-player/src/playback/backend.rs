//! Audio backend capability
//!
//! Decoding and output belong to the backend. The engine only binds one
//! [`AudioSource`] at a time and drives its transport and volume.

use crate::error::Result;
use amp_common::TransportState;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Opens readers for local files and network streams
pub trait AudioBackend: Send + Sync {
    /// Open a local file for read and seek
    fn open_file(&self, path: &Path) -> Result<Box<dyn AudioSource>>;

    /// Open a network stream
    ///
    /// May block for as long as the connection takes; the engine calls it
    /// on the blocking pool under a per-attempt timeout.
    fn open_stream(&self, uri: &Url) -> Result<Box<dyn AudioSource>>;
}

/// One opened reader bound to the output
pub trait AudioSource: Send {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;

    /// Current read position
    fn position(&self) -> Duration;

    /// Total length, when the reader knows it
    fn total_duration(&self) -> Option<Duration>;

    fn can_seek(&self) -> bool;
    fn seek(&mut self, to: Duration) -> Result<()>;

    /// Output volume in `[0.0, 1.0]`
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);

    fn playback_state(&self) -> TransportState;
}
