//! Track descriptors
//!
//! A `TrackDescriptor` is one playlist entry: display metadata plus exactly
//! one playable source, either a local file or a stream URI. Entries whose
//! file could not be found when a playlist was read keep their raw location
//! in the `Missing` sentinel so they can still be displayed.

use crate::human_time::{format_minutes_seconds, format_track_time};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Title given to playlist entries whose file no longer exists
pub const FILE_NOT_FOUND_TITLE: &str = "!!! File not found !!!";

/// Title used for streams whose announced title is itself a URL
const STREAM_PLACEHOLDER_TITLE: &str = "--";

/// Where a track's audio comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum TrackSource {
    /// Canonical path of an existing local file
    LocalFile(PathBuf),
    /// Absolute http(s) URI of a network stream
    Stream(Url),
    /// Raw location of a file that could not be found; never played or persisted
    Missing(String),
}

/// Metadata for one playable item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// 1-based position in the owning playlist (0 until added)
    pub track_number: u32,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Length in whole seconds; 0 for streams of unknown length
    pub duration_seconds: u32,
    pub source: TrackSource,
}

impl TrackDescriptor {
    /// Descriptor for a local file. The file must exist; its canonical path is stored.
    pub fn local(
        path: impl AsRef<Path>,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        duration_seconds: u32,
    ) -> Result<Self> {
        let path = path.as_ref();
        let resolved = path.canonicalize().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
            _ => Error::Io(e),
        })?;

        if !resolved.is_file() {
            return Err(Error::InvalidInput(format!(
                "Not a regular file: {}",
                resolved.display()
            )));
        }

        Ok(Self {
            track_number: 0,
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            duration_seconds,
            source: TrackSource::LocalFile(resolved),
        })
    }

    /// Descriptor for a network stream. The artist column shows the URI.
    pub fn stream(uri: Url, title: impl Into<String>) -> Self {
        let mut title = title.into();
        if title.to_ascii_lowercase().starts_with("http") {
            title = STREAM_PLACEHOLDER_TITLE.to_string();
        }

        Self {
            track_number: 0,
            title,
            artist: uri.as_str().to_string(),
            album: String::new(),
            duration_seconds: 0,
            source: TrackSource::Stream(uri),
        }
    }

    /// Sentinel for a playlist entry whose file could not be found
    pub fn missing(raw_location: impl Into<String>) -> Self {
        let raw = raw_location.into();
        Self {
            track_number: 0,
            title: FILE_NOT_FOUND_TITLE.to_string(),
            artist: raw.clone(),
            album: String::new(),
            duration_seconds: 0,
            source: TrackSource::Missing(raw),
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.source, TrackSource::Stream(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self.source, TrackSource::Missing(_))
    }

    /// Missing entries are displayable but never bound for playback
    pub fn is_playable(&self) -> bool {
        !self.is_missing()
    }

    pub fn local_path(&self) -> Option<&Path> {
        match &self.source {
            TrackSource::LocalFile(path) => Some(path),
            _ => None,
        }
    }

    pub fn stream_uri(&self) -> Option<&Url> {
        match &self.source {
            TrackSource::Stream(uri) => Some(uri),
            _ => None,
        }
    }

    /// File path, URI or raw location as text
    pub fn location_text(&self) -> String {
        match &self.source {
            TrackSource::LocalFile(path) => path.display().to_string(),
            TrackSource::Stream(uri) => uri.as_str().to_string(),
            TrackSource::Missing(raw) => raw.clone(),
        }
    }

    /// One-line playlist label, e.g. `3. Title - Artist`
    pub fn display_text(&self) -> String {
        match &self.source {
            TrackSource::Missing(raw) => format!("-- {} - {}", self.title, raw),
            TrackSource::Stream(uri) => {
                format!("{}. {} - {}", self.track_number, self.title, uri.as_str())
            }
            TrackSource::LocalFile(_) => {
                format!("{}. {} - {}", self.track_number, self.title, self.artist)
            }
        }
    }

    /// `MM:SS` length column; empty for streams
    pub fn duration_text(&self) -> String {
        if self.is_stream() {
            return String::new();
        }
        format_minutes_seconds(self.duration_seconds)
    }

    /// `mm:ss` or `H:mm:ss` length used by the now-playing display
    pub fn duration_time(&self) -> String {
        format_track_time(self.duration_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn stream_url() -> Url {
        Url::parse("http://radio.example.com:8000/live").unwrap()
    }

    #[test]
    fn test_local_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.mp3");
        let err = TrackDescriptor::local(&missing, "t", "a", "", 10).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let path = dir.path().join("song.mp3");
        std::fs::File::create(&path).unwrap().write_all(b"x").unwrap();
        let track = TrackDescriptor::local(&path, "Song", "Band", "Album", 10).unwrap();
        assert_eq!(track.local_path(), Some(path.canonicalize().unwrap().as_path()));
        assert!(!track.is_stream());
        assert!(track.is_playable());
    }

    #[test]
    fn test_local_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        let err = TrackDescriptor::local(dir.path(), "t", "a", "", 0).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_stream_uses_uri_as_artist() {
        let track = TrackDescriptor::stream(stream_url(), "Jazz Radio");
        assert!(track.is_stream());
        assert_eq!(track.artist, "http://radio.example.com:8000/live");
        assert_eq!(track.duration_seconds, 0);
        assert_eq!(track.duration_text(), "");
    }

    #[test]
    fn test_stream_title_that_is_a_url_is_replaced() {
        let track = TrackDescriptor::stream(stream_url(), "HTTP://radio.example.com");
        assert_eq!(track.title, "--");
    }

    #[test]
    fn test_missing_sentinel() {
        let track = TrackDescriptor::missing("old/song.mp3");
        assert!(track.is_missing());
        assert!(!track.is_playable());
        assert_eq!(track.title, FILE_NOT_FOUND_TITLE);
        assert_eq!(track.artist, "old/song.mp3");
        assert_eq!(
            track.display_text(),
            "-- !!! File not found !!! - old/song.mp3"
        );
    }

    #[test]
    fn test_display_text_includes_track_number() {
        let mut track = TrackDescriptor::stream(stream_url(), "Jazz Radio");
        track.track_number = 4;
        assert_eq!(
            track.display_text(),
            "4. Jazz Radio - http://radio.example.com:8000/live"
        );
    }

    #[test]
    fn test_serialized_source_is_tagged() {
        let track = TrackDescriptor::missing("a.mp3");
        let json = serde_json::to_value(&track).unwrap();
        assert_eq!(json["source"]["kind"], "missing");
        assert_eq!(json["source"]["location"], "a.mp3");
    }
}
