//! Tag and duration probing with symphonia
//!
//! Only the container headers are read; nothing is decoded.

use crate::error::{Error, Result};
use amp_common::TrackDescriptor;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::{Hint, ProbeResult};
use tracing::debug;

/// Metadata read from a file's headers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbedMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub track_number: Option<u32>,
    pub duration: Option<Duration>,
}

/// True when `path` has one of `extensions` (case-insensitive, no dot)
pub fn is_audio_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
}

/// Read tags and duration from `path`
pub fn probe_metadata(path: &Path) -> Result<ProbedMetadata> {
    let mut probed = open_probe(path)?;
    let mut metadata = ProbedMetadata::default();

    // Tags found ahead of the container (e.g. ID3v2) first, then the container's own
    if let Some(container_meta) = probed.metadata.get() {
        if let Some(revision) = container_meta.current() {
            apply_revision(&mut metadata, revision);
        }
    }
    while !probed.format.metadata().is_latest() {
        let _ = probed.format.metadata().pop();
    }
    if let Some(revision) = probed.format.metadata().current() {
        apply_revision(&mut metadata, revision);
    }

    metadata.duration = probed.format.default_track().and_then(|track| {
        let params = &track.codec_params;
        let frames = params.n_frames?;
        if let Some(time_base) = params.time_base {
            let time = time_base.calc_time(frames);
            return Some(Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac));
        }
        let sample_rate = params.sample_rate.filter(|rate| *rate > 0)?;
        Some(Duration::from_secs_f64(frames as f64 / sample_rate as f64))
    });

    debug!(
        "Probed {}: title={:?} artist={:?} duration={:?}",
        path.display(),
        metadata.title,
        metadata.artist,
        metadata.duration
    );
    Ok(metadata)
}

/// Build a playlist descriptor for a local audio file
///
/// The title falls back to the file stem when the file carries no title tag.
pub fn probe_track(path: &Path) -> Result<TrackDescriptor> {
    let metadata = probe_metadata(path)?;

    let title = if metadata.title.is_empty() {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        metadata.title
    };
    let seconds = metadata
        .duration
        .map(|d| u32::try_from(d.as_secs()).unwrap_or(u32::MAX))
        .unwrap_or(0);

    Ok(TrackDescriptor::local(path, title, metadata.artist, metadata.album, seconds)?)
}

fn open_probe(path: &Path) -> Result<ProbeResult> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::Metadata(format!("{}: {}", path.display(), e)))
}

fn apply_revision(metadata: &mut ProbedMetadata, revision: &MetadataRevision) {
    for tag in revision.tags() {
        let value = tag.value.to_string().trim().to_string();
        if value.is_empty() {
            continue;
        }

        match tag.std_key {
            Some(StandardTagKey::TrackTitle) => set_if_empty(&mut metadata.title, value),
            Some(StandardTagKey::Artist) => set_if_empty(&mut metadata.artist, value),
            Some(StandardTagKey::Album) => set_if_empty(&mut metadata.album, value),
            Some(StandardTagKey::TrackNumber) if metadata.track_number.is_none() => {
                // "3/12" style values keep the leading number
                metadata.track_number = value
                    .split('/')
                    .next()
                    .and_then(|n| n.trim().parse().ok());
            }
            _ => {}
        }
    }
}

fn set_if_empty(target: &mut String, value: String) {
    if target.is_empty() {
        *target = value;
    }
}
