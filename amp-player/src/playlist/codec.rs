//! M3U playlist codec
//!
//! Extended M3U layout:
//!
//! ```text
//! #EXTM3U
//! #EXTINF:<seconds>,<artist> - <title>
//! <path relative to the playlist file, or absolute>
//! #EXTINF:-1,<stream title>
//! http://host/stream
//! ```
//!
//! Decoding is tolerant: malformed entries are dropped and files that no
//! longer exist become "missing" sentinel entries. Only a first line other
//! than the header (after an optional UTF-8 BOM) fails the whole decode.
//! Local files are re-read for their tags; the `#EXTINF` text is used
//! only when the file cannot be read as audio.

use crate::audio::probe::probe_track;
use crate::error::{Error, Result};
use crate::playlist::PlaylistStore;
use amp_common::TrackDescriptor;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

/// First line of every playlist
pub const M3U_HEADER: &str = "#EXTM3U";

/// Prefix of the per-entry directive line
pub const EXTINF_PREFIX: &str = "#EXTINF:";

/// Separator between artist and title in a local entry's directive
const ARTIST_TITLE_SEPARATOR: &str = " - ";

/// Written for streams saved without a title
const STREAM_FALLBACK_TEXT: &str = "--";

/// Parsed `#EXTINF:<duration>,<text>` line
struct Directive<'a> {
    duration: i64,
    text: &'a str,
}

/// Parse playlist text into a new store
///
/// Relative file locations are resolved against `base_dir` (normally the
/// playlist file's own directory) when they do not exist as given.
pub fn decode(text: &str, base_dir: Option<&Path>) -> Result<PlaylistStore> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.lines().map(|line| line.trim_end_matches('\r'));

    match lines.next() {
        Some(first) if first == M3U_HEADER => {}
        _ => {
            return Err(Error::InvalidPlaylist(format!(
                "first line is not {}",
                M3U_HEADER
            )))
        }
    }
    let mut lines = lines.filter(|line| !line.trim().is_empty());

    let mut store = PlaylistStore::new();
    let mut dropped = 0usize;

    while let Some(directive_line) = lines.next() {
        let Some(location) = lines.next() else {
            debug!("Dropping trailing directive without location: {}", directive_line);
            dropped += 1;
            break;
        };

        let Some(directive) = parse_directive(directive_line) else {
            debug!("Dropping malformed entry: {}", directive_line);
            dropped += 1;
            continue;
        };

        let location = location.trim();
        if location.is_empty() {
            dropped += 1;
            continue;
        }

        store.add_item(descriptor_for(&directive, location, base_dir));
    }

    if dropped > 0 {
        warn!("Playlist decode dropped {} malformed entries", dropped);
    }
    Ok(store)
}

/// Render a playlist as M3U text for a file written at `target_path`
///
/// Missing entries are skipped. Local paths are written relative to the
/// target's directory when possible.
pub fn encode(playlist: &PlaylistStore, target_path: &Path) -> String {
    // A bare file name lives in the working directory
    let base = target_path
        .parent()
        .map(|dir| if dir.as_os_str().is_empty() { Path::new(".") } else { dir })
        .and_then(|dir| dir.canonicalize().ok());

    let mut out = String::new();
    out.push_str(M3U_HEADER);
    out.push('\n');

    for item in playlist.iter() {
        if let Some(uri) = item.stream_uri() {
            let title = if item.title.trim().is_empty() {
                STREAM_FALLBACK_TEXT
            } else {
                item.title.as_str()
            };
            out.push_str(&format!("{}-1,{}\n", EXTINF_PREFIX, title));
            out.push_str(uri.as_str());
            out.push('\n');
        } else if let Some(path) = item.local_path() {
            // Decode drops directives with empty text
            let title = if item.title.trim().is_empty() {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .filter(|stem| !stem.trim().is_empty())
                    .unwrap_or_else(|| path.display().to_string())
            } else {
                item.title.clone()
            };
            let text = if item.artist.trim().is_empty() {
                title
            } else {
                format!("{}{}{}", item.artist, ARTIST_TITLE_SEPARATOR, title)
            };
            out.push_str(&format!("{}{},{}\n", EXTINF_PREFIX, item.duration_seconds, text));
            let written = base
                .as_deref()
                .and_then(|base| relative_path(path, base))
                .unwrap_or_else(|| path.to_path_buf());
            out.push_str(&written.to_string_lossy());
            out.push('\n');
        }
    }

    out
}

/// Read and decode a playlist file
pub fn load(path: &Path) -> Result<PlaylistStore> {
    let text = std::fs::read_to_string(path)?;
    let base_dir = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    let store = decode(&text, base_dir)?;
    debug!("Loaded {} entries from {}", store.count(), path.display());
    Ok(store)
}

/// Encode a playlist and write it to `path`
pub fn save(playlist: &PlaylistStore, path: &Path) -> Result<()> {
    let text = encode(playlist, path);
    std::fs::write(path, text)?;
    debug!("Saved {} entries to {}", playlist.count(), path.display());
    Ok(())
}

fn parse_directive(line: &str) -> Option<Directive<'_>> {
    let (head, text) = line.split_once(',')?;

    // `#EXTINF:<duration>` is exactly two colon-separated fields
    let mut fields = head.split(':');
    let (tag, duration, extra) = (fields.next()?, fields.next()?, fields.next());
    if extra.is_some() || format!("{}:", tag) != EXTINF_PREFIX {
        return None;
    }

    let duration: i64 = duration.trim().parse().ok()?;
    if duration < -1 {
        return None;
    }

    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    Some(Directive { duration, text })
}

fn descriptor_for(directive: &Directive<'_>, location: &str, base_dir: Option<&Path>) -> TrackDescriptor {
    if let Ok(uri) = Url::parse(location) {
        if uri.scheme().to_ascii_lowercase().starts_with("http") {
            return TrackDescriptor::stream(uri, directive.text);
        }
    }

    let Some(path) = resolve_file(location, base_dir) else {
        debug!("Playlist entry not found: {}", location);
        return TrackDescriptor::missing(location);
    };

    // Tags win; the directive only describes files that cannot be read as audio
    match probe_track(&path) {
        Ok(mut track) => {
            if track.duration_seconds == 0 {
                track.duration_seconds = u32::try_from(directive.duration.max(0)).unwrap_or(u32::MAX);
            }
            return track;
        }
        Err(e) => debug!("Using playlist text for {}: {}", path.display(), e),
    }

    let (artist, title) = match directive.text.split_once(ARTIST_TITLE_SEPARATOR) {
        Some((artist, title)) => (artist.trim(), title.trim()),
        None => ("", directive.text),
    };
    let duration = u32::try_from(directive.duration.max(0)).unwrap_or(u32::MAX);

    TrackDescriptor::local(&path, title, artist, "", duration)
        .unwrap_or_else(|_| TrackDescriptor::missing(location))
}

fn resolve_file(location: &str, base_dir: Option<&Path>) -> Option<PathBuf> {
    let as_given = PathBuf::from(location);
    if as_given.is_file() {
        return Some(as_given);
    }
    if as_given.is_absolute() {
        return None;
    }

    let relative = base_dir?.join(&as_given);
    relative.is_file().then_some(relative)
}

/// Path of `path` relative to directory `base`, if both are absolute and share a root
fn relative_path(path: &Path, base: &Path) -> Option<PathBuf> {
    if !path.is_absolute() || !base.is_absolute() {
        return None;
    }

    let path_parts: Vec<Component<'_>> = path.components().collect();
    let base_parts: Vec<Component<'_>> = base.components().collect();

    // Different drive/root prefixes have no relative form
    if path_parts.first() != base_parts.first() {
        return None;
    }

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part.as_os_str());
    }
    Some(relative)
}
