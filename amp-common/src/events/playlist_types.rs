//! Playlist change notifications

use crate::track::TrackDescriptor;
use serde::{Deserialize, Serialize};

/// Structural change applied to a playlist
///
/// Indices are 0-based positions in the ordered playlist (track number - 1).
/// Each variant carries enough to replay the change on a mirrored list;
/// `Reset` means "re-read everything".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaylistChange {
    /// Item appended at `index`
    Added {
        index: usize,
        item: TrackDescriptor,
    },
    /// Item at `index` replaced in place
    Replaced {
        index: usize,
        old: TrackDescriptor,
        new: TrackDescriptor,
    },
    /// Item relocated from `from` to `to`; everything between shifted by one
    Moved {
        from: usize,
        to: usize,
        item: TrackDescriptor,
    },
    /// Contents replaced wholesale (remove, shuffle, clear, load)
    Reset,
}

impl PlaylistChange {
    pub fn kind(&self) -> &'static str {
        match self {
            PlaylistChange::Added { .. } => "added",
            PlaylistChange::Replaced { .. } => "replaced",
            PlaylistChange::Moved { .. } => "moved",
            PlaylistChange::Reset => "reset",
        }
    }
}
