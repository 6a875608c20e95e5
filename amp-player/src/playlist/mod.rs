//! Playlist storage and M3U persistence

pub mod codec;
pub mod store;

pub use codec::{M3U_HEADER, EXTINF_PREFIX};
pub use store::PlaylistStore;
