//! # MusicAmp Player Library (amp-player)
//!
//! Playback engine and playlist management.
//!
//! **Purpose:** Bind one local file or network stream at a time through an
//! [`playback::AudioBackend`], drive it through play/pause/stop/seek with
//! stepped volume fades, keep an ordered playlist that persists to M3U, and
//! expose all of it over HTTP/SSE.
//!
//! **Architecture:** the controller owns the playlist and hands descriptors
//! to the engine; engine and playlist publish on one shared event bus.

pub mod api;
pub mod audio;
pub mod config;
pub mod controller;
pub mod error;
pub mod playback;
pub mod playlist;

pub use controller::PlayerController;
pub use error::{Error, Result};
