//! # MusicAmp Common Library
//!
//! Shared code for the MusicAmp crates including:
//! - Track descriptors (playlist entries)
//! - Event types (AmpEvent enum) and the EventBus
//! - Fade curve definitions and calculations
//! - Track time formatting
//! - Configuration file resolution

pub mod config;
pub mod error;
pub mod events;
pub mod fade_curves;
pub mod human_time;
pub mod track;

pub use error::{Error, Result};
pub use events::{AmpEvent, EventBus, PlaylistChange, TransportState};
pub use fade_curves::FadeCurve;
pub use track::{TrackDescriptor, TrackSource, FILE_NOT_FOUND_TITLE};
