//! Playback: backend capability, engine, fades and position tracking

pub mod backend;
pub mod clock;
pub mod engine;
pub mod fader;

pub use backend::{AudioBackend, AudioSource};
pub use engine::PlaybackEngine;
pub use fader::{FadeOutcome, FadeRamp, StopFade};
