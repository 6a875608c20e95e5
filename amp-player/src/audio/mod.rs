//! Audio file inspection and the simulated backend

pub mod probe;
pub mod simulated;

pub use probe::{is_audio_file, probe_metadata, probe_track, ProbedMetadata};
pub use simulated::SimulatedBackend;
