//! Playback-related type definitions

use serde::{Deserialize, Serialize};

/// Transport state of the playback engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    /// Nothing is playing; the binding (if any) is at its start
    #[default]
    Stopped,
    /// Output running
    Playing,
    /// Output halted, resumable
    Paused,
}

impl TransportState {
    /// Playing or paused, i.e. a fade-out is meaningful before teardown
    pub fn is_active(&self) -> bool {
        matches!(self, TransportState::Playing | TransportState::Paused)
    }
}

impl std::fmt::Display for TransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportState::Stopped => write!(f, "stopped"),
            TransportState::Playing => write!(f, "playing"),
            TransportState::Paused => write!(f, "paused"),
        }
    }
}
