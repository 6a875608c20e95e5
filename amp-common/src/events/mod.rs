//! Event types for the MusicAmp event system
//!
//! Provides shared event definitions and the EventBus used by the playlist
//! store, the playback engine and the control surface.

mod playback_types;
mod playlist_types;

pub use playback_types::TransportState;
pub use playlist_types::PlaylistChange;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// MusicAmp event types
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AmpEvent {
    /// Playback position update
    ///
    /// Emitted on every poller tick while playing and immediately after a seek.
    PositionChanged {
        /// Position reported by the bound reader (milliseconds)
        position_ms: u64,
        /// Total length of the bound reader, if known (milliseconds)
        duration_ms: Option<u64>,
        timestamp: DateTime<Utc>,
    },

    /// A song was bound (or could not be) and transport controls may be enabled
    Playable {
        playable: bool,
        timestamp: DateTime<Utc>,
    },

    /// Playback failure
    ///
    /// `recoverable` failures (stream open exhausted its retries) leave the
    /// engine unbound; the host should disable transport controls but stay up.
    PlaybackError {
        recoverable: bool,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// The bound local file played to its end
    ///
    /// Triggers:
    /// - Controller: advance to the next playlist entry
    EndOfTrack {
        /// Track number the engine was playing, if it came from a playlist
        track_number: Option<u32>,
        timestamp: DateTime<Utc>,
    },

    /// Transport state changed
    TransportStateChanged {
        old_state: TransportState,
        new_state: TransportState,
        timestamp: DateTime<Utc>,
    },

    /// Target output volume changed (0.0-1.0)
    VolumeChanged {
        volume: f32,
        timestamp: DateTime<Utc>,
    },

    /// Structural playlist change
    PlaylistChanged {
        change: PlaylistChange,
        timestamp: DateTime<Utc>,
    },

    /// Playlist length after a mutation
    PlaylistCountChanged {
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Controller selected a different playlist entry
    NowPlayingChanged {
        track_number: Option<u32>,
        timestamp: DateTime<Utc>,
    },
}

impl AmpEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            AmpEvent::PositionChanged { .. } => "PositionChanged",
            AmpEvent::Playable { .. } => "Playable",
            AmpEvent::PlaybackError { .. } => "PlaybackError",
            AmpEvent::EndOfTrack { .. } => "EndOfTrack",
            AmpEvent::TransportStateChanged { .. } => "TransportStateChanged",
            AmpEvent::VolumeChanged { .. } => "VolumeChanged",
            AmpEvent::PlaylistChanged { .. } => "PlaylistChanged",
            AmpEvent::PlaylistCountChanged { .. } => "PlaylistCountChanged",
            AmpEvent::NowPlayingChanged { .. } => "NowPlayingChanged",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Unsubscribe by dropping the receiver
/// - Lagged message detection for slow subscribers
///
/// Cloning the bus shares the underlying channel.
///
/// # Examples
///
/// ```
/// use amp_common::events::{AmpEvent, EventBus};
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(AmpEvent::Playable {
///     playable: true,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(AmpEvent::Playable { playable: true, .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AmpEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received. Dropping the
    /// receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<AmpEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: AmpEvent) -> Result<usize, broadcast::error::SendError<AmpEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: AmpEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
