//! Playback engine
//!
//! **Module Structure:**
//! - `core.rs`: shared engine state, the session lock, fade slot and stop tracking
//! - `transport.rs`: change song, play, pause, stop, seek, volume and fades
//! - `poller.rs`: position polling and end-of-track detection

mod core;
mod poller;
mod transport;

use self::core::EngineInner;
use crate::config::EngineSettings;
use crate::playback::backend::AudioBackend;
use amp_common::events::{AmpEvent, EventBus};
use amp_common::{TrackDescriptor, TransportState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Drives one bound audio source through play, pause, stop and seek
///
/// Cheap to clone; clones share the same engine. Every operation takes
/// `&self` and may be called from any task.
#[derive(Clone)]
pub struct PlaybackEngine {
    inner: Arc<EngineInner>,
}

impl PlaybackEngine {
    pub fn new(backend: Arc<dyn AudioBackend>, settings: EngineSettings, events: EventBus) -> Self {
        Self {
            inner: Arc::new(EngineInner::new(backend, settings.normalized(), events)),
        }
    }

    /// Subscribe to engine (and shared bus) events
    pub fn subscribe(&self) -> broadcast::Receiver<AmpEvent> {
        self.inner.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    pub fn state(&self) -> TransportState {
        self.inner.session().state
    }

    /// Descriptor most recently handed to `change_song`
    pub fn current_track(&self) -> Option<TrackDescriptor> {
        self.inner.session().current.clone()
    }

    pub fn is_bound(&self) -> bool {
        self.inner.session().binding.is_some()
    }

    /// Position of the bound reader, or the saved resume position while paused
    pub fn position(&self) -> Duration {
        let session = self.inner.session();
        if let Some(saved) = session.paused_position {
            return saved;
        }
        session
            .binding
            .as_ref()
            .map(|binding| binding.position())
            .unwrap_or_default()
    }

    /// Total length reported by the bound reader
    pub fn duration(&self) -> Option<Duration> {
        self.inner
            .session()
            .binding
            .as_ref()
            .and_then(|binding| binding.total_duration())
    }

    /// Remembered target volume
    pub fn volume(&self) -> f32 {
        self.inner.session().volume
    }

    /// True while a stop (and its fade-out) is still unwinding
    pub fn is_transitioning(&self) -> bool {
        *self.inner.stopping.borrow() > 0
    }

    /// True while a position poller is running
    pub fn is_polling(&self) -> bool {
        self.inner.session().poller.is_some()
    }
}
