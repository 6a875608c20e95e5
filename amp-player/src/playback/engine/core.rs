//! Core engine state
//!
//! All mutable playback state lives in one [`Session`] behind a std mutex.
//! The lock is only ever held for short synchronous sections and never
//! across an await point.

use super::poller::PollerHandle;
use crate::config::EngineSettings;
use crate::playback::backend::{AudioBackend, AudioSource};
use crate::playback::clock::PositionClock;
use amp_common::events::EventBus;
use amp_common::{TrackDescriptor, TransportState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Mutable playback state guarded by the session lock
pub(super) struct Session {
    /// Descriptor handed to the last `change_song`
    pub(super) current: Option<TrackDescriptor>,
    /// Opened reader for `current`, if bound
    pub(super) binding: Option<Box<dyn AudioSource>>,
    pub(super) state: TransportState,
    /// Resume position captured at pause (local files only)
    pub(super) paused_position: Option<Duration>,
    /// Remembered target volume
    pub(super) volume: f32,
    /// A stream open for `current` is still retrying
    pub(super) binding_in_flight: bool,
    /// Set by natural end-of-track; the next song change starts playing
    pub(super) resume_after_change: bool,
    /// Bumped by every song change; stale binds and pollers compare against it
    pub(super) generation: u64,
    pub(super) poller: Option<PollerHandle>,
    pub(super) clock: PositionClock,
}

impl Session {
    fn new(volume: f32) -> Self {
        Self {
            current: None,
            binding: None,
            state: TransportState::Stopped,
            paused_position: None,
            volume,
            binding_in_flight: false,
            resume_after_change: false,
            generation: 0,
            poller: None,
            clock: PositionClock::new(),
        }
    }

    /// Cancel the poller; it observes the token under this lock, so no
    /// further position events follow
    pub(super) fn cancel_poller(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
    }

    pub(super) fn is_local(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|track| track.local_path().is_some())
    }
}

/// The fade currently allowed to touch the output volume
pub(super) struct ActiveFade {
    id: u64,
    token: CancellationToken,
    done: watch::Receiver<bool>,
}

/// Held by a running fade; releases the fade slot when dropped
pub(super) struct FadeTicket<'a> {
    inner: &'a EngineInner,
    id: u64,
    pub(super) token: CancellationToken,
    done: watch::Sender<bool>,
}

impl Drop for FadeTicket<'_> {
    fn drop(&mut self) {
        let _ = self.done.send(true);
        let mut slot = self.inner.fade_slot();
        if slot.as_ref().is_some_and(|active| active.id == self.id) {
            *slot = None;
        }
    }
}

/// Counts an in-flight stop for as long as it lives
pub(super) struct StoppingGuard<'a> {
    stopping: &'a watch::Sender<usize>,
}

impl<'a> StoppingGuard<'a> {
    pub(super) fn engage(stopping: &'a watch::Sender<usize>) -> Self {
        stopping.send_modify(|count| *count += 1);
        Self { stopping }
    }
}

impl Drop for StoppingGuard<'_> {
    fn drop(&mut self) {
        self.stopping
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}

pub(crate) struct EngineInner {
    pub(super) backend: Arc<dyn AudioBackend>,
    pub(super) settings: EngineSettings,
    pub(super) events: EventBus,
    session: Mutex<Session>,
    fade: Mutex<Option<ActiveFade>>,
    next_fade_id: AtomicU64,
    /// Number of stops still unwinding (the transitioning condition)
    pub(super) stopping: watch::Sender<usize>,
}

impl EngineInner {
    pub(super) fn new(backend: Arc<dyn AudioBackend>, settings: EngineSettings, events: EventBus) -> Self {
        let (stopping, _) = watch::channel(0);
        Self {
            backend,
            session: Mutex::new(Session::new(settings.initial_volume)),
            settings,
            events,
            fade: Mutex::new(None),
            next_fade_id: AtomicU64::new(1),
            stopping,
        }
    }

    pub(super) fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fade_slot(&self) -> MutexGuard<'_, Option<ActiveFade>> {
        self.fade.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn fade_active(&self) -> bool {
        self.fade_slot().is_some()
    }

    /// Claim the fade slot, cancelling and awaiting any fade already in it
    pub(super) async fn begin_fade(&self) -> FadeTicket<'_> {
        loop {
            let previous = {
                let mut slot = self.fade_slot();
                match slot.take() {
                    Some(previous) => previous,
                    None => {
                        let id = self.next_fade_id.fetch_add(1, Ordering::Relaxed);
                        let token = CancellationToken::new();
                        let (done_tx, done_rx) = watch::channel(false);
                        *slot = Some(ActiveFade {
                            id,
                            token: token.clone(),
                            done: done_rx,
                        });
                        return FadeTicket {
                            inner: self,
                            id,
                            token,
                            done: done_tx,
                        };
                    }
                }
            };

            previous.token.cancel();
            wait_done(previous.done).await;
        }
    }

    /// Cancel the running fade (if any) and wait until it has stopped stepping
    pub(super) async fn cancel_fade(&self) {
        let previous = self.fade_slot().take();
        if let Some(previous) = previous {
            previous.token.cancel();
            wait_done(previous.done).await;
        }
    }
}

async fn wait_done(mut done: watch::Receiver<bool>) {
    // A dropped sender also means the fade is gone
    let _ = done.wait_for(|finished| *finished).await;
}
