//! Transport operations: song change, play, pause, stop, seek and volume

use super::core::{Session, StoppingGuard};
use super::{poller, PlaybackEngine};
use crate::error::{Error, Result};
use crate::playback::backend::AudioSource;
use crate::playback::fader::{FadeOutcome, FadeRamp, StopFade};
use amp_common::events::AmpEvent;
use amp_common::{TrackDescriptor, TrackSource, TransportState};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};
use url::Url;

/// What must stay true for a fade to keep stepping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadeGuard {
    WhilePlaying,
    WhileBound,
}

impl FadeGuard {
    fn holds(&self, session: &Session) -> bool {
        match self {
            FadeGuard::WhilePlaying => {
                session.binding.is_some() && session.state == TransportState::Playing
            }
            FadeGuard::WhileBound => session.binding.is_some(),
        }
    }
}

impl PlaybackEngine {
    /// Replace the current song
    ///
    /// Waits (bounded) for an in-flight stop to settle, stops anything that
    /// is playing with a fast fade, then binds `track`. When the previous
    /// track ended on its own, playback resumes on the new binding.
    pub async fn change_song(&self, track: TrackDescriptor) -> Result<()> {
        self.wait_for_stop_settle().await;

        let (resume, active) = {
            let mut session = self.inner.session();
            let resume = std::mem::take(&mut session.resume_after_change);
            let active = session.binding.is_some() || session.state != TransportState::Stopped;
            (resume, active)
        };

        if active {
            self.stop_with(StopFade::Fast).await?;
        }

        let generation = {
            let mut session = self.inner.session();
            session.generation += 1;
            session.current = Some(track.clone());
            session.paused_position = None;
            session.binding_in_flight = false;
            session.clock.reset();
            session.generation
        };
        info!("Changing song to #{} {}", track.track_number, track.title);

        let bound = self.bind(generation).await?;
        if bound && resume {
            debug!("Resuming playback after end of track");
            self.play(None).await?;
        }
        Ok(())
    }

    /// Start or resume output, fading in to `volume` (or the remembered volume)
    ///
    /// A no-op with nothing selected or while a stream is still being opened.
    /// While already playing only an explicit volume is applied.
    pub async fn play(&self, volume: Option<f32>) -> Result<()> {
        self.wait_for_stop_settle().await;

        let needs_bind = {
            let mut session = self.inner.session();
            if session.current.is_none() || session.binding_in_flight {
                return Ok(());
            }
            if let Some(volume) = volume {
                session.volume = volume.clamp(0.0, 1.0);
            }

            if session.state == TransportState::Playing {
                if volume.is_some() {
                    let target = session.volume;
                    if let Some(binding) = session.binding.as_mut() {
                        binding.set_volume(target);
                    }
                    self.emit_volume(target);
                }
                return Ok(());
            }
            session.binding.is_none()
        };

        if needs_bind {
            let generation = self.inner.session().generation;
            if !self.bind(generation).await? {
                return Ok(());
            }
        }

        let target = {
            let mut session = self.inner.session();
            if session.state == TransportState::Playing {
                return Ok(());
            }
            let resume_at = if session.is_local() {
                session.paused_position.take()
            } else {
                session.paused_position = None;
                None
            };

            let Some(binding) = session.binding.as_mut() else {
                return Ok(());
            };
            if let Some(at) = resume_at {
                if binding.can_seek() {
                    binding.seek(at)?;
                }
            }
            binding.set_volume(0.0);
            binding.play()?;
            let start_at = resume_at.unwrap_or_else(|| binding.position());

            session.clock.start(start_at);
            self.set_state(&mut session, TransportState::Playing);
            if session.poller.is_none() {
                session.poller = Some(poller::spawn(
                    Arc::downgrade(&self.inner),
                    self.inner.settings.position_interval(),
                ));
            }
            session.volume
        };

        self.fade(0.0, target, self.inner.settings.fade_in_steps, FadeGuard::WhilePlaying)
            .await;
        Ok(())
    }

    /// Fade out and pause; a no-op unless playing
    pub async fn pause(&self) -> Result<()> {
        let from = {
            let mut session = self.inner.session();
            if session.state != TransportState::Playing || self.is_transitioning() {
                return Ok(());
            }
            let Some(binding) = session.binding.as_ref() else {
                return Ok(());
            };
            let (position, from) = (binding.position(), binding.volume());
            if session.is_local() {
                session.paused_position = Some(position);
            }
            from
        };

        let outcome = self
            .fade(from, 0.0, self.inner.settings.pause_fade_steps, FadeGuard::WhilePlaying)
            .await;

        let mut session = self.inner.session();
        if outcome != FadeOutcome::Completed || session.state != TransportState::Playing {
            debug!("Pause abandoned ({:?})", outcome);
            if session.state == TransportState::Playing {
                session.paused_position = None;
            }
            return Ok(());
        }

        if let Some(binding) = session.binding.as_mut() {
            binding.pause()?;
        }
        session.clock.stop();
        session.cancel_poller();
        self.set_state(&mut session, TransportState::Paused);
        Ok(())
    }

    /// Fade out, stop and release the binding
    pub async fn stop(&self) -> Result<()> {
        self.stop_with(StopFade::Full).await
    }

    pub(crate) async fn stop_with(&self, fade: StopFade) -> Result<()> {
        let _stopping = StoppingGuard::engage(&self.inner.stopping);

        let playing = {
            let mut session = self.inner.session();
            session.cancel_poller();
            session.state == TransportState::Playing && session.binding.is_some()
        };
        self.inner.cancel_fade().await;

        let steps = fade.steps(&self.inner.settings);
        if playing && steps > 0 {
            let from = self
                .inner
                .session()
                .binding
                .as_ref()
                .map_or(0.0, |binding| binding.volume());
            self.fade(from, 0.0, steps, FadeGuard::WhileBound).await;
        }

        let mut session = self.inner.session();
        session.cancel_poller();
        if let Some(mut binding) = session.binding.take() {
            if let Err(e) = binding.stop() {
                warn!("Backend stop failed: {}", e);
            }
        }
        session.paused_position = None;
        session.resume_after_change = false;
        session.clock.reset();
        self.set_state(&mut session, TransportState::Stopped);
        Ok(())
    }

    /// Move the bound reader to `position`, clamped to its length
    ///
    /// While paused on a local file only the resume position changes.
    /// A no-op when nothing seekable is bound.
    pub async fn seek(&self, position: Duration) -> Result<()> {
        let mut session = self.inner.session();
        let paused_local = session.state == TransportState::Paused && session.is_local();
        let playing = session.state == TransportState::Playing;
        // A pause fade is in flight and will resume from paused_position
        let pausing = playing && session.is_local() && session.paused_position.is_some();

        let Some(binding) = session.binding.as_mut() else {
            return Ok(());
        };
        if !binding.can_seek() {
            return Ok(());
        }

        let total = binding.total_duration();
        let target = total.map_or(position, |total| position.min(total));
        if !paused_local {
            binding.seek(target)?;
        }

        if paused_local || pausing {
            session.paused_position = Some(target);
        }
        if playing {
            session.clock.start(target);
        }

        debug!("Seek to {:?}", target);
        self.inner.events.emit_lossy(AmpEvent::PositionChanged {
            position_ms: target.as_millis() as u64,
            duration_ms: total.map(|d| d.as_millis() as u64),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Set the remembered target volume, applying it now unless a fade owns the output
    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        let volume = volume.clamp(0.0, 1.0);
        let fading = self.inner.fade_active();

        let mut session = self.inner.session();
        session.volume = volume;
        if session.state == TransportState::Playing && !fading {
            if let Some(binding) = session.binding.as_mut() {
                binding.set_volume(volume);
            }
        }
        self.emit_volume(volume);
        Ok(())
    }

    /// Open a reader for the current descriptor
    ///
    /// Returns `Ok(false)` when there was nothing to bind (missing file,
    /// superseded by a newer song change, or already bound).
    async fn bind(&self, generation: u64) -> Result<bool> {
        let track = {
            let session = self.inner.session();
            if session.generation != generation || session.binding.is_some() {
                return Ok(false);
            }
            match session.current.clone() {
                Some(track) => track,
                None => return Ok(false),
            }
        };

        let opened = match &track.source {
            TrackSource::Missing(raw) => {
                debug!("Not binding missing file {}", raw);
                self.emit_playable(false);
                return Ok(false);
            }
            TrackSource::LocalFile(path) => {
                let backend = Arc::clone(&self.inner.backend);
                let path = path.clone();
                tokio::task::spawn_blocking(move || backend.open_file(&path))
                    .await
                    .map_err(|e| Error::Backend(format!("File open task failed: {}", e)))
                    .and_then(|result| result)
            }
            TrackSource::Stream(uri) => {
                self.inner.session().binding_in_flight = true;
                let opened = self.open_stream_with_retry(uri, generation).await;
                let mut session = self.inner.session();
                if session.generation == generation {
                    session.binding_in_flight = false;
                }
                opened
            }
        };

        let source = match opened {
            Ok(source) => source,
            Err(e) => {
                warn!("Could not bind {}: {}", track.location_text(), e);
                if self.inner.session().generation == generation {
                    self.inner.events.emit_lossy(AmpEvent::PlaybackError {
                        recoverable: true,
                        message: e.to_string(),
                        timestamp: Utc::now(),
                    });
                }
                return Err(e);
            }
        };

        let mut session = self.inner.session();
        if session.generation != generation || session.binding.is_some() {
            debug!("Discarding superseded binding for {}", track.location_text());
            discard(source);
            return Ok(false);
        }
        session.binding = Some(source);
        drop(session);

        self.emit_playable(true);
        Ok(true)
    }

    async fn open_stream_with_retry(&self, uri: &Url, generation: u64) -> Result<Box<dyn AudioSource>> {
        let attempts = self.inner.settings.stream_open_attempts;
        let limit = self.inner.settings.stream_open_timeout();

        for attempt in 1..=attempts {
            let backend = Arc::clone(&self.inner.backend);
            let target = uri.clone();
            let task = tokio::task::spawn_blocking(move || backend.open_stream(&target));

            match timeout(limit, task).await {
                Ok(Ok(Ok(source))) => {
                    info!("Opened stream {} (attempt {})", uri, attempt);
                    return Ok(source);
                }
                Ok(Ok(Err(e))) => warn!("Stream open attempt {}/{} failed: {}", attempt, attempts, e),
                Ok(Err(e)) => warn!("Stream open attempt {}/{} panicked: {}", attempt, attempts, e),
                Err(_) => warn!(
                    "Stream open attempt {}/{} timed out after {:?}",
                    attempt, attempts, limit
                ),
            }

            if self.inner.session().generation != generation {
                break;
            }
        }

        Err(Error::StreamOpen {
            uri: uri.to_string(),
            attempts,
        })
    }

    /// Step the bound source's volume from `from` to `to`
    async fn fade(&self, from: f32, to: f32, steps: u32, guard: FadeGuard) -> FadeOutcome {
        let ticket = self.inner.begin_fade().await;
        let ramp = FadeRamp::new(from, to, steps, self.inner.settings.fade_curve);
        let tick = self.inner.settings.fade_tick();

        if steps == 0 {
            let mut session = self.inner.session();
            if !guard.holds(&session) {
                return FadeOutcome::Aborted;
            }
            if let Some(binding) = session.binding.as_mut() {
                binding.set_volume(ramp.to);
            }
            return FadeOutcome::Completed;
        }

        for step in 1..=steps {
            tokio::select! {
                biased;
                _ = ticket.token.cancelled() => return FadeOutcome::Cancelled,
                _ = sleep(tick) => {}
            }

            let mut session = self.inner.session();
            if !guard.holds(&session) {
                return FadeOutcome::Aborted;
            }
            if let Some(binding) = session.binding.as_mut() {
                binding.set_volume(ramp.volume_at(step));
            }
        }
        FadeOutcome::Completed
    }

    async fn wait_for_stop_settle(&self) {
        let mut stopping = self.inner.stopping.subscribe();
        if *stopping.borrow() == 0 {
            return;
        }

        let limit = self.inner.settings.stop_settle_timeout();
        if timeout(limit, stopping.wait_for(|count| *count == 0)).await.is_err() {
            warn!("Stop did not settle within {:?}, proceeding", limit);
        }
    }

    fn set_state(&self, session: &mut Session, new_state: TransportState) {
        let old_state = session.state;
        if old_state == new_state {
            return;
        }
        session.state = new_state;
        info!("Transport {} -> {}", old_state, new_state);
        self.inner.events.emit_lossy(AmpEvent::TransportStateChanged {
            old_state,
            new_state,
            timestamp: Utc::now(),
        });
    }

    fn emit_playable(&self, playable: bool) {
        self.inner.events.emit_lossy(AmpEvent::Playable {
            playable,
            timestamp: Utc::now(),
        });
    }

    fn emit_volume(&self, volume: f32) {
        self.inner.events.emit_lossy(AmpEvent::VolumeChanged {
            volume,
            timestamp: Utc::now(),
        });
    }
}

fn discard(mut source: Box<dyn AudioSource>) {
    if let Err(e) = source.stop() {
        debug!("Stopping discarded source failed: {}", e);
    }
}
