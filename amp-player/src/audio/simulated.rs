//! Clock-driven backend that produces no sound
//!
//! Sources advance their position with the tokio clock while playing,
//! which is enough to exercise the engine, the poller and the control
//! surface on machines without an output device.

use crate::audio::probe::probe_metadata;
use crate::error::{Error, Result};
use crate::playback::backend::{AudioBackend, AudioSource};
use amp_common::TransportState;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

/// Backend whose sources only keep time
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    stream_probe_timeout: Duration,
}

impl SimulatedBackend {
    pub fn new(stream_probe_timeout: Duration) -> Self {
        Self {
            stream_probe_timeout,
        }
    }
}

impl AudioBackend for SimulatedBackend {
    fn open_file(&self, path: &Path) -> Result<Box<dyn AudioSource>> {
        let metadata = probe_metadata(path)
            .map_err(|e| Error::Backend(format!("Cannot open {}: {}", path.display(), e)))?;
        debug!("Simulated open of {} ({:?})", path.display(), metadata.duration);
        Ok(Box::new(SimulatedSource::new(metadata.duration, true)))
    }

    fn open_stream(&self, uri: &Url) -> Result<Box<dyn AudioSource>> {
        // Runs on the blocking pool, so the blocking client is safe to build here
        let client = reqwest::blocking::Client::builder()
            .timeout(self.stream_probe_timeout)
            .build()
            .map_err(|e| Error::Backend(format!("HTTP client: {}", e)))?;

        let response = client
            .get(uri.as_str())
            .send()
            .map_err(|e| Error::Backend(format!("{}: {}", uri, e)))?;
        if !response.status().is_success() {
            return Err(Error::Backend(format!("{}: HTTP {}", uri, response.status())));
        }

        debug!("Simulated stream {} reachable", uri);
        Ok(Box::new(SimulatedSource::new(None, false)))
    }
}

/// Position bookkeeping for one simulated reader
#[derive(Debug)]
pub struct SimulatedSource {
    anchor: Option<Instant>,
    offset: Duration,
    total: Option<Duration>,
    seekable: bool,
    volume: f32,
    state: TransportState,
}

impl SimulatedSource {
    pub fn new(total: Option<Duration>, seekable: bool) -> Self {
        Self {
            anchor: None,
            offset: Duration::ZERO,
            total,
            seekable,
            volume: 1.0,
            state: TransportState::Stopped,
        }
    }

    fn clamp(&self, position: Duration) -> Duration {
        self.total.map_or(position, |total| position.min(total))
    }
}

impl AudioSource for SimulatedSource {
    fn play(&mut self) -> Result<()> {
        if self.state != TransportState::Playing {
            self.anchor = Some(Instant::now());
            self.state = TransportState::Playing;
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.offset = self.position();
        self.anchor = None;
        self.state = TransportState::Paused;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.offset = Duration::ZERO;
        self.anchor = None;
        self.state = TransportState::Stopped;
        Ok(())
    }

    fn position(&self) -> Duration {
        let running = self.anchor.map_or(Duration::ZERO, |anchor| anchor.elapsed());
        self.clamp(self.offset + running)
    }

    fn total_duration(&self) -> Option<Duration> {
        self.total
    }

    fn can_seek(&self) -> bool {
        self.seekable
    }

    fn seek(&mut self, to: Duration) -> Result<()> {
        if !self.seekable {
            return Err(Error::Backend("source is not seekable".to_string()));
        }
        self.offset = self.clamp(to);
        if self.anchor.is_some() {
            self.anchor = Some(Instant::now());
        }
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn playback_state(&self) -> TransportState {
        self.state
    }
}
