//! Test helper modules for amp-player integration tests
//!
//! - MockBackend: scripted AudioBackend whose sources only keep time
//! - audio_generator: WAV fixtures for metadata probing
//! - small builders for engines, controllers and descriptors

#![allow(dead_code)]

pub mod audio_generator;

use amp_common::events::{AmpEvent, EventBus};
use amp_common::{TrackDescriptor, TransportState};
use amp_player::audio::simulated::SimulatedSource;
use amp_player::config::{EngineSettings, LibrarySettings};
use amp_player::playback::{AudioBackend, AudioSource, PlaybackEngine};
use amp_player::{Error, PlayerController, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use url::Url;

pub use audio_generator::generate_silent_wav;

/// How stream opens behave
#[derive(Debug, Clone, Copy)]
pub enum StreamScript {
    /// Every open succeeds
    Succeed,
    /// The first `n` opens fail, later ones succeed
    FailFirst(u32),
    /// Every open fails
    AlwaysFail,
    /// Every open blocks its thread this long, then fails
    Hang(Duration),
}

#[derive(Debug)]
struct MockState {
    file_duration: Duration,
    stream_script: StreamScript,
    stream_opens: u32,
    file_opens: u32,
    sources: Vec<Arc<Mutex<SimulatedSource>>>,
}

/// Scripted backend recording every source it hands out
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new(file_duration: Duration, stream_script: StreamScript) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                file_duration,
                stream_script,
                stream_opens: 0,
                file_opens: 0,
                sources: Vec::new(),
            })),
        }
    }

    pub fn stream_opens(&self) -> u32 {
        self.state.lock().unwrap().stream_opens
    }

    pub fn file_opens(&self) -> u32 {
        self.state.lock().unwrap().file_opens
    }

    /// Most recently opened source
    pub fn last_source(&self) -> Option<Arc<Mutex<SimulatedSource>>> {
        self.state.lock().unwrap().sources.last().cloned()
    }

    pub fn last_volume(&self) -> Option<f32> {
        self.last_source().map(|s| s.lock().unwrap().volume())
    }

    pub fn last_position(&self) -> Option<Duration> {
        self.last_source().map(|s| s.lock().unwrap().position())
    }

    pub fn last_state(&self) -> Option<TransportState> {
        self.last_source().map(|s| s.lock().unwrap().playback_state())
    }

    fn hand_out(&self, source: SimulatedSource) -> Box<dyn AudioSource> {
        let shared = Arc::new(Mutex::new(source));
        self.state.lock().unwrap().sources.push(Arc::clone(&shared));
        Box::new(MockSource { shared })
    }
}

impl AudioBackend for MockBackend {
    fn open_file(&self, path: &Path) -> Result<Box<dyn AudioSource>> {
        let duration = {
            let mut state = self.state.lock().unwrap();
            state.file_opens += 1;
            state.file_duration
        };
        if !path.exists() {
            return Err(Error::Backend(format!("no such file {}", path.display())));
        }
        Ok(self.hand_out(SimulatedSource::new(Some(duration), true)))
    }

    fn open_stream(&self, uri: &Url) -> Result<Box<dyn AudioSource>> {
        let script = {
            let mut state = self.state.lock().unwrap();
            state.stream_opens += 1;
            state.stream_script
        };
        let fail = match script {
            StreamScript::Succeed => false,
            StreamScript::FailFirst(n) => self.stream_opens() <= n,
            StreamScript::AlwaysFail => true,
            StreamScript::Hang(delay) => {
                std::thread::sleep(delay);
                true
            }
        };
        if fail {
            return Err(Error::Backend(format!("connection refused: {}", uri)));
        }
        Ok(self.hand_out(SimulatedSource::new(None, false)))
    }
}

struct MockSource {
    shared: Arc<Mutex<SimulatedSource>>,
}

impl AudioSource for MockSource {
    fn play(&mut self) -> Result<()> {
        self.shared.lock().unwrap().play()
    }

    fn pause(&mut self) -> Result<()> {
        self.shared.lock().unwrap().pause()
    }

    fn stop(&mut self) -> Result<()> {
        self.shared.lock().unwrap().stop()
    }

    fn position(&self) -> Duration {
        self.shared.lock().unwrap().position()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.shared.lock().unwrap().total_duration()
    }

    fn can_seek(&self) -> bool {
        self.shared.lock().unwrap().can_seek()
    }

    fn seek(&mut self, to: Duration) -> Result<()> {
        self.shared.lock().unwrap().seek(to)
    }

    fn volume(&self) -> f32 {
        self.shared.lock().unwrap().volume()
    }

    fn set_volume(&mut self, volume: f32) {
        self.shared.lock().unwrap().set_volume(volume)
    }

    fn playback_state(&self) -> TransportState {
        self.shared.lock().unwrap().playback_state()
    }
}

/// Engine over `backend` with default settings
pub fn engine_with(backend: &MockBackend) -> PlaybackEngine {
    engine_with_settings(backend, EngineSettings::default())
}

pub fn engine_with_settings(backend: &MockBackend, settings: EngineSettings) -> PlaybackEngine {
    PlaybackEngine::new(Arc::new(backend.clone()), settings, EventBus::new(1024))
}

pub fn controller_with(backend: &MockBackend) -> Arc<PlayerController> {
    Arc::new(PlayerController::new(
        engine_with(backend),
        LibrarySettings::default(),
    ))
}

/// Create an (empty) file under `dir` and describe it as a local track
pub fn local_track(dir: &Path, name: &str, title: &str) -> TrackDescriptor {
    let path = touch(dir, name);
    TrackDescriptor::local(&path, title, "Test Artist", "Test Album", 180).unwrap()
}

pub fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"").unwrap();
    path
}

pub fn stream_track(title: &str) -> TrackDescriptor {
    TrackDescriptor::stream(Url::parse("http://radio.example.com:8000/live").unwrap(), title)
}

/// Everything currently queued on `rx`
pub fn drain(rx: &mut broadcast::Receiver<AmpEvent>) -> Vec<AmpEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn count_positions(events: &[AmpEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, AmpEvent::PositionChanged { .. }))
        .count()
}
