//! Configuration for the amp-player service
//!
//! A single TOML file holds every setting; each field has a built-in default
//! so a missing file (or a partial one) still yields a complete config.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--port, --playlist)
//! 2. Environment variables (AMP_PORT, AMP_PLAYLIST, AMP_CONFIG)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::error::{Error, Result};
use amp_common::FadeCurve;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "AMP_CONFIG";

/// Lower bound for the position poller tick
const MIN_POSITION_INTERVAL_MS: u64 = 100;
/// Upper bound for the position poller tick
const MAX_POSITION_INTERVAL_MS: u64 = 5000;

/// Top-level player configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// HTTP server port
    pub port: u16,

    /// Playlist loaded at startup (optional)
    pub playlist: Option<PathBuf>,

    /// Per-subscriber event buffer
    pub event_capacity: usize,

    pub logging: LoggingConfig,

    #[serde(rename = "playback")]
    pub engine: EngineSettings,

    pub library: LibrarySettings,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            port: 5750,
            playlist: None,
            event_capacity: 256,
            logging: LoggingConfig::default(),
            engine: EngineSettings::default(),
            library: LibrarySettings::default(),
        }
    }
}

impl PlayerConfig {
    /// Load from `path`, or fall back to defaults when no file was resolved
    /// or the resolved file does not exist
    ///
    /// A file that exists but does not parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let config: Self = amp_common::config::load_toml(path)
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(config.normalized())
    }

    /// Clamp values that would make the engine misbehave
    pub fn normalized(mut self) -> Self {
        self.engine = self.engine.normalized();
        self.event_capacity = self.event_capacity.max(1);
        self
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset (EnvFilter syntax)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "amp_player=debug,amp_common=info,tower_http=info".to_string(),
        }
    }
}

/// Playback engine tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Remembered target volume before the first explicit volume (0.0-1.0)
    pub initial_volume: f32,
    /// Position poller tick
    pub position_interval_ms: u64,
    /// Interval between fade steps
    pub fade_tick_ms: u64,
    pub fade_in_steps: u32,
    pub pause_fade_steps: u32,
    pub stop_fade_steps: u32,
    /// Fast fade used when a song change interrupts playback
    pub change_fade_steps: u32,
    pub fade_curve: FadeCurve,
    pub stream_open_attempts: u32,
    pub stream_open_timeout_ms: u64,
    /// Longest a song change waits for an in-flight stop
    pub stop_settle_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            initial_volume: 0.2,
            position_interval_ms: 1000,
            fade_tick_ms: 10,
            fade_in_steps: 50,
            pause_fade_steps: 100,
            stop_fade_steps: 250,
            change_fade_steps: 25,
            fade_curve: FadeCurve::Linear,
            stream_open_attempts: 3,
            stream_open_timeout_ms: 2000,
            stop_settle_timeout_ms: 3000,
        }
    }
}

impl EngineSettings {
    pub fn normalized(mut self) -> Self {
        self.initial_volume = self.initial_volume.clamp(0.0, 1.0);
        self.position_interval_ms = self
            .position_interval_ms
            .clamp(MIN_POSITION_INTERVAL_MS, MAX_POSITION_INTERVAL_MS);
        self.fade_tick_ms = self.fade_tick_ms.max(1);
        self.stream_open_attempts = self.stream_open_attempts.max(1);
        self
    }

    pub fn position_interval(&self) -> Duration {
        Duration::from_millis(self.position_interval_ms)
    }

    pub fn fade_tick(&self) -> Duration {
        Duration::from_millis(self.fade_tick_ms)
    }

    pub fn stream_open_timeout(&self) -> Duration {
        Duration::from_millis(self.stream_open_timeout_ms)
    }

    pub fn stop_settle_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_settle_timeout_ms)
    }
}

/// Library import and navigation settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Extensions (without dot, case-insensitive) picked up by folder import
    pub audio_extensions: Vec<String>,
    /// `previous` restarts the current track once it has played this long
    pub previous_restart_threshold_secs: u64,
    /// Reachability check for streams opened by the simulated backend
    pub stream_probe_timeout_ms: u64,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            audio_extensions: vec!["mp3".to_string(), "wav".to_string(), "flac".to_string()],
            previous_restart_threshold_secs: 5,
            stream_probe_timeout_ms: 2000,
        }
    }
}

impl LibrarySettings {
    pub fn previous_restart_threshold(&self) -> Duration {
        Duration::from_secs(self.previous_restart_threshold_secs)
    }

    pub fn stream_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.stream_probe_timeout_ms)
    }
}
