//! Player controller
//!
//! Connects the playlist to the engine: chooses which entry to play,
//! advances at end of track, and keeps the now-playing selection pointing
//! at the same entry while the playlist is edited.

use crate::audio::probe::{is_audio_file, probe_track};
use crate::config::LibrarySettings;
use crate::error::{Error, Result};
use crate::playback::PlaybackEngine;
use crate::playlist::{codec, PlaylistStore};
use amp_common::events::AmpEvent;
use amp_common::{TrackDescriptor, TransportState};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;
use walkdir::WalkDir;

/// Playlist contents as served to clients
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistSnapshot {
    pub items: Vec<TrackDescriptor>,
    pub now_playing: Option<u32>,
    pub path: Option<PathBuf>,
}

/// Transport status as served to clients
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackStatus {
    pub state: TransportState,
    pub now_playing: Option<u32>,
    pub track: Option<TrackDescriptor>,
    pub bound: bool,
    pub position_ms: u64,
    pub duration_ms: Option<u64>,
    pub volume: f32,
}

pub struct PlayerController {
    engine: PlaybackEngine,
    playlist: Arc<RwLock<PlaylistStore>>,
    now_playing: Mutex<Option<u32>>,
    playlist_path: Mutex<Option<PathBuf>>,
    library: LibrarySettings,
}

impl PlayerController {
    /// Controller with an empty playlist publishing on the engine's bus
    pub fn new(engine: PlaybackEngine, library: LibrarySettings) -> Self {
        let store = PlaylistStore::with_events(engine.events().clone());
        Self {
            engine,
            playlist: Arc::new(RwLock::new(store)),
            now_playing: Mutex::new(None),
            playlist_path: Mutex::new(None),
            library,
        }
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn playlist(&self) -> Arc<RwLock<PlaylistStore>> {
        Arc::clone(&self.playlist)
    }

    pub fn now_playing(&self) -> Option<u32> {
        *lock(&self.now_playing)
    }

    pub fn playlist_path(&self) -> Option<PathBuf> {
        lock(&self.playlist_path).clone()
    }

    // ========================================
    // Transport
    // ========================================

    /// Select entry `track_number` and bind it, resuming if something was playing
    pub async fn select(&self, track_number: u32) -> Result<()> {
        let resume = self.engine.state() == TransportState::Playing;
        self.switch_to(track_number, resume).await
    }

    /// Step to the next playable entry; `None` at the end of the list
    pub async fn next(&self) -> Result<Option<u32>> {
        let target = self.playlist.read().await.next_playable(self.now_playing());
        let Some(target) = target else {
            debug!("Next: end of playlist");
            return Ok(None);
        };

        let resume = self.engine.state() == TransportState::Playing;
        self.switch_to(target, resume).await?;
        Ok(Some(target))
    }

    /// Restart the current local track if it has played past the threshold,
    /// otherwise step to the previous playable entry
    pub async fn previous(&self) -> Result<Option<u32>> {
        let current = self.now_playing();
        let is_local = self
            .engine
            .current_track()
            .is_some_and(|track| track.local_path().is_some());

        if is_local
            && self.engine.is_bound()
            && self.engine.position() >= self.library.previous_restart_threshold()
        {
            debug!("Previous: restarting current track");
            self.engine.seek(Duration::ZERO).await?;
            return Ok(current);
        }

        let target = match current {
            Some(current) => self.playlist.read().await.previous_playable(current),
            None => None,
        };
        let Some(target) = target else {
            return Ok(None);
        };

        let resume = self.engine.state() == TransportState::Playing;
        self.switch_to(target, resume).await?;
        Ok(Some(target))
    }

    /// Play, selecting the first playable entry when nothing is selected yet
    pub async fn play(&self, volume: Option<f32>) -> Result<()> {
        if self.engine.current_track().is_none() {
            let first = self.playlist.read().await.next_playable(None);
            match first {
                Some(first) => self.switch_to(first, false).await?,
                None => return Ok(()),
            }
        }
        self.engine.play(volume).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.engine.pause().await
    }

    pub async fn stop(&self) -> Result<()> {
        self.engine.stop().await
    }

    pub async fn seek(&self, position: Duration) -> Result<()> {
        self.engine.seek(position).await
    }

    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        self.engine.set_volume(volume).await
    }

    /// Advance after the engine reported the end of the bound track
    ///
    /// The engine resumes on its own once the next entry is bound; at the
    /// end of the list playback stops.
    pub async fn handle_end_of_track(&self) -> Result<()> {
        let target = self.playlist.read().await.next_playable(self.now_playing());
        match target {
            Some(target) => {
                info!("Advancing to #{}", target);
                self.switch_to(target, false).await
            }
            None => {
                info!("End of playlist");
                self.engine.stop().await
            }
        }
    }

    /// React to engine events until the bus closes
    pub fn spawn_event_loop(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        let mut rx = self.engine.subscribe();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(AmpEvent::EndOfTrack { .. }) => {
                        if let Err(e) = controller.handle_end_of_track().await {
                            warn!("Advancing after end of track failed: {}", e);
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Controller event loop lagged, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Controller event loop exited");
        })
    }

    async fn switch_to(&self, track_number: u32, resume: bool) -> Result<()> {
        let track = self
            .playlist
            .read()
            .await
            .get_item(track_number)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("track {}", track_number)))?;
        if track.is_missing() {
            return Err(Error::NotFound(format!(
                "file not found: {}",
                track.location_text()
            )));
        }

        self.set_now_playing(Some(track_number));
        self.engine.change_song(track).await?;
        if resume {
            self.engine.play(None).await?;
        }
        Ok(())
    }

    // ========================================
    // Playlist editing
    // ========================================

    /// Probe and append one audio file
    pub async fn add_file(&self, path: &Path) -> Result<u32> {
        let path = path.to_path_buf();
        let track = tokio::task::spawn_blocking(move || probe_track(&path))
            .await
            .map_err(|e| Error::Metadata(format!("probe task failed: {}", e)))??;
        Ok(self.playlist.write().await.add_item(track))
    }

    /// Append every audio file under `dir` (recursive, sorted by path)
    ///
    /// Files that cannot be probed are skipped with a warning.
    pub async fn add_folder(&self, dir: &Path) -> Result<Vec<u32>> {
        if !dir.is_dir() {
            return Err(Error::NotFound(dir.display().to_string()));
        }

        let dir = dir.to_path_buf();
        let extensions = self.library.audio_extensions.clone();
        let tracks = tokio::task::spawn_blocking(move || scan_folder(&dir, &extensions))
            .await
            .map_err(|e| Error::Metadata(format!("folder scan failed: {}", e)))?;

        let mut playlist = self.playlist.write().await;
        Ok(tracks
            .into_iter()
            .map(|track| playlist.add_item(track))
            .collect())
    }

    /// Append a network stream; only http(s) URIs are accepted
    pub async fn add_stream(&self, uri: &str, title: Option<String>) -> Result<u32> {
        let uri = Url::parse(uri.trim())
            .map_err(|e| Error::Playlist(format!("invalid stream URI {}: {}", uri, e)))?;
        if !uri.scheme().to_ascii_lowercase().starts_with("http") {
            return Err(Error::Playlist(format!("not an http stream: {}", uri)));
        }

        let title = title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| uri.to_string());
        let track = TrackDescriptor::stream(uri, title);
        Ok(self.playlist.write().await.add_item(track))
    }

    pub async fn remove(&self, track_number: u32) -> Result<()> {
        if !self.playlist.write().await.remove_item(track_number) {
            return Err(Error::NotFound(format!("track {}", track_number)));
        }

        self.adjust_now_playing(|now| match now {
            n if n == track_number => None,
            n if n > track_number => Some(n - 1),
            n => Some(n),
        });
        Ok(())
    }

    pub async fn move_item(&self, from: u32, to: u32) -> Result<()> {
        if !self.playlist.write().await.move_item(from, to) {
            return Err(Error::NotFound(format!("track {} or {}", from, to)));
        }

        self.adjust_now_playing(|now| {
            Some(if now == from {
                to
            } else if from < now && now <= to {
                now - 1
            } else if to <= now && now < from {
                now + 1
            } else {
                now
            })
        });
        Ok(())
    }

    pub async fn swap(&self, a: u32, b: u32) -> Result<()> {
        if !self.playlist.write().await.swap_items(a, b) {
            return Err(Error::NotFound(format!("track {} or {}", a, b)));
        }

        self.adjust_now_playing(|now| {
            Some(match now {
                n if n == a => b,
                n if n == b => a,
                n => n,
            })
        });
        Ok(())
    }

    /// Shuffle the playlist; returns `mapping[old - 1] == new`
    pub async fn shuffle(&self) -> Vec<u32> {
        let mapping = self.playlist.write().await.randomize();
        self.adjust_now_playing(|now| mapping.get(now as usize - 1).copied());
        mapping
    }

    /// Empty the playlist, keeping its file path for a later save
    pub async fn clear(&self) -> Result<()> {
        self.engine.stop().await?;
        self.playlist.write().await.clear();
        self.set_now_playing(None);
        Ok(())
    }

    /// Empty the playlist and forget its file
    pub async fn new_playlist(&self) -> Result<()> {
        self.clear().await?;
        *lock(&self.playlist_path) = None;
        Ok(())
    }

    /// Replace the playlist with the contents of an M3U file
    ///
    /// A malformed file leaves the current playlist untouched.
    pub async fn load_playlist(&self, path: &Path) -> Result<usize> {
        let source = path.to_path_buf();
        let loaded = tokio::task::spawn_blocking(move || codec::load(&source))
            .await
            .map_err(|e| Error::Playlist(format!("load task failed: {}", e)))??;

        self.engine.stop().await?;
        let count = loaded.count();
        self.playlist.write().await.replace_all(loaded.into_items());
        self.set_now_playing(None);
        *lock(&self.playlist_path) = Some(path.to_path_buf());

        info!("Loaded playlist {} ({} entries)", path.display(), count);
        Ok(count)
    }

    /// Write the playlist to `path`, or to the last loaded/saved file
    pub async fn save_playlist(&self, path: Option<&Path>) -> Result<PathBuf> {
        let target = match path {
            Some(path) => path.to_path_buf(),
            None => self
                .playlist_path()
                .ok_or_else(|| Error::Playlist("no playlist file to save to".to_string()))?,
        };

        {
            let playlist = self.playlist.read().await;
            codec::save(&playlist, &target)?;
        }
        *lock(&self.playlist_path) = Some(target.clone());

        info!("Saved playlist to {}", target.display());
        Ok(target)
    }

    // ========================================
    // Snapshots
    // ========================================

    pub async fn snapshot(&self) -> PlaylistSnapshot {
        let items = self.playlist.read().await.items().to_vec();
        PlaylistSnapshot {
            items,
            now_playing: self.now_playing(),
            path: self.playlist_path(),
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.engine.state(),
            now_playing: self.now_playing(),
            track: self.engine.current_track(),
            bound: self.engine.is_bound(),
            position_ms: self.engine.position().as_millis() as u64,
            duration_ms: self.engine.duration().map(|d| d.as_millis() as u64),
            volume: self.engine.volume(),
        }
    }

    fn set_now_playing(&self, track_number: Option<u32>) {
        let changed = {
            let mut now = lock(&self.now_playing);
            let changed = *now != track_number;
            *now = track_number;
            changed
        };
        if changed {
            self.engine.events().emit_lossy(AmpEvent::NowPlayingChanged {
                track_number,
                timestamp: Utc::now(),
            });
        }
    }

    fn adjust_now_playing(&self, adjust: impl FnOnce(u32) -> Option<u32>) {
        let current = self.now_playing();
        if let Some(current) = current {
            self.set_now_playing(adjust(current));
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn scan_folder(dir: &Path, extensions: &[String]) -> Vec<TrackDescriptor> {
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_audio_file(entry.path(), extensions))
        .filter_map(|entry| match probe_track(entry.path()) {
            Ok(track) => Some(track),
            Err(e) => {
                warn!("Skipping {}: {}", entry.path().display(), e);
                None
            }
        })
        .collect()
}
