//! Wall-clock position tracking for the position poller

use std::time::Duration;
use tokio::time::Instant;

/// Elapsed playback time measured from an epoch
///
/// While running, `elapsed()` is the offset the clock was started at plus
/// the wall-clock time since. Readers that run ahead of the clock pull the
/// epoch forward through [`PositionClock::observe`].
#[derive(Debug, Default, Clone)]
pub struct PositionClock {
    epoch: Option<Instant>,
    offset: Duration,
}

impl PositionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) counting from `at`
    pub fn start(&mut self, at: Duration) {
        self.offset = at;
        self.epoch = Some(Instant::now());
    }

    /// Freeze at the current elapsed time
    pub fn stop(&mut self) {
        self.offset = self.elapsed();
        self.epoch = None;
    }

    /// Stop and rewind to zero
    pub fn reset(&mut self) {
        self.offset = Duration::ZERO;
        self.epoch = None;
    }

    pub fn is_running(&self) -> bool {
        self.epoch.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        match self.epoch {
            Some(epoch) => self.offset + epoch.elapsed(),
            None => self.offset,
        }
    }

    /// Compare a reported reader position against the clock
    ///
    /// A reported position ahead of the clock resynchronizes the epoch.
    /// Returns the progress to test against the track length.
    pub fn observe(&mut self, reported: Duration) -> Duration {
        let elapsed = self.elapsed();
        if self.is_running() && reported > elapsed {
            self.start(reported);
            return reported;
        }
        elapsed
    }
}
