//! Position poller
//!
//! One task per play session. Each tick reads the bound reader's position
//! under the session lock, emits it, and checks for the end of a local
//! file. The cancellation token is checked under the same lock, so once
//! the poller has been cancelled nothing more is emitted.

use super::core::EngineInner;
use amp_common::events::AmpEvent;
use amp_common::TransportState;
use chrono::Utc;
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub(super) struct PollerHandle {
    token: CancellationToken,
    _task: JoinHandle<()>,
}

impl PollerHandle {
    pub(super) fn cancel(&self) {
        self.token.cancel();
    }
}

/// Start polling; the task ends on cancel, at end of track, or when the engine is dropped
pub(super) fn spawn(engine: Weak<EngineInner>, period: Duration) -> PollerHandle {
    let token = CancellationToken::new();
    let task = tokio::spawn(run(engine, token.clone(), period));
    PollerHandle { token, _task: task }
}

async fn run(engine: Weak<EngineInner>, token: CancellationToken, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(inner) = engine.upgrade() else {
            break;
        };
        if !tick(&inner, &token) {
            break;
        }
    }
    debug!("Position poller exited");
}

/// One poll; returns false when the poller should stop
fn tick(inner: &EngineInner, token: &CancellationToken) -> bool {
    let mut session = inner.session();
    if token.is_cancelled() {
        return false;
    }

    let Some(binding) = session.binding.as_ref() else {
        return false;
    };
    let reported = binding.position();
    let total = binding.total_duration();

    let playing = session.state == TransportState::Playing;
    let progress = if playing {
        session.clock.observe(reported)
    } else {
        reported
    };

    inner.events.emit_lossy(AmpEvent::PositionChanged {
        position_ms: reported.as_millis() as u64,
        duration_ms: total.map(|d| d.as_millis() as u64),
        timestamp: Utc::now(),
    });

    let finished = playing
        && session.is_local()
        && total.is_some_and(|total| progress >= total);
    if !finished {
        return true;
    }

    // Clear ourselves before announcing; the controller takes it from here
    session.cancel_poller();
    session.resume_after_change = true;
    let track_number = session.current.as_ref().map(|track| track.track_number);
    info!("End of track {:?}", track_number);
    inner.events.emit_lossy(AmpEvent::EndOfTrack {
        track_number,
        timestamp: Utc::now(),
    });
    false
}
