//! Stepped volume ramps
//!
//! A fade moves the bound source's volume from one level to another in a
//! fixed number of steps spaced one fade tick apart. The shape of each step
//! comes from a [`FadeCurve`]: fade-in shapes for rising ramps, fade-out
//! shapes for falling ones.
//!
//! # Examples
//!
//! ```
//! use amp_common::FadeCurve;
//! use amp_player::playback::fader::FadeRamp;
//!
//! let ramp = FadeRamp::new(0.0, 0.8, 4, FadeCurve::Linear);
//! assert_eq!(ramp.volume_at(2), 0.4);
//! assert_eq!(ramp.volume_at(4), 0.8);
//! ```

use crate::config::EngineSettings;
use amp_common::FadeCurve;

/// Volume ramp between two levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeRamp {
    pub from: f32,
    pub to: f32,
    pub steps: u32,
    pub curve: FadeCurve,
}

impl FadeRamp {
    pub fn new(from: f32, to: f32, steps: u32, curve: FadeCurve) -> Self {
        Self {
            from: from.clamp(0.0, 1.0),
            to: to.clamp(0.0, 1.0),
            steps,
            curve,
        }
    }

    /// Volume after `step` steps (1-based); the last step lands exactly on `to`
    pub fn volume_at(&self, step: u32) -> f32 {
        if self.steps == 0 || step >= self.steps {
            return self.to;
        }

        let t = step as f32 / self.steps as f32;
        if self.to >= self.from {
            self.from + (self.to - self.from) * self.curve.calculate_fade_in(t)
        } else {
            self.to + (self.from - self.to) * self.curve.calculate_fade_out(t)
        }
    }
}

/// How a fade ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeOutcome {
    /// Every step was applied
    Completed,
    /// Another fade or a stop took over between steps
    Cancelled,
    /// The transport left the state the fade was guarding
    Aborted,
}

/// Fade-out length used when stopping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopFade {
    /// User stop (`stop_fade_steps`)
    Full,
    /// Song change interrupting playback (`change_fade_steps`)
    Fast,
    /// Cut immediately
    None,
}

impl StopFade {
    pub fn steps(&self, settings: &EngineSettings) -> u32 {
        match self {
            StopFade::Full => settings.stop_fade_steps,
            StopFade::Fast => settings.change_fade_steps,
            StopFade::None => 0,
        }
    }
}
