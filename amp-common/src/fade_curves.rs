//! Fade curve shapes for volume ramps
//!
//! A curve maps normalized fade progress `t` (0.0 at the first step, 1.0 at
//! the last) onto a gain multiplier. Every shape here is symmetric: the
//! fade-out gain at `t` is the fade-in gain at `1 - t`.

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};
use std::str::FromStr;

/// Shape applied to each step of a fade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// Constant volume increment per step
    #[default]
    Linear,

    /// Raised cosine: gentle at both ends
    SCurve,

    /// Quarter sine: holds loudness up longer
    EqualPower,
}

const ALL: [FadeCurve; 3] = [FadeCurve::Linear, FadeCurve::SCurve, FadeCurve::EqualPower];

impl FadeCurve {
    fn rising(&self, t: f32) -> f32 {
        match self {
            FadeCurve::Linear => t,
            FadeCurve::SCurve => 0.5 * (1.0 - (PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).sin(),
        }
    }

    /// Gain for a fade-in: 0.0 at the start, 1.0 at the end
    pub fn calculate_fade_in(&self, position: f32) -> f32 {
        self.rising(position.clamp(0.0, 1.0))
    }

    /// Gain for a fade-out: 1.0 at the start, 0.0 at the end
    pub fn calculate_fade_out(&self, position: f32) -> f32 {
        self.rising(1.0 - position.clamp(0.0, 1.0))
    }

    pub fn all_variants() -> &'static [FadeCurve] {
        &ALL
    }
}

impl FromStr for FadeCurve {
    type Err = crate::Error;

    /// Config names (`linear`, `s_curve`, `equal_power`), case-insensitive;
    /// `-` is accepted in place of `_`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "linear" => Ok(FadeCurve::Linear),
            "s_curve" | "scurve" => Ok(FadeCurve::SCurve),
            "equal_power" => Ok(FadeCurve::EqualPower),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown fade curve: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_points() {
        for curve in FadeCurve::all_variants() {
            assert!(curve.calculate_fade_in(0.0).abs() < 1e-6, "{:?}", curve);
            assert!((curve.calculate_fade_in(1.0) - 1.0).abs() < 1e-6, "{:?}", curve);
            assert!((curve.calculate_fade_out(0.0) - 1.0).abs() < 1e-6, "{:?}", curve);
            assert!(curve.calculate_fade_out(1.0).abs() < 1e-6, "{:?}", curve);
        }
    }

    #[test]
    fn test_curves_are_monotonic() {
        for curve in FadeCurve::all_variants() {
            let mut last_in = -1.0f32;
            let mut last_out = 2.0f32;
            for i in 0..=20 {
                let t = i as f32 / 20.0;
                let (v_in, v_out) = (curve.calculate_fade_in(t), curve.calculate_fade_out(t));
                assert!(v_in >= last_in - 1e-6, "{:?} fade-in at {}", curve, t);
                assert!(v_out <= last_out + 1e-6, "{:?} fade-out at {}", curve, t);
                last_in = v_in;
                last_out = v_out;
            }
        }
    }

    #[test]
    fn test_out_of_range_progress_is_clamped() {
        assert_eq!(FadeCurve::Linear.calculate_fade_in(1.5), 1.0);
        assert_eq!(FadeCurve::Linear.calculate_fade_out(-0.5), 1.0);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("linear".parse::<FadeCurve>().unwrap(), FadeCurve::Linear);
        assert_eq!("S-Curve".parse::<FadeCurve>().unwrap(), FadeCurve::SCurve);
        assert_eq!("EQUAL_POWER".parse::<FadeCurve>().unwrap(), FadeCurve::EqualPower);
        assert!("cubic".parse::<FadeCurve>().is_err());
    }

    #[test]
    fn test_serde_uses_config_names() {
        assert_eq!(serde_json::to_string(&FadeCurve::SCurve).unwrap(), "\"s_curve\"");
        let parsed: FadeCurve = serde_json::from_str("\"equal_power\"").unwrap();
        assert_eq!(parsed, FadeCurve::EqualPower);
        assert_eq!(FadeCurve::default(), FadeCurve::Linear);
    }
}
