//! Fade curve calculations for crossfade mixing
//!
//! Crossfades between clips apply a fade-out curve to the tail of the
//! outgoing clip and a fade-in curve to the head of the incoming clip.
//! Equal-power is the default: it keeps perceived loudness constant
//! through the transition, which matters when joining spoken-word clips
//! recorded at different levels.

use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

/// Fade curve types for crossfading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// Linear: v(t) = t. Constant rate of change.
    Linear,
    /// Equal-power: v(t) = sin(t * pi/2). Constant perceived loudness,
    /// since fade_in(t)^2 + fade_out(t)^2 == 1 for all t.
    EqualPower,
}

impl FadeCurve {
    /// Fade-in multiplier at normalized position `t` in [0, 1].
    ///
    /// Returns 0.0 at the start of the fade and 1.0 at the end.
    pub fn fade_in(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => t,
            FadeCurve::EqualPower => (t * FRAC_PI_2).sin(),
        }
    }

    /// Fade-out multiplier at normalized position `t` in [0, 1].
    ///
    /// Returns 1.0 at the start of the fade and 0.0 at the end.
    pub fn fade_out(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => 1.0 - t,
            FadeCurve::EqualPower => (t * FRAC_PI_2).cos(),
        }
    }
}

impl Default for FadeCurve {
    fn default() -> Self {
        FadeCurve::EqualPower
    }
}
