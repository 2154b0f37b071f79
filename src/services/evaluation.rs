//! Signal evaluation: clamping and trust gating.
//!
//! A pure transform from raw [`Signals`] to [`EffectiveSignals`]. Reward and
//! novelty are scaled by trust so an untrusted source cannot manufacture
//! progress; urgency passes through untouched because negative feedback must
//! always reach the accumulators, whatever its source.

use crate::domain::models::{clamp_signal, EffectiveSignals, Profile, Signals};

/// Clamp and trust-gate one step's signals.
///
/// Out-of-range components saturate into `[0, 1]`; non-finite components
/// (including a NaN trust) collapse to `0.0`, so malformed input reads as
/// "no progress from an untrusted source" rather than an error.
pub fn evaluate(signals: &Signals, _profile: &Profile) -> EffectiveSignals {
    let reward = clamp_signal(signals.reward);
    let novelty = clamp_signal(signals.novelty);
    let urgency = clamp_signal(signals.urgency);
    let trust = clamp_signal(signals.trust);

    EffectiveSignals {
        reward: reward * trust,
        novelty: novelty * trust,
        urgency,
        trust,
    }
}

/// Advance the consecutive low-trust streak given this step's clamped trust.
///
/// Returns the new streak length. The caller flags trust collapse once the
/// streak reaches the profile's `trust_collapse_window`.
pub fn update_trust_streak(streak: usize, trust: f64, profile: &Profile) -> usize {
    if trust < profile.rates.trust_epsilon {
        streak + 1
    } else {
        0
    }
}

/// Whether the streak has reached the collapse window.
pub fn trust_collapsed(streak: usize, profile: &Profile) -> bool {
    profile.rates.trust_collapse_window > 0 && streak >= profile.rates.trust_collapse_window
}
