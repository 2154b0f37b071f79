//! Per-step input signals and their trust-gated effective form.
//!
//! [`Signals`] is the fixed-field record an agent (or an adapter observing
//! one) submits with every intended action. All components live on a `[0, 1]`
//! scale; values outside the range are saturated rather than rejected, and
//! non-finite values collapse to `0.0` so that garbage input can never widen
//! the governor's view of progress.
//!
//! [`EffectiveSignals`] is what the update mechanics actually consume:
//! reward and novelty multiplied by trust, urgency passed through undampened
//! so that negative feedback always reaches the accumulators.

use serde::{Deserialize, Serialize};

/// Raw progress/risk signals for one intended step.
///
/// `trust` defaults to `1.0` when omitted from a serialized payload; callers
/// that have reason to doubt the source should set it explicitly. A
/// non-finite trust value is treated as `0.0` during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Signals {
    /// Observed progress toward the goal.
    pub reward: f64,
    /// Newly discovered information.
    pub novelty: f64,
    /// External time/deadline pressure.
    pub urgency: f64,
    /// Credibility of the signal source.
    #[serde(default = "default_trust")]
    pub trust: f64,
}

const fn default_trust() -> f64 {
    1.0
}

impl Signals {
    /// Signals from a fully trusted source.
    pub fn new(reward: f64, novelty: f64, urgency: f64) -> Self {
        Self {
            reward,
            novelty,
            urgency,
            trust: 1.0,
        }
    }

    /// Signals with an explicit trust weighting.
    pub fn with_trust(reward: f64, novelty: f64, urgency: f64, trust: f64) -> Self {
        Self {
            reward,
            novelty,
            urgency,
            trust,
        }
    }

    /// The all-zero record used when no observation is available, with zero
    /// trust so nothing downstream mistakes it for progress.
    pub fn zero() -> Self {
        Self {
            reward: 0.0,
            novelty: 0.0,
            urgency: 0.0,
            trust: 0.0,
        }
    }
}

/// Signals after clamping and trust gating.
///
/// Produced exclusively by the evaluation service; the mechanics never see a
/// raw [`Signals`] record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveSignals {
    /// `reward * trust`, both clamped to the unit interval.
    pub reward: f64,
    /// `novelty * trust`, both clamped to the unit interval.
    pub novelty: f64,
    /// Urgency, clamped but never trust-dampened.
    pub urgency: f64,
    /// The clamped trust value itself, kept for collapse tracking.
    pub trust: f64,
}

/// Saturate a raw signal component into `[0, 1]`.
///
/// NaN and infinities map to `0.0`: an unintelligible signal must never read
/// as progress.
pub fn clamp_signal(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
