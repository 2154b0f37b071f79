//! Mutable kernel state.
//!
//! Created from a profile, mutated only inside the kernel's `step()`, and
//! replaced wholesale on `reset()`. The state is serializable so hosts can
//! snapshot a kernel for inspection.

use serde::{Deserialize, Serialize};

use super::budgets::Budgets;
use super::decision::FailureKind;
use super::history::StepHistory;
use super::pressures::Pressures;
use super::profile::Profile;

/// Everything the kernel tracks between steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelState {
    /// Steps taken so far (incremented before classification).
    pub step_index: u64,
    /// Stress accumulators.
    pub pressures: Pressures,
    /// Bounded budgets.
    pub budgets: Budgets,
    /// Recent reward/drain samples for stagnation detection.
    pub history: StepHistory,
    /// Consecutive steps with trust below epsilon.
    pub low_trust_streak: usize,
    /// Terminal flag; cleared only by `reset()`.
    pub halted: bool,
    /// Set exactly when `halted` is true.
    pub failure: Option<FailureKind>,
    /// Human-readable halt cause.
    pub reason: Option<String>,
}

impl KernelState {
    /// Fresh running state sized to the profile's stagnation window.
    pub fn new(profile: &Profile) -> Self {
        Self {
            step_index: 0,
            pressures: Pressures::default(),
            budgets: Budgets::default(),
            history: StepHistory::new(profile.stagnation.window),
            low_trust_streak: 0,
            halted: false,
            failure: None,
            reason: None,
        }
    }

    /// Name of the first non-finite pressure or budget, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        self.pressures
            .first_non_finite()
            .or_else(|| self.budgets.first_non_finite())
    }
}
