//! The kernel's per-step verdict.

use serde::{Deserialize, Serialize};

use super::budgets::Budgets;

/// Why a kernel halted.
///
/// Wire form is the screaming-snake name (`"OVERRISK"`, `"TRUST_COLLAPSE"`,
/// ...), matching the audit record format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Exploration exceeded its cap.
    Safety,
    /// Consumed risk exceeded `max_risk`.
    Overrisk,
    /// Effort depleted to `min_effort` or below.
    Exhaustion,
    /// Low-reward, steady-drain cycle detected.
    Stagnation,
    /// Step cap reached, cascade halt, or fatal arithmetic.
    External,
    /// Trust stayed below epsilon for the collapse window.
    TrustCollapse,
}

impl FailureKind {
    /// Wire name, identical to the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safety => "SAFETY",
            Self::Overrisk => "OVERRISK",
            Self::Exhaustion => "EXHAUSTION",
            Self::Stagnation => "STAGNATION",
            Self::External => "EXTERNAL",
            Self::TrustCollapse => "TRUST_COLLAPSE",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one `step()`: GO, or HALT with a typed classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the kernel is (now) halted.
    pub halted: bool,
    /// Set exactly when `halted` is true.
    pub failure: Option<FailureKind>,
    /// Human-readable cause embedding the offending value and threshold.
    pub reason: Option<String>,
    /// Budget snapshot at decision time.
    pub budgets: Budgets,
    /// Step index the decision was produced at.
    pub step_index: u64,
}

impl Decision {
    /// A GO decision.
    pub fn go(budgets: Budgets, step_index: u64) -> Self {
        Self {
            halted: false,
            failure: None,
            reason: None,
            budgets,
            step_index,
        }
    }

    /// A HALT decision.
    pub fn halt(
        failure: FailureKind,
        reason: impl Into<String>,
        budgets: Budgets,
        step_index: u64,
    ) -> Self {
        Self {
            halted: true,
            failure: Some(failure),
            reason: Some(reason.into()),
            budgets,
            step_index,
        }
    }
}
