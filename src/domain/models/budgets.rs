//! Bounded budgets gating continued action.
//!
//! All four budgets live in `[0, 1]`. `effort` and `risk` only move down
//! while the kernel is running; `persistence` may recover with reward up to
//! a profile-bounded gain; `exploration` accumulates upward toward its cap
//! and is the one budget whose *growth* triggers a halt.
//!
//! `risk` carries an inverse sense: it starts at `1.0` and decreases as risk
//! is consumed. The quantity compared against `max_risk` is always the
//! consumed portion `1 - risk`, never the remainder.

use serde::{Deserialize, Serialize};

/// Snapshot of the four budget dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Budgets {
    /// Fuel for continued action.
    pub effort: f64,
    /// Remaining risk allowance (inverse sense; see module docs).
    pub risk: f64,
    /// Willingness to continue through failure.
    pub persistence: f64,
    /// Accumulated capacity spent pursuing novelty.
    pub exploration: f64,
}

impl Default for Budgets {
    /// A fresh kernel: full effort, risk and persistence, no exploration
    /// spent yet.
    fn default() -> Self {
        Self {
            effort: 1.0,
            risk: 1.0,
            persistence: 1.0,
            exploration: 0.0,
        }
    }
}

impl Budgets {
    /// Risk consumed so far: `1 - risk`.
    pub fn consumed_risk(&self) -> f64 {
        1.0 - self.risk
    }

    /// Name of the first non-finite component, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        if !self.effort.is_finite() {
            Some("effort")
        } else if !self.risk.is_finite() {
            Some("risk")
        } else if !self.persistence.is_finite() {
            Some("persistence")
        } else if !self.exploration.is_finite() {
            Some("exploration")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budgets() {
        let b = Budgets::default();
        assert_eq!(b.effort, 1.0);
        assert_eq!(b.risk, 1.0);
        assert_eq!(b.persistence, 1.0);
        assert_eq!(b.exploration, 0.0);
    }

    #[test]
    fn test_consumed_risk_direction() {
        let b = Budgets {
            risk: 0.25,
            ..Default::default()
        };
        assert!((b.consumed_risk() - 0.75).abs() < f64::EPSILON);
        assert_eq!(Budgets::default().consumed_risk(), 0.0);
    }

    #[test]
    fn test_non_finite_detection() {
        let b = Budgets {
            effort: f64::INFINITY,
            ..Default::default()
        };
        assert_eq!(b.first_non_finite(), Some("effort"));
        assert_eq!(Budgets::default().first_non_finite(), None);
    }
}
