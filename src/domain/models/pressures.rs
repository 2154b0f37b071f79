//! Pressure accumulators driving budget decay.
//!
//! Pressures are unbounded above and clamped at zero below. They never gate
//! an action directly; they only feed the budget update rules.

use serde::{Deserialize, Serialize};

/// The three stress accumulators advanced on every step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pressures {
    /// Grows with low reward, relieved by reward.
    pub frustration: f64,
    /// Leaky integral of urgency over time.
    pub urgency_acc: f64,
    /// Grows when novelty arrives without reward; decays with reward.
    pub uncertainty: f64,
}

impl Pressures {
    /// Name of the first non-finite component, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        if !self.frustration.is_finite() {
            Some("frustration")
        } else if !self.urgency_acc.is_finite() {
            Some("urgency_acc")
        } else if !self.uncertainty.is_finite() {
            Some("uncertainty")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_zero() {
        let p = Pressures::default();
        assert_eq!(p.frustration, 0.0);
        assert_eq!(p.urgency_acc, 0.0);
        assert_eq!(p.uncertainty, 0.0);
    }

    #[test]
    fn test_non_finite_detection() {
        let p = Pressures {
            frustration: 0.1,
            urgency_acc: f64::NAN,
            uncertainty: 0.0,
        };
        assert_eq!(p.first_non_finite(), Some("urgency_acc"));
        assert_eq!(Pressures::default().first_non_finite(), None);
    }
}
