//! Immutable kernel configuration: thresholds, stagnation detection, and
//! rate constants.
//!
//! A [`Profile`] is fixed at kernel construction and never mutated. Policy
//! files deserialize into it with unknown keys rejected; every field carries
//! a serde default taken from the BALANCED preset so a policy file only needs
//! to state what it changes.

use serde::{Deserialize, Serialize};

/// Hard thresholds that terminate a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub struct Limits {
    /// Step cap; reaching it halts with `EXTERNAL`.
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,
    /// Maximum consumed risk `1 - risk` before `OVERRISK`, in `(0, 1]`.
    #[serde(default = "default_max_risk")]
    pub max_risk: f64,
    /// Effort at or below this halts with `EXHAUSTION`, in `[0, 1)`.
    #[serde(default = "default_min_effort")]
    pub min_effort: f64,
    /// Exploration strictly above this halts with `SAFETY`, in `[0, 1]`.
    #[serde(default = "default_max_exploration")]
    pub max_exploration: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_risk: default_max_risk(),
            min_effort: default_min_effort(),
            max_exploration: default_max_exploration(),
        }
    }
}

const fn default_max_steps() -> u64 {
    100
}
const fn default_max_risk() -> f64 {
    0.8
}
const fn default_min_effort() -> f64 {
    0.05
}
const fn default_max_exploration() -> f64 {
    1.0
}

/// Cycle detection over the recent reward/effort history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub struct Stagnation {
    /// Number of recent steps inspected; also the history ring size.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Mean per-step effort drain must exceed this for stagnation to fire.
    #[serde(default = "default_effort_floor")]
    pub effort_floor: f64,
    /// Mean effective reward must fall below this for stagnation to fire.
    #[serde(default = "default_reward_ceiling")]
    pub reward_ceiling: f64,
}

impl Default for Stagnation {
    fn default() -> Self {
        Self {
            window: default_window(),
            effort_floor: default_effort_floor(),
            reward_ceiling: default_reward_ceiling(),
        }
    }
}

const fn default_window() -> usize {
    10
}
const fn default_effort_floor() -> f64 {
    0.01
}
const fn default_reward_ceiling() -> f64 {
    0.05
}

/// Rate constants for the pressure and budget update rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub struct Rates {
    /// Flat effort drained every step.
    #[serde(default = "default_effort_drain_base")]
    pub effort_drain_base: f64,
    /// Additional effort drained per unit of frustration.
    #[serde(default = "default_effort_drain_per_frustration")]
    pub effort_drain_per_frustration: f64,
    /// Frustration gained per unit of missing reward.
    #[serde(default = "default_frustration_gain")]
    pub frustration_gain: f64,
    /// Frustration relieved per unit of reward.
    #[serde(default = "default_frustration_decay")]
    pub frustration_decay: f64,
    /// Leak rate of the urgency accumulator.
    #[serde(default = "default_urgency_decay")]
    pub urgency_decay: f64,
    /// Uncertainty gained per unit of unrewarded novelty.
    #[serde(default = "default_uncertainty_gain")]
    pub uncertainty_gain: f64,
    /// Uncertainty relieved per unit of reward.
    #[serde(default = "default_uncertainty_decay")]
    pub uncertainty_decay: f64,
    /// Risk consumed per unit of novelty.
    #[serde(default = "default_risk_gain_per_novelty")]
    pub risk_gain_per_novelty: f64,
    /// Risk consumed per unit of urgency.
    #[serde(default = "default_risk_gain_per_urgency")]
    pub risk_gain_per_urgency: f64,
    /// Persistence lost per unit of frustration.
    #[serde(default = "default_persistence_loss_per_frustration")]
    pub persistence_loss_per_frustration: f64,
    /// Persistence recovered per unit of reward; also the contract ceiling
    /// on per-step persistence growth.
    #[serde(default = "default_persistence_gain_per_reward")]
    pub persistence_gain_per_reward: f64,
    /// Exploration accumulated per unit of novelty.
    #[serde(default = "default_exploration_gain")]
    pub exploration_gain: f64,
    /// Exploration released every step.
    #[serde(default = "default_exploration_decay")]
    pub exploration_decay: f64,
    /// Headroom above `max_exploration` the accumulator may occupy so the
    /// `SAFETY` comparison can observe an overshoot.
    #[serde(default = "default_exploration_overflow")]
    pub exploration_overflow: f64,
    /// Trust strictly below this counts toward collapse.
    #[serde(default = "default_trust_epsilon")]
    pub trust_epsilon: f64,
    /// Consecutive low-trust steps before `TRUST_COLLAPSE`.
    #[serde(default = "default_trust_collapse_window")]
    pub trust_collapse_window: usize,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            effort_drain_base: default_effort_drain_base(),
            effort_drain_per_frustration: default_effort_drain_per_frustration(),
            frustration_gain: default_frustration_gain(),
            frustration_decay: default_frustration_decay(),
            urgency_decay: default_urgency_decay(),
            uncertainty_gain: default_uncertainty_gain(),
            uncertainty_decay: default_uncertainty_decay(),
            risk_gain_per_novelty: default_risk_gain_per_novelty(),
            risk_gain_per_urgency: default_risk_gain_per_urgency(),
            persistence_loss_per_frustration: default_persistence_loss_per_frustration(),
            persistence_gain_per_reward: default_persistence_gain_per_reward(),
            exploration_gain: default_exploration_gain(),
            exploration_decay: default_exploration_decay(),
            exploration_overflow: default_exploration_overflow(),
            trust_epsilon: default_trust_epsilon(),
            trust_collapse_window: default_trust_collapse_window(),
        }
    }
}

const fn default_effort_drain_base() -> f64 {
    0.005
}
const fn default_effort_drain_per_frustration() -> f64 {
    0.09
}
const fn default_frustration_gain() -> f64 {
    0.25
}
const fn default_frustration_decay() -> f64 {
    3.0
}
const fn default_urgency_decay() -> f64 {
    0.1
}
const fn default_uncertainty_gain() -> f64 {
    0.3
}
const fn default_uncertainty_decay() -> f64 {
    0.2
}
const fn default_risk_gain_per_novelty() -> f64 {
    0.03
}
const fn default_risk_gain_per_urgency() -> f64 {
    0.03
}
const fn default_persistence_loss_per_frustration() -> f64 {
    0.02
}
const fn default_persistence_gain_per_reward() -> f64 {
    0.05
}
const fn default_exploration_gain() -> f64 {
    0.1
}
const fn default_exploration_decay() -> f64 {
    0.05
}
const fn default_exploration_overflow() -> f64 {
    0.05
}
const fn default_trust_epsilon() -> f64 {
    0.01
}
const fn default_trust_collapse_window() -> usize {
    5
}

/// Immutable per-kernel configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub struct Profile {
    /// Hard halt thresholds.
    #[serde(default)]
    pub limits: Limits,
    /// Stagnation detection parameters.
    #[serde(default)]
    pub stagnation: Stagnation,
    /// Update-rule rate constants.
    #[serde(default)]
    pub rates: Rates,
}

impl Profile {
    /// The middle-of-the-road preset. Identical to [`Profile::default`].
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Tight preset: short runs, low risk appetite, early exhaustion.
    pub fn conservative() -> Self {
        Self {
            limits: Limits {
                max_steps: 50,
                max_risk: 0.5,
                min_effort: 0.1,
                max_exploration: 0.5,
            },
            stagnation: Stagnation {
                window: 6,
                effort_floor: 0.008,
                reward_ceiling: 0.1,
            },
            rates: Rates {
                effort_drain_base: 0.01,
                effort_drain_per_frustration: 0.12,
                frustration_gain: 0.3,
                frustration_decay: 2.0,
                risk_gain_per_novelty: 0.05,
                risk_gain_per_urgency: 0.05,
                trust_collapse_window: 3,
                ..Rates::default()
            },
        }
    }

    /// Loose preset: long runs, high risk appetite, slow drains.
    pub fn aggressive() -> Self {
        Self {
            limits: Limits {
                max_steps: 500,
                max_risk: 0.95,
                min_effort: 0.0,
                max_exploration: 1.0,
            },
            stagnation: Stagnation {
                window: 20,
                effort_floor: 0.02,
                reward_ceiling: 0.02,
            },
            rates: Rates {
                effort_drain_base: 0.002,
                effort_drain_per_frustration: 0.04,
                frustration_gain: 0.15,
                frustration_decay: 4.0,
                risk_gain_per_novelty: 0.01,
                risk_gain_per_urgency: 0.01,
                trust_collapse_window: 8,
                ..Rates::default()
            },
        }
    }

    /// Look up a preset by its case-insensitive name.
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "conservative" => Some(Self::conservative()),
            "balanced" => Some(Self::balanced()),
            "aggressive" => Some(Self::aggressive()),
            _ => None,
        }
    }
}
