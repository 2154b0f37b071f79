//! Deterministic pressure/budget update rules.
//!
//! `advance` applies the eight update steps in a fixed order; reordering
//! them changes results, so the sequence below is load-bearing. There is no
//! randomness and no wall-clock input, and all arithmetic is plain `f64` —
//! two kernels fed the same effective signals stay bitwise identical.

use crate::domain::models::{EffectiveSignals, KernelState, Profile};

/// Apply one step's updates to `state` in place.
///
/// Update order:
/// 1. frustration
/// 2. urgency accumulator
/// 3. uncertainty
/// 4. effort (drains on the *new* frustration)
/// 5. risk
/// 6. persistence (reacts to the *new* frustration)
/// 7. exploration
/// 8. history push (reward, effort drain)
pub fn advance(state: &mut KernelState, eff: &EffectiveSignals, profile: &Profile) {
    let rates = &profile.rates;
    let pressures = &mut state.pressures;
    let budgets = &mut state.budgets;

    pressures.frustration = (pressures.frustration
        + rates.frustration_gain * (1.0 - eff.reward)
        - rates.frustration_decay * eff.reward)
        .max(0.0);

    pressures.urgency_acc = pressures.urgency_acc * (1.0 - rates.urgency_decay) + eff.urgency;

    pressures.uncertainty = (pressures.uncertainty
        + rates.uncertainty_gain * eff.novelty * (1.0 - eff.reward)
        - rates.uncertainty_decay * eff.reward)
        .max(0.0);

    let effort_before = budgets.effort;
    budgets.effort = (budgets.effort
        - rates.effort_drain_base
        - rates.effort_drain_per_frustration * pressures.frustration)
        .max(0.0);

    budgets.risk = (budgets.risk
        - rates.risk_gain_per_novelty * eff.novelty
        - rates.risk_gain_per_urgency * eff.urgency)
        .max(0.0);

    budgets.persistence = (budgets.persistence
        - rates.persistence_loss_per_frustration * pressures.frustration
        + rates.persistence_gain_per_reward * eff.reward)
        .clamp(0.0, 1.0);

    budgets.exploration = (budgets.exploration + rates.exploration_gain * eff.novelty
        - rates.exploration_decay)
        .clamp(
            0.0,
            profile.limits.max_exploration + rates.exploration_overflow,
        );

    state
        .history
        .push(eff.reward, effort_before - budgets.effort);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Signals;
    use crate::services::evaluation::evaluate;

    fn stepped(signals: Signals, profile: &Profile, n: usize) -> KernelState {
        let mut state = KernelState::new(profile);
        let eff = evaluate(&signals, profile);
        for _ in 0..n {
            advance(&mut state, &eff, profile);
        }
        state
    }

    #[test]
    fn test_zero_reward_grows_frustration() {
        let p = Profile::balanced();
        let state = stepped(Signals::new(0.0, 0.0, 0.0), &p, 4);
        assert!(
            (state.pressures.frustration - 4.0 * p.rates.frustration_gain).abs() < 1e-12
        );
    }

    #[test]
    fn test_reward_relieves_frustration_to_floor() {
        let p = Profile::balanced();
        let mut state = KernelState::new(&p);
        state.pressures.frustration = 0.1;
        let eff = evaluate(&Signals::new(1.0, 0.0, 0.0), &p);
        advance(&mut state, &eff, &p);
        // gain*(1-1) - decay*1 pulls hard below zero; clamped at 0.
        assert_eq!(state.pressures.frustration, 0.0);
    }

    #[test]
    fn test_urgency_accumulator_leaks() {
        let p = Profile::balanced();
        let state = stepped(Signals::new(0.5, 0.0, 1.0), &p, 2);
        let expected = 1.0 * (1.0 - p.rates.urgency_decay) + 1.0;
        assert!((state.pressures.urgency_acc - expected).abs() < 1e-12);
    }

    #[test]
    fn test_effort_drains_on_new_frustration() {
        let p = Profile::balanced();
        let state = stepped(Signals::new(0.0, 0.0, 0.0), &p, 1);
        let f1 = p.rates.frustration_gain;
        let expected =
            1.0 - p.rates.effort_drain_base - p.rates.effort_drain_per_frustration * f1;
        assert!((state.budgets.effort - expected).abs() < 1e-12);
    }

    #[test]
    fn test_risk_consumed_by_novelty_and_urgency() {
        let p = Profile::balanced();
        let state = stepped(Signals::new(0.5, 1.0, 1.0), &p, 3);
        let per_step = p.rates.risk_gain_per_novelty + p.rates.risk_gain_per_urgency;
        assert!((state.budgets.consumed_risk() - 3.0 * per_step).abs() < 1e-12);
    }

    #[test]
    fn test_exploration_clamped_at_overflow_headroom() {
        let p = Profile::balanced();
        let state = stepped(Signals::new(1.0, 1.0, 0.0), &p, 200);
        let ceiling = p.limits.max_exploration + p.rates.exploration_overflow;
        assert!(state.budgets.exploration <= ceiling + f64::EPSILON);
    }

    #[test]
    fn test_history_records_drain() {
        let p = Profile::balanced();
        let state = stepped(Signals::new(0.0, 0.0, 0.1), &p, 2);
        assert_eq!(state.history.len(), 2);
        assert!(state.history.mean_effort_drain() > 0.0);
        assert_eq!(state.history.mean_reward(), 0.0);
    }

    #[test]
    fn test_determinism_bitwise() {
        let p = Profile::balanced();
        let a = stepped(Signals::new(0.3, 0.7, 0.2), &p, 50);
        let b = stepped(Signals::new(0.3, 0.7, 0.2), &p, 50);
        assert_eq!(a, b);
    }

    #[test]
    fn test_budgets_never_leave_bounds() {
        let p = Profile::balanced();
        let state = stepped(Signals::new(0.0, 1.0, 1.0), &p, 300);
        let b = &state.budgets;
        assert!(b.effort >= 0.0 && b.effort <= 1.0);
        assert!(b.risk >= 0.0 && b.risk <= 1.0);
        assert!(b.persistence >= 0.0 && b.persistence <= 1.0);
        assert!(b.exploration >= 0.0);
    }
}
