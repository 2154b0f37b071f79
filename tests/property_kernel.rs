//! Property tests for the governor's universal invariants.
//!
//! Determinism, finite termination, halt irreversibility, and budget
//! monotonicity must hold for every signal stream, not just the scripted
//! scenarios.

use proptest::prelude::*;
use warden::domain::models::{Profile, Signals};
use warden::services::Kernel;

fn arb_signals() -> impl Strategy<Value = Signals> {
    (0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64)
        .prop_map(|(reward, novelty, urgency, trust)| {
            Signals::with_trust(reward, novelty, urgency, trust)
        })
}

fn small_profile() -> Profile {
    let mut profile = Profile::balanced();
    profile.limits.max_steps = 20;
    profile
}

proptest! {
    /// Two kernels with the same profile and signal stream produce
    /// identical decision sequences and end states.
    #[test]
    fn prop_determinism(stream in proptest::collection::vec(arb_signals(), 1..40)) {
        let mut a = Kernel::new("a", Profile::balanced()).with_contracts(false);
        let mut b = Kernel::new("b", Profile::balanced()).with_contracts(false);
        for signals in &stream {
            let da = a.step(signals).unwrap();
            let db = b.step(signals).unwrap();
            prop_assert_eq!(&da.budgets, &db.budgets);
            prop_assert_eq!(da, db);
        }
        prop_assert_eq!(a.state(), b.state());
    }

    /// Every stream halts within max_steps.
    #[test]
    fn prop_finite_termination(stream in proptest::collection::vec(arb_signals(), 25..30)) {
        let mut kernel = Kernel::new("t", small_profile()).with_contracts(false);
        let mut halted_at = None;
        for (index, signals) in stream.iter().enumerate() {
            let decision = kernel.step(signals).unwrap();
            if decision.halted {
                halted_at = Some(index as u64 + 1);
                break;
            }
        }
        let halted_at = halted_at.expect("kernel must halt within the stream");
        prop_assert!(halted_at <= small_profile().limits.max_steps);
    }

    /// After the first halt no subsequent step returns GO, and the terminal
    /// decision is stable.
    #[test]
    fn prop_halt_irreversibility(stream in proptest::collection::vec(arb_signals(), 25..35)) {
        let mut kernel = Kernel::new("t", small_profile()).with_contracts(false);
        let mut terminal = None;
        for signals in &stream {
            let decision = kernel.step(signals).unwrap();
            if let Some(previous) = &terminal {
                prop_assert_eq!(&decision, previous);
            } else if decision.halted {
                terminal = Some(decision);
            }
        }
        prop_assert!(terminal.is_some());
    }

    /// Between consecutive steps, effort never rises and consumed risk
    /// never falls.
    #[test]
    fn prop_budget_monotonicity(stream in proptest::collection::vec(arb_signals(), 1..40)) {
        let mut kernel = Kernel::new("t", Profile::balanced()).with_contracts(false);
        let mut last_effort = kernel.state().budgets.effort;
        let mut last_consumed = kernel.state().budgets.consumed_risk();
        for signals in &stream {
            let decision = kernel.step(signals).unwrap();
            prop_assert!(decision.budgets.effort <= last_effort);
            prop_assert!(decision.budgets.consumed_risk() >= last_consumed);
            last_effort = decision.budgets.effort;
            last_consumed = decision.budgets.consumed_risk();
            if decision.halted {
                break;
            }
        }
    }

    /// Signals far outside the unit range are saturated, never rejected,
    /// and the kernel still behaves.
    #[test]
    fn prop_out_of_range_signals_saturate(
        reward in -10.0..10.0f64,
        novelty in -10.0..10.0f64,
        urgency in -10.0..10.0f64,
    ) {
        let mut kernel = Kernel::new("t", Profile::balanced()).with_contracts(false);
        let decision = kernel.step(&Signals::new(reward, novelty, urgency)).unwrap();
        prop_assert!(decision.budgets.effort <= 1.0);
        prop_assert!(decision.budgets.risk <= 1.0);
        prop_assert!(decision.budgets.exploration >= 0.0);
    }
}
