//! In-process enforcement boundary.
//!
//! The whole contract is one predicate: an action may run iff the latest
//! decision is not a halt. The wrapper never executes the action body before
//! the check and never catches errors the action itself raises; those belong
//! to the caller.

use serde_json::Value;

use crate::domain::errors::{BlockedError, GovernorError};
use crate::domain::models::{Decision, Signals};
use crate::services::kernel::Kernel;

/// Whether `decision` permits execution.
pub fn allow(decision: &Decision) -> bool {
    !decision.halted
}

/// Run `action` only if `decision` permits it.
///
/// On a halt decision the action is never invoked and a [`BlockedError`]
/// carrying the failure classification is returned instead.
pub fn enforce<A, T, F>(decision: &Decision, action: F, args: A) -> Result<T, BlockedError>
where
    F: FnOnce(A) -> T,
{
    if allow(decision) {
        Ok(action(args))
    } else {
        Err(BlockedError {
            failure: decision
                .failure
                .expect("halt decision always carries a failure"),
            reason: decision.reason.clone().unwrap_or_default(),
            step: decision.step_index,
        })
    }
}

/// Step the kernel for a named action, then run it under the fresh decision.
///
/// This is the in-process equivalent of the HTTP proxy's `POST /tool/{name}`
/// flow: one kernel step, one enforcement check, one invocation.
pub fn govern<A, T, F>(
    kernel: &mut Kernel,
    action_name: &str,
    params: &Value,
    signals: &Signals,
    action: F,
    args: A,
) -> Result<T, GovernorError>
where
    F: FnOnce(A) -> T,
{
    let decision = kernel.step_for_action(action_name, params, signals)?;
    enforce(&decision, action, args).map_err(GovernorError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Budgets, FailureKind, Profile};

    #[test]
    fn test_allow_tracks_halted_flag() {
        assert!(allow(&Decision::go(Budgets::default(), 1)));
        assert!(!allow(&Decision::halt(
            FailureKind::Safety,
            "exploration over cap",
            Budgets::default(),
            2
        )));
    }

    #[test]
    fn test_enforce_runs_action_on_go() {
        let decision = Decision::go(Budgets::default(), 1);
        let result = enforce(&decision, |x: u32| x * 2, 21).unwrap();
        assert_eq!(result, 42);
    }

    #[test]
    fn test_enforce_blocks_without_running_action() {
        let decision = Decision::halt(
            FailureKind::Exhaustion,
            "effort 0 <= min_effort 0.05",
            Budgets::default(),
            9,
        );
        let mut ran = false;
        let result: Result<(), _> = enforce(
            &decision,
            |ran: &mut bool| {
                *ran = true;
            },
            &mut ran,
        );
        let err = result.unwrap_err();
        assert!(!ran);
        assert_eq!(err.failure, FailureKind::Exhaustion);
        assert_eq!(err.step, 9);
    }

    #[test]
    fn test_enforce_does_not_swallow_action_errors() {
        let decision = Decision::go(Budgets::default(), 1);
        let result = enforce(&decision, |(): ()| -> Result<(), &str> { Err("boom") }, ());
        // The outer enforce succeeded; the action's own error is returned
        // to the caller untouched.
        assert_eq!(result.unwrap(), Err("boom"));
    }

    #[test]
    fn test_govern_steps_then_runs() {
        let mut kernel = Kernel::new("agent-1", Profile::balanced()).with_contracts(false);
        let out = govern(
            &mut kernel,
            "echo",
            &serde_json::json!({"v": 1}),
            &Signals::new(0.9, 0.0, 0.0),
            |x: u32| x + 1,
            1,
        )
        .unwrap();
        assert_eq!(out, 2);
        assert_eq!(kernel.state().step_index, 1);
    }

    #[test]
    fn test_govern_blocks_on_halted_kernel() {
        let mut profile = Profile::balanced();
        profile.limits.max_steps = 1;
        let mut kernel = Kernel::new("agent-1", profile).with_contracts(false);
        let signals = Signals::new(0.9, 0.0, 0.0);
        let first: Result<u32, _> = govern(&mut kernel, "t", &Value::Null, &signals, |x| x, 1);
        assert!(matches!(first, Err(GovernorError::Blocked(_))));

        let mut ran = false;
        let second: Result<(), _> = govern(
            &mut kernel,
            "t",
            &Value::Null,
            &signals,
            |ran: &mut bool| *ran = true,
            &mut ran,
        );
        assert!(second.is_err());
        assert!(!ran);
    }
}
