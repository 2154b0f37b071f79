//! Optional runtime invariant checker.
//!
//! Enabled process-wide by `GOVERNANCE_CONTRACTS_ENABLED=1`, read once at
//! first use and frozen for the life of the process. Kernels capture the
//! setting at construction, so flipping the variable mid-run has no effect.
//!
//! Checks cover budget monotonicity between consecutive states, halt
//! irreversibility, and kernel isolation (no tool handler may run while a
//! kernel step is on the stack).

use std::cell::Cell;
use std::sync::OnceLock;

use crate::domain::errors::ContractViolation;
use crate::domain::models::{KernelState, Profile};

static ENABLED: OnceLock<bool> = OnceLock::new();

/// Name of the toggle environment variable.
pub const CONTRACTS_ENV_VAR: &str = "GOVERNANCE_CONTRACTS_ENABLED";

/// Interpret the raw environment value: exactly `"1"` enables contracts.
pub fn parse_enabled(value: Option<&str>) -> bool {
    value == Some("1")
}

/// Whether contracts are enabled for this process.
///
/// The environment is consulted on the first call only.
pub fn enabled() -> bool {
    *ENABLED.get_or_init(|| parse_enabled(std::env::var(CONTRACTS_ENV_VAR).ok().as_deref()))
}

thread_local! {
    static KERNEL_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// RAII marker held while a kernel step is executing on this thread.
///
/// Tool invocation paths call [`assert_outside_kernel`]; if a step is on the
/// stack the isolation contract has been broken.
pub struct KernelGuard(());

impl KernelGuard {
    /// Enter the kernel's code path.
    pub fn enter() -> Self {
        KERNEL_DEPTH.with(|d| d.set(d.get() + 1));
        Self(())
    }
}

impl Drop for KernelGuard {
    fn drop(&mut self) {
        KERNEL_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Fail if called while a kernel step is executing on this thread.
pub fn assert_outside_kernel() -> Result<(), ContractViolation> {
    if KERNEL_DEPTH.with(Cell::get) > 0 {
        Err(ContractViolation::HandlerInvokedInKernel)
    } else {
        Ok(())
    }
}

/// Check budget monotonicity between the states bracketing one step.
///
/// - effort must not increase;
/// - persistence may rise at most by the profile's per-reward gain;
/// - consumed risk must not decrease.
pub fn check_step(
    before: &KernelState,
    after: &KernelState,
    profile: &Profile,
) -> Result<(), ContractViolation> {
    if after.budgets.effort > before.budgets.effort {
        return Err(ContractViolation::EffortIncreased {
            before: before.budgets.effort,
            after: after.budgets.effort,
        });
    }

    let ceiling = profile.rates.persistence_gain_per_reward;
    if after.budgets.persistence > before.budgets.persistence + ceiling {
        return Err(ContractViolation::PersistenceJumped {
            before: before.budgets.persistence,
            after: after.budgets.persistence,
            ceiling,
        });
    }

    if after.budgets.consumed_risk() < before.budgets.consumed_risk() {
        return Err(ContractViolation::RiskRefunded {
            before: before.budgets.consumed_risk(),
            after: after.budgets.consumed_risk(),
        });
    }

    if before.halted && !after.halted {
        return Err(ContractViolation::HaltReversed);
    }

    Ok(())
}
