//! Plain-text metrics for the enforcement proxy.
//!
//! Counters live here; gauges are read straight off the kernel state at
//! render time so they can never drift from the source of truth.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::domain::models::{FailureKind, KernelState};

/// Step and halt counters.
#[derive(Debug, Default)]
pub struct Metrics {
    steps_total: AtomicU64,
    halts_by_reason: Mutex<BTreeMap<&'static str, u64>>,
}

impl Metrics {
    /// Fresh counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one kernel step.
    pub fn record_step(&self) {
        self.steps_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one halt transition.
    pub fn record_halt(&self, failure: FailureKind) {
        let mut halts = self.halts_by_reason.lock().expect("metrics mutex poisoned");
        *halts.entry(failure.as_str()).or_insert(0) += 1;
    }

    /// Steps counted so far.
    pub fn steps_total(&self) -> u64 {
        self.steps_total.load(Ordering::Relaxed)
    }

    /// Render the exposition text: one line per metric.
    pub fn render(&self, state: &KernelState) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "governance_steps_total {}", self.steps_total());
        let _ = writeln!(out, "governance_effort {}", state.budgets.effort);
        let _ = writeln!(out, "governance_risk {}", state.budgets.risk);
        {
            let halts = self.halts_by_reason.lock().expect("metrics mutex poisoned");
            for (reason, count) in halts.iter() {
                let _ = writeln!(out, "governance_halts_total{{reason=\"{reason}\"}} {count}");
            }
        }
        let _ = writeln!(out, "governance_persistence {}", state.budgets.persistence);
        let _ = writeln!(out, "governance_exploration {}", state.budgets.exploration);
        out
    }
}
