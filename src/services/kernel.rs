//! The governance kernel: one deterministic decision per intended step.
//!
//! `step()` evaluates the submitted signals, advances pressures and budgets
//! out of place, classifies against the halt predicates in a fixed priority
//! order, writes the audit record, and only then commits the new state. An
//! audit failure therefore rolls the whole step back; a host that cancels
//! mid-call observes either the full step or none of it.
//!
//! Once halted, a kernel is terminal: every further `step()` returns the
//! cached halt decision unchanged until a privileged `reset()`.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::errors::{GovernorError, GovernorResult};
use crate::domain::models::{Decision, FailureKind, KernelState, Profile, Signals};
use crate::infrastructure::audit::{hash_params, AuditLog, AuditSummary, DecisionSnapshot, NewRecord};
use crate::services::coordinator::{BudgetKind, Coordinator};
use crate::services::{contracts, evaluation, mechanics};

/// Action name recorded when a step is taken without a named action.
const UNNAMED_ACTION: &str = "step";

/// Deterministic per-agent governor.
pub struct Kernel {
    agent_id: String,
    profile: Profile,
    state: KernelState,
    terminal: Option<Decision>,
    audit: Option<AuditLog>,
    coordinator: Option<Arc<Coordinator>>,
    contracts_enabled: bool,
}

impl Kernel {
    /// A fresh kernel governed by `profile`.
    ///
    /// The contract toggle is sampled from the environment here and frozen
    /// for the kernel's lifetime.
    pub fn new(agent_id: impl Into<String>, profile: Profile) -> Self {
        Self {
            agent_id: agent_id.into(),
            state: KernelState::new(&profile),
            profile,
            terminal: None,
            audit: None,
            coordinator: None,
            contracts_enabled: contracts::enabled(),
        }
    }

    /// Attach an audit log; every decision will append exactly one record.
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Join a coordination group; registers this agent with its pool.
    pub fn with_coordinator(mut self, coordinator: Arc<Coordinator>) -> Self {
        coordinator.register(&self.agent_id);
        self.coordinator = Some(coordinator);
        self
    }

    /// Override the environment-derived contract toggle.
    pub fn with_contracts(mut self, enabled: bool) -> Self {
        self.contracts_enabled = enabled;
        self
    }

    /// This kernel's agent identifier.
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// The immutable profile.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Current state snapshot.
    pub fn state(&self) -> &KernelState {
        &self.state
    }

    /// Whether the kernel is terminal.
    pub fn is_halted(&self) -> bool {
        self.state.halted
    }

    /// Chain summary of the attached audit log, if any.
    pub fn audit_summary(&self) -> Option<AuditSummary> {
        self.audit.as_ref().map(AuditLog::summary)
    }

    /// Take one governed step with an unnamed action.
    pub fn step(&mut self, signals: &Signals) -> GovernorResult<Decision> {
        self.step_for_action(UNNAMED_ACTION, &Value::Null, signals)
    }

    /// Take one governed step on behalf of a named action.
    pub fn step_for_action(
        &mut self,
        action: &str,
        params: &Value,
        signals: &Signals,
    ) -> GovernorResult<Decision> {
        let _guard = contracts::KernelGuard::enter();

        if let Some(terminal) = &self.terminal {
            return Ok(terminal.clone());
        }

        // Preventive halt queued by a neighbor's failure.
        if let Some(coordinator) = self.coordinator.clone() {
            if let Some(reason) = coordinator.cascade().take_pending(&self.agent_id) {
                let mut next = self.state.clone();
                next.step_index += 1;
                let decision =
                    Decision::halt(FailureKind::External, reason, next.budgets, next.step_index);
                return self.commit(action, params, signals, next, decision);
            }
        }

        let effective = evaluation::evaluate(signals, &self.profile);

        let mut next = self.state.clone();
        next.step_index += 1;
        next.low_trust_streak =
            evaluation::update_trust_streak(next.low_trust_streak, effective.trust, &self.profile);

        let effort_before = next.budgets.effort;
        let consumed_before = next.budgets.consumed_risk();
        mechanics::advance(&mut next, &effective, &self.profile);

        let verdict = arithmetic_verdict(&next)
            .or_else(|| self.pool_verdict(&next, effort_before, consumed_before))
            .or_else(|| classify(&next, &self.profile));

        let decision = match verdict {
            Some((failure, reason)) => {
                Decision::halt(failure, reason, next.budgets, next.step_index)
            }
            None => Decision::go(next.budgets, next.step_index),
        };

        if self.contracts_enabled {
            if let Err(violation) = contracts::check_step(&self.state, &next, &self.profile) {
                let reason = format!("contract violation: {violation}");
                warn!(agent_id = %self.agent_id, %reason, "forcing halt");
                let forced = Decision::halt(
                    FailureKind::External,
                    reason,
                    next.budgets,
                    next.step_index,
                );
                self.commit(action, params, signals, next, forced)?;
                return Err(GovernorError::Contract(violation));
            }
        }

        self.commit(action, params, signals, next, decision)
    }

    /// Clear the kernel back to its initial running state. Privileged.
    pub fn reset(&mut self) {
        info!(agent_id = %self.agent_id, "kernel reset");
        self.state = KernelState::new(&self.profile);
        self.terminal = None;
    }

    /// Record a refused request (e.g. a malformed proxy body) without
    /// stepping the kernel.
    pub fn log_blocked(&mut self, action: &str, reason: &str) -> GovernorResult<()> {
        let snapshot = DecisionSnapshot {
            halted: true,
            failure: Some(FailureKind::External),
            reason: Some(format!("blocked: {reason}")),
            budgets: self.state.budgets,
        };
        if let Some(audit) = &mut self.audit {
            audit.append(NewRecord {
                agent_id: self.agent_id.clone(),
                step: self.state.step_index,
                action: action.to_string(),
                params_hash: hash_params(&Value::Null),
                signals: Signals::zero(),
                decision: snapshot,
                execution_error: None,
            })?;
        }
        Ok(())
    }

    /// Record a tool failure observed after a GO decision.
    pub fn log_execution_error(
        &mut self,
        action: &str,
        params: &Value,
        decision: &Decision,
        error: &str,
    ) -> GovernorResult<()> {
        if let Some(audit) = &mut self.audit {
            audit.append(NewRecord {
                agent_id: self.agent_id.clone(),
                step: decision.step_index,
                action: action.to_string(),
                params_hash: hash_params(params),
                signals: Signals::zero(),
                decision: DecisionSnapshot::from(decision),
                execution_error: Some(error.to_string()),
            })?;
        }
        Ok(())
    }

    /// Shared-pool draws for this step's consumption; a denial maps to the
    /// matching budget halt.
    fn pool_verdict(
        &self,
        next: &KernelState,
        effort_before: f64,
        consumed_before: f64,
    ) -> Option<(FailureKind, String)> {
        let coordinator = self.coordinator.as_ref()?;
        coordinator.pool()?;

        let effort_draw = (effort_before - next.budgets.effort).max(0.0);
        if !coordinator.request(&self.agent_id, BudgetKind::Effort, effort_draw) {
            return Some((
                FailureKind::Exhaustion,
                format!("shared effort pool denied draw of {effort_draw}"),
            ));
        }
        let risk_draw = (next.budgets.consumed_risk() - consumed_before).max(0.0);
        if !coordinator.request(&self.agent_id, BudgetKind::Risk, risk_draw) {
            return Some((
                FailureKind::Overrisk,
                format!("shared risk pool denied draw of {risk_draw}"),
            ));
        }
        None
    }

    /// Durably audit, then commit the step. On audit failure nothing
    /// changes: the caller sees the error and the old state stands.
    fn commit(
        &mut self,
        action: &str,
        params: &Value,
        signals: &Signals,
        mut next: KernelState,
        decision: Decision,
    ) -> GovernorResult<Decision> {
        if let Some(audit) = &mut self.audit {
            audit.append(NewRecord {
                agent_id: self.agent_id.clone(),
                step: decision.step_index,
                action: action.to_string(),
                params_hash: hash_params(params),
                signals: *signals,
                decision: DecisionSnapshot::from(&decision),
                execution_error: None,
            })?;
        }

        if decision.halted {
            next.halted = true;
            next.failure = decision.failure;
            next.reason = decision.reason.clone();
        }
        self.state = next;

        if decision.halted {
            info!(
                agent_id = %self.agent_id,
                failure = %decision.failure.map(|f| f.as_str()).unwrap_or(""),
                step = decision.step_index,
                "kernel halted"
            );
            self.terminal = Some(decision.clone());
            if let Some(coordinator) = &self.coordinator {
                if let Some(failure) = decision.failure {
                    coordinator.cascade().on_halt(&self.agent_id, failure);
                }
            }
        } else {
            debug!(agent_id = %self.agent_id, step = decision.step_index, "GO");
        }

        Ok(decision)
    }
}

/// Fatal arithmetic check: a malformed profile can push state to NaN or
/// infinity, which halts with `EXTERNAL` rather than propagating.
fn arithmetic_verdict(state: &KernelState) -> Option<(FailureKind, String)> {
    state.first_non_finite().map(|field| {
        (
            FailureKind::External,
            format!("arithmetic fault: non-finite {field}"),
        )
    })
}

/// The halt predicates, in their fixed priority order. First match wins.
fn classify(state: &KernelState, profile: &Profile) -> Option<(FailureKind, String)> {
    let budgets = &state.budgets;
    let limits = &profile.limits;

    if budgets.exploration > limits.max_exploration {
        return Some((
            FailureKind::Safety,
            format!(
                "exploration {} > max_exploration {}",
                budgets.exploration, limits.max_exploration
            ),
        ));
    }

    let consumed = budgets.consumed_risk();
    if consumed > limits.max_risk {
        return Some((
            FailureKind::Overrisk,
            format!("consumed risk {} > max_risk {}", consumed, limits.max_risk),
        ));
    }

    if budgets.effort <= limits.min_effort {
        return Some((
            FailureKind::Exhaustion,
            format!(
                "effort {} <= min_effort {}",
                budgets.effort, limits.min_effort
            ),
        ));
    }

    let stagnation = &profile.stagnation;
    if state.history.is_full() {
        let mean_reward = state.history.mean_reward();
        let mean_drain = state.history.mean_effort_drain();
        if mean_reward < stagnation.reward_ceiling && mean_drain > stagnation.effort_floor {
            return Some((
                FailureKind::Stagnation,
                format!(
                    "mean reward {} < reward_ceiling {} with mean effort drain {} > effort_floor {} over {} steps",
                    mean_reward,
                    stagnation.reward_ceiling,
                    mean_drain,
                    stagnation.effort_floor,
                    stagnation.window
                ),
            ));
        }
    }

    if state.step_index >= limits.max_steps {
        return Some((
            FailureKind::External,
            format!(
                "step {} >= max_steps {}",
                state.step_index, limits.max_steps
            ),
        ));
    }

    if evaluation::trust_collapsed(state.low_trust_streak, profile) {
        return Some((
            FailureKind::TrustCollapse,
            format!(
                "trust below {} for {} consecutive steps",
                profile.rates.trust_epsilon, state.low_trust_streak
            ),
        ));
    }

    None
}
