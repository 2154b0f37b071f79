//! Multi-agent coordination: shared budget pools and halt cascades.
//!
//! A [`SharedBudgetPool`] is a centralized ledger dispensing effort and risk
//! to member kernels; a denied draw maps to the matching budget halt at the
//! requesting kernel. The [`CascadeDetector`] tracks a directed neighbor
//! graph and, when any member halts, enqueues preventive halts for every
//! agent reachable from it. Each structure is serialized by a single mutex,
//! which is the whole concurrency story for cross-kernel state.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::FailureKind;

/// Which shared budget a draw is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetKind {
    /// Shared effort capacity.
    Effort,
    /// Shared risk capacity.
    Risk,
}

/// Per-member consumption record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MemberDraw {
    /// Effort drawn so far.
    pub effort: f64,
    /// Risk drawn so far.
    pub risk: f64,
}

#[derive(Debug)]
struct PoolLedger {
    effort_capacity: f64,
    risk_capacity: f64,
    members: HashSet<String>,
    per_member_draw: HashMap<String, MemberDraw>,
}

/// Centralized budget ledger shared by a group of kernels.
#[derive(Debug)]
pub struct SharedBudgetPool {
    pool_id: Uuid,
    ledger: Mutex<PoolLedger>,
}

impl SharedBudgetPool {
    /// A pool with the given total capacities.
    pub fn new(effort_capacity: f64, risk_capacity: f64) -> Self {
        Self {
            pool_id: Uuid::new_v4(),
            ledger: Mutex::new(PoolLedger {
                effort_capacity,
                risk_capacity,
                members: HashSet::new(),
                per_member_draw: HashMap::new(),
            }),
        }
    }

    /// Stable identifier of this pool.
    pub fn pool_id(&self) -> Uuid {
        self.pool_id
    }

    /// Register a member agent. Idempotent.
    pub fn add_member(&self, agent_id: &str) {
        let mut ledger = self.ledger.lock().expect("pool mutex poisoned");
        ledger.members.insert(agent_id.to_string());
        ledger
            .per_member_draw
            .entry(agent_id.to_string())
            .or_default();
    }

    /// Atomically draw `amount` of `kind` for `agent_id`.
    ///
    /// Grants and records the draw when the remaining capacity covers it;
    /// otherwise leaves the ledger untouched and returns `false`. Unknown
    /// agents are denied outright.
    pub fn request(&self, agent_id: &str, kind: BudgetKind, amount: f64) -> bool {
        if !amount.is_finite() || amount < 0.0 {
            return false;
        }
        let mut ledger = self.ledger.lock().expect("pool mutex poisoned");
        if !ledger.members.contains(agent_id) {
            return false;
        }
        let capacity = match kind {
            BudgetKind::Effort => &mut ledger.effort_capacity,
            BudgetKind::Risk => &mut ledger.risk_capacity,
        };
        if *capacity < amount {
            return false;
        }
        *capacity -= amount;
        let draw = ledger
            .per_member_draw
            .entry(agent_id.to_string())
            .or_default();
        match kind {
            BudgetKind::Effort => draw.effort += amount,
            BudgetKind::Risk => draw.risk += amount,
        }
        true
    }

    /// Remaining capacity for `kind`.
    pub fn remaining(&self, kind: BudgetKind) -> f64 {
        let ledger = self.ledger.lock().expect("pool mutex poisoned");
        match kind {
            BudgetKind::Effort => ledger.effort_capacity,
            BudgetKind::Risk => ledger.risk_capacity,
        }
    }

    /// Consumption recorded for one member.
    pub fn draw_of(&self, agent_id: &str) -> MemberDraw {
        let ledger = self.ledger.lock().expect("pool mutex poisoned");
        ledger
            .per_member_draw
            .get(agent_id)
            .copied()
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct CascadeState {
    neighbors: HashMap<String, HashSet<String>>,
    pending: HashMap<String, String>,
    halted: HashSet<String>,
}

/// Directed halt-propagation graph.
///
/// When a member halts, every agent reachable from it receives a preventive
/// halt that its kernel consumes on its next step. Propagation marks visited
/// agents, so cyclic graphs terminate and each agent halts at most once.
#[derive(Debug, Default)]
pub struct CascadeDetector {
    state: Mutex<CascadeState>,
}

impl CascadeDetector {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directed edge: a halt of `from` cascades to `to`.
    pub fn link(&self, from: &str, to: &str) {
        let mut state = self.state.lock().expect("cascade mutex poisoned");
        state
            .neighbors
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    /// Record that `agent_id` halted with `failure` and propagate
    /// preventive halts to everything reachable from it.
    pub fn on_halt(&self, agent_id: &str, failure: FailureKind) {
        let mut state = self.state.lock().expect("cascade mutex poisoned");
        if !state.halted.insert(agent_id.to_string()) {
            return;
        }
        let reason = format!("cascade from {agent_id}:{failure}");

        let mut queue: VecDeque<String> = state
            .neighbors
            .get(agent_id)
            .map(|n| n.iter().cloned().collect())
            .unwrap_or_default();
        while let Some(next) = queue.pop_front() {
            if state.halted.contains(&next) || state.pending.contains_key(&next) {
                continue;
            }
            state.pending.insert(next.clone(), reason.clone());
            if let Some(onward) = state.neighbors.get(&next) {
                queue.extend(onward.iter().cloned());
            }
        }
    }

    /// Consume the pending preventive halt for `agent_id`, if any.
    ///
    /// The agent is marked halted when a pending entry is taken, so repeat
    /// cascades cannot re-halt it.
    pub fn take_pending(&self, agent_id: &str) -> Option<String> {
        let mut state = self.state.lock().expect("cascade mutex poisoned");
        let reason = state.pending.remove(agent_id)?;
        state.halted.insert(agent_id.to_string());
        Some(reason)
    }

    /// Whether a preventive halt is queued for `agent_id`.
    pub fn has_pending(&self, agent_id: &str) -> bool {
        self.state
            .lock()
            .expect("cascade mutex poisoned")
            .pending
            .contains_key(agent_id)
    }
}

/// Shared coordination context handed to member kernels.
#[derive(Debug, Default)]
pub struct Coordinator {
    pool: Option<SharedBudgetPool>,
    cascade: CascadeDetector,
}

impl Coordinator {
    /// A coordinator with no shared pool (cascade-only).
    pub fn new() -> Self {
        Self::default()
    }

    /// A coordinator dispensing from a shared pool.
    pub fn with_pool(pool: SharedBudgetPool) -> Self {
        Self {
            pool: Some(pool),
            cascade: CascadeDetector::new(),
        }
    }

    /// The shared pool, when configured.
    pub fn pool(&self) -> Option<&SharedBudgetPool> {
        self.pool.as_ref()
    }

    /// The cascade graph.
    pub fn cascade(&self) -> &CascadeDetector {
        &self.cascade
    }

    /// Register an agent with the pool (when present).
    pub fn register(&self, agent_id: &str) {
        if let Some(pool) = &self.pool {
            pool.add_member(agent_id);
        }
    }

    /// Draw `amount` of `kind` for `agent_id`; `true` when no pool is
    /// configured (local budgets govern alone).
    pub fn request(&self, agent_id: &str, kind: BudgetKind, amount: f64) -> bool {
        match &self.pool {
            Some(pool) => pool.request(agent_id, kind, amount),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_grants_until_exhausted() {
        let pool = SharedBudgetPool::new(0.1, 1.0);
        pool.add_member("a");
        assert!(pool.request("a", BudgetKind::Effort, 0.06));
        assert!(!pool.request("a", BudgetKind::Effort, 0.06));
        assert!((pool.remaining(BudgetKind::Effort) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_pool_denies_unknown_member() {
        let pool = SharedBudgetPool::new(1.0, 1.0);
        assert!(!pool.request("ghost", BudgetKind::Effort, 0.01));
    }

    #[test]
    fn test_pool_denial_leaves_ledger_untouched() {
        let pool = SharedBudgetPool::new(0.05, 1.0);
        pool.add_member("a");
        assert!(!pool.request("a", BudgetKind::Effort, 0.06));
        assert!((pool.remaining(BudgetKind::Effort) - 0.05).abs() < 1e-12);
        assert_eq!(pool.draw_of("a").effort, 0.0);
    }

    #[test]
    fn test_pool_records_per_member_draw() {
        let pool = SharedBudgetPool::new(1.0, 1.0);
        pool.add_member("a");
        pool.add_member("b");
        assert!(pool.request("a", BudgetKind::Risk, 0.2));
        assert!(pool.request("b", BudgetKind::Risk, 0.3));
        assert!((pool.draw_of("a").risk - 0.2).abs() < 1e-12);
        assert!((pool.draw_of("b").risk - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_pool_rejects_non_finite_amounts() {
        let pool = SharedBudgetPool::new(1.0, 1.0);
        pool.add_member("a");
        assert!(!pool.request("a", BudgetKind::Effort, f64::NAN));
        assert!(!pool.request("a", BudgetKind::Effort, -0.1));
    }

    #[test]
    fn test_cascade_reaches_direct_neighbor() {
        let cascade = CascadeDetector::new();
        cascade.link("a", "b");
        cascade.on_halt("a", FailureKind::Exhaustion);
        let reason = cascade.take_pending("b").unwrap();
        assert_eq!(reason, "cascade from a:EXHAUSTION");
    }

    #[test]
    fn test_cascade_transitive() {
        let cascade = CascadeDetector::new();
        cascade.link("a", "b");
        cascade.link("b", "c");
        cascade.on_halt("a", FailureKind::Overrisk);
        assert!(cascade.has_pending("b"));
        assert!(cascade.has_pending("c"));
    }

    #[test]
    fn test_cascade_cycle_terminates_and_is_idempotent() {
        let cascade = CascadeDetector::new();
        cascade.link("a", "b");
        cascade.link("b", "a");
        cascade.on_halt("a", FailureKind::Safety);
        assert!(cascade.take_pending("b").is_some());
        // The origin never receives its own cascade.
        assert!(cascade.take_pending("a").is_none());
        // Repeat halt of the same agent is a no-op.
        cascade.on_halt("a", FailureKind::Safety);
        assert!(cascade.take_pending("b").is_none());
    }

    #[test]
    fn test_taken_agent_not_rehalted() {
        let cascade = CascadeDetector::new();
        cascade.link("a", "b");
        cascade.link("c", "b");
        cascade.on_halt("a", FailureKind::Exhaustion);
        assert!(cascade.take_pending("b").is_some());
        cascade.on_halt("c", FailureKind::Exhaustion);
        assert!(cascade.take_pending("b").is_none());
    }

    #[test]
    fn test_coordinator_without_pool_always_grants() {
        let coordinator = Coordinator::new();
        assert!(coordinator.request("anyone", BudgetKind::Effort, 10.0));
    }

    #[test]
    fn test_coordinator_with_pool_delegates() {
        let coordinator = Coordinator::with_pool(SharedBudgetPool::new(0.5, 0.5));
        coordinator.register("a");
        assert!(coordinator.request("a", BudgetKind::Risk, 0.4));
        assert!(!coordinator.request("a", BudgetKind::Risk, 0.2));
    }
}
