//! Warden - Runtime Governor for Autonomous Agents
//!
//! A deterministic governor that sits between an agent loop and its
//! execution surface:
//! - Governance kernel with bounded budgets and a cycle-aware halt predicate
//! - In-process and HTTP enforcement boundaries, fail-closed
//! - Hash-chained, tamper-evident audit log
//! - Multi-agent coordination: shared budget pools and halt cascades

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export key types for convenience
pub use domain::errors::{AuditError, BlockedError, ContractViolation, GovernorError};
pub use domain::models::{Budgets, Decision, FailureKind, Profile, Signals};
pub use infrastructure::audit::{AuditLog, AuditSummary};
pub use services::{Coordinator, Kernel, SharedBudgetPool};
