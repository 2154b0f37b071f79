//! Error taxonomy for the governor.
//!
//! Governed halts are not errors; they travel inside a [`Decision`]. The
//! types here cover the exceptional paths: blocked execution, contract
//! violations, audit failures, and their composition.
//!
//! [`Decision`]: crate::domain::models::Decision

use thiserror::Error;

use crate::domain::models::FailureKind;

/// Typed refusal raised by the enforcement boundary when an action is
/// attempted against a halted kernel.
#[derive(Debug, Clone, Error)]
#[error("action blocked: {failure}: {reason} (step {step})")]
pub struct BlockedError {
    /// The halt classification in force.
    pub failure: FailureKind,
    /// Human-readable halt cause.
    pub reason: String,
    /// Step index the kernel halted at.
    pub step: u64,
}

/// Runtime invariant violations detected by the optional contract checker.
///
/// Any of these forces the kernel into HALTED with failure `EXTERNAL`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ContractViolation {
    #[error("effort increased from {before} to {after} within a step")]
    EffortIncreased { before: f64, after: f64 },

    #[error(
        "persistence rose from {before} to {after}, above the {ceiling} per-step gain ceiling"
    )]
    PersistenceJumped {
        before: f64,
        after: f64,
        ceiling: f64,
    },

    #[error("consumed risk decreased from {before} to {after} within a step")]
    RiskRefunded { before: f64, after: f64 },

    #[error("halted flag cleared outside of reset()")]
    HaltReversed,

    #[error("tool handler invoked from inside the kernel step path")]
    HandlerInvokedInKernel,
}

/// Failures of the hash-chained audit log.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit record {seq} is not valid canonical JSON: {detail}")]
    Malformed { seq: u64, detail: String },

    #[error("audit record {seq} fails hash verification")]
    HashMismatch { seq: u64 },

    #[error("audit record {seq} breaks the chain: prev_hash does not match its predecessor")]
    ChainBroken { seq: u64 },

    #[error("audit record at position {seq} carries out-of-order seq {found}")]
    OutOfOrder { seq: u64, found: u64 },

    #[error("audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AuditError {
    /// Sequence number of the offending record, when the failure points at
    /// one.
    pub fn offending_seq(&self) -> Option<u64> {
        match self {
            Self::Malformed { seq, .. }
            | Self::HashMismatch { seq }
            | Self::ChainBroken { seq }
            | Self::OutOfOrder { seq, .. } => Some(*seq),
            Self::Io(_) | Self::Serialization(_) => None,
        }
    }
}

/// Top-level error type for kernel operations.
#[derive(Debug, Error)]
pub enum GovernorError {
    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),

    #[error(transparent)]
    Blocked(#[from] BlockedError),
}

/// Convenience alias used throughout the services layer.
pub type GovernorResult<T> = Result<T, GovernorError>;
