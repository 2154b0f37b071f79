//! Hash-chained, append-only audit log.
//!
//! Tamper evidence comes from chaining: each record embeds the SHA-256 of
//! its predecessor, so editing, removing, or inserting any record breaks
//! verification at the lowest affected sequence number.

pub mod chain;
pub mod log;

pub use chain::{hash_params, sha256_hex, AuditEntry, DecisionSnapshot, GENESIS_HASH};
pub use log::{verify, AuditLog, AuditSummary, NewRecord};
