//! Hash-chained audit records.
//!
//! Every record serializes to a single canonical JSON line with keys in
//! lexicographic order; `entry_hash` is the SHA-256 of that line with the
//! `entry_hash` key removed, and `prev_hash` embeds the predecessor's
//! `entry_hash`. Canonical ordering falls out of `serde_json::Value`'s
//! sorted map representation, so hashing and persistence share one code
//! path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::errors::AuditError;
use crate::domain::models::{Budgets, Decision, FailureKind, Signals};

/// `prev_hash` of the first record in a chain.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// SHA-256 of `bytes`, hex-encoded.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hash of a tool's parameters: SHA-256 over their canonical serialization.
pub fn hash_params(params: &Value) -> String {
    // Value's map is key-sorted, so to_string is already canonical.
    sha256_hex(params.to_string().as_bytes())
}

/// The decision fields frozen into an audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionSnapshot {
    /// Whether execution was (or remains) refused.
    pub halted: bool,
    /// Halt classification, when halted.
    pub failure: Option<FailureKind>,
    /// Human-readable cause, when halted or blocked.
    pub reason: Option<String>,
    /// Budgets at decision time.
    pub budgets: Budgets,
}

impl From<&Decision> for DecisionSnapshot {
    fn from(decision: &Decision) -> Self {
        Self {
            halted: decision.halted,
            failure: decision.failure,
            reason: decision.reason.clone(),
            budgets: decision.budgets,
        }
    }
}

/// One record of the append-only chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Strictly monotone record number, starting at 0.
    pub seq: u64,
    /// Wall-clock time the record was written.
    pub timestamp: DateTime<Utc>,
    /// Kernel the record belongs to.
    pub agent_id: String,
    /// Kernel step index the record refers to.
    pub step: u64,
    /// Name of the intended action.
    pub action: String,
    /// SHA-256 of the action's canonical parameters.
    pub params_hash: String,
    /// Raw signals submitted with the step.
    pub signals: Signals,
    /// Frozen decision fields.
    pub decision: DecisionSnapshot,
    /// Error raised by the tool after a GO decision, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_error: Option<String>,
    /// `entry_hash` of the predecessor; [`GENESIS_HASH`] for seq 0.
    pub prev_hash: String,
    /// SHA-256 of this record's canonical bytes without this field.
    pub entry_hash: String,
}

impl AuditEntry {
    /// Canonical bytes the hash covers: the key-sorted JSON of this record
    /// with `entry_hash` removed.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, AuditError> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("entry_hash");
        }
        Ok(value.to_string().into_bytes())
    }

    /// Recompute the hash from the canonical bytes.
    pub fn compute_hash(&self) -> Result<String, AuditError> {
        Ok(sha256_hex(&self.canonical_bytes()?))
    }

    /// Fill in `entry_hash` from the current contents.
    pub fn seal(mut self) -> Result<Self, AuditError> {
        self.entry_hash = self.compute_hash()?;
        Ok(self)
    }

    /// The canonical single-line persistence form (key-sorted JSON).
    pub fn to_canonical_line(&self) -> Result<String, AuditError> {
        Ok(serde_json::to_value(self)?.to_string())
    }
}

/// Recompute and check one parsed record against its recorded hash and the
/// expected predecessor hash and sequence number.
pub fn verify_record(value: &Value, expected_seq: u64, prev_hash: &str) -> Result<String, AuditError> {
    let seq = value
        .get("seq")
        .and_then(Value::as_u64)
        .ok_or(AuditError::Malformed {
            seq: expected_seq,
            detail: "missing seq".to_string(),
        })?;
    if seq != expected_seq {
        return Err(AuditError::OutOfOrder {
            seq: expected_seq,
            found: seq,
        });
    }

    let recorded_prev = value
        .get("prev_hash")
        .and_then(Value::as_str)
        .ok_or(AuditError::Malformed {
            seq,
            detail: "missing prev_hash".to_string(),
        })?;
    if recorded_prev != prev_hash {
        return Err(AuditError::ChainBroken { seq });
    }

    let recorded_hash = value
        .get("entry_hash")
        .and_then(Value::as_str)
        .ok_or(AuditError::Malformed {
            seq,
            detail: "missing entry_hash".to_string(),
        })?
        .to_string();

    let mut without_hash = value.clone();
    if let Value::Object(map) = &mut without_hash {
        map.remove("entry_hash");
    }
    let recomputed = sha256_hex(without_hash.to_string().as_bytes());
    if recomputed != recorded_hash {
        return Err(AuditError::HashMismatch { seq });
    }

    Ok(recorded_hash)
}
