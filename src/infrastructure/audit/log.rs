//! Durable append-only audit log.
//!
//! One writer per file. Each append builds the next chain record, writes it
//! as a single line, and flushes plus fsyncs before acknowledging: an entry
//! that is not durable is never acknowledged, and a failed append leaves the
//! in-memory chain head untouched so the caller can roll the step back.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

use crate::domain::errors::AuditError;
use crate::domain::models::Signals;

use super::chain::{verify_record, AuditEntry, DecisionSnapshot, GENESIS_HASH};

/// Everything an append needs beyond chain bookkeeping.
#[derive(Debug, Clone)]
pub struct NewRecord {
    /// Kernel the record belongs to.
    pub agent_id: String,
    /// Kernel step index.
    pub step: u64,
    /// Intended action name.
    pub action: String,
    /// SHA-256 of the action's canonical parameters.
    pub params_hash: String,
    /// Raw signals submitted with the step.
    pub signals: Signals,
    /// Frozen decision fields.
    pub decision: DecisionSnapshot,
    /// Tool error observed after a GO decision, if any.
    pub execution_error: Option<String>,
}

/// Chain summary exposed to the HTTP surface and CLI.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AuditSummary {
    /// Number of records in the chain.
    pub entries: u64,
    /// `entry_hash` of the newest record; [`GENESIS_HASH`] when empty.
    pub head_hash: String,
}

/// Single-writer handle over one audit file.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    file: File,
    next_seq: u64,
    head_hash: String,
}

impl AuditLog {
    /// Start a fresh chain, truncating anything at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        Ok(Self {
            path,
            file,
            next_seq: 0,
            head_hash: GENESIS_HASH.to_string(),
        })
    }

    /// Resume an existing chain, verifying it end to end first.
    ///
    /// A missing file starts a fresh chain. A chain that fails verification
    /// is refused; resuming onto a tampered log would launder the tampering.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Self::create(path);
        }
        let summary = verify(&path)?;
        let file = OpenOptions::new().append(true).open(&path)?;
        Ok(Self {
            path,
            file,
            next_seq: summary.entries,
            head_hash: summary.head_hash,
        })
    }

    /// Append one record; returns its sequence number once durable.
    pub fn append(&mut self, record: NewRecord) -> Result<u64, AuditError> {
        let entry = AuditEntry {
            seq: self.next_seq,
            timestamp: Utc::now(),
            agent_id: record.agent_id,
            step: record.step,
            action: record.action,
            params_hash: record.params_hash,
            signals: record.signals,
            decision: record.decision,
            execution_error: record.execution_error,
            prev_hash: self.head_hash.clone(),
            entry_hash: String::new(),
        }
        .seal()?;

        let mut line = entry.to_canonical_line()?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        self.file.sync_data()?;

        let seq = entry.seq;
        self.head_hash = entry.entry_hash;
        self.next_seq += 1;
        Ok(seq)
    }

    /// `entry_hash` of the newest record.
    pub fn head_hash(&self) -> &str {
        &self.head_hash
    }

    /// Number of records written.
    pub fn entries(&self) -> u64 {
        self.next_seq
    }

    /// Current chain summary.
    pub fn summary(&self) -> AuditSummary {
        AuditSummary {
            entries: self.next_seq,
            head_hash: self.head_hash.clone(),
        }
    }

    /// Location of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Verify a chain file end to end.
///
/// Returns the summary on success; on failure the error carries the lowest
/// offending sequence number.
pub fn verify(path: impl AsRef<Path>) -> Result<AuditSummary, AuditError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut prev_hash = GENESIS_HASH.to_string();
    let mut entries: u64 = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let seq = index as u64;
        let value: Value = serde_json::from_str(&line).map_err(|e| AuditError::Malformed {
            seq,
            detail: e.to_string(),
        })?;
        prev_hash = verify_record(&value, seq, &prev_hash)?;
        entries += 1;
    }

    Ok(AuditSummary {
        entries,
        head_hash: prev_hash,
    })
}
