//! Signal synthesis from observed execution facts.
//!
//! Hosts that cannot produce explicit progress signals can wrap each tool
//! invocation and let this adapter derive a [`Signals`] record from what it
//! observed: how long the call took relative to expectation, whether it
//! errored, and how much the output size moved. The kernel itself never sees
//! a clock; everything time-shaped is folded into the signals here.

use std::time::{Duration, Instant};

use crate::domain::models::Signals;

/// Facts observed around one wrapped execution.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionFacts {
    /// Wall time the execution took.
    pub duration: Duration,
    /// Whether the execution raised an error.
    pub errored: bool,
    /// Size of the produced output, in bytes.
    pub output_bytes: usize,
}

/// Stateful synthesizer mapping execution facts onto the signal space.
///
/// - reward: 0 on error, otherwise shrinks as the call overruns its
///   expected duration;
/// - novelty: relative change in output size against the previous call;
/// - urgency: how far past the expected duration the call ran;
/// - trust: always 1, since the adapter observed the facts itself.
#[derive(Debug)]
pub struct SignalSynthesizer {
    expected_duration: Duration,
    last_output_bytes: Option<usize>,
}

impl SignalSynthesizer {
    /// A synthesizer calibrated to the expected per-call duration.
    pub fn new(expected_duration: Duration) -> Self {
        Self {
            expected_duration,
            last_output_bytes: None,
        }
    }

    /// Fold one execution's facts into a signal record.
    pub fn synthesize(&mut self, facts: &ExecutionFacts) -> Signals {
        let expected = self.expected_duration.as_secs_f64().max(f64::MIN_POSITIVE);
        let ratio = facts.duration.as_secs_f64() / expected;
        let urgency = (ratio - 1.0).clamp(0.0, 1.0);

        let novelty = match self.last_output_bytes {
            Some(last) => {
                let delta = facts.output_bytes.abs_diff(last) as f64;
                let base = facts.output_bytes.max(last).max(1) as f64;
                (delta / base).clamp(0.0, 1.0)
            }
            // First observation: everything is new.
            None => 1.0,
        };
        self.last_output_bytes = Some(facts.output_bytes);

        let reward = if facts.errored {
            0.0
        } else {
            (1.0 - 0.5 * urgency).clamp(0.0, 1.0)
        };

        Signals::with_trust(reward, novelty, urgency, 1.0)
    }

    /// Run `f`, observe it, and return its result with synthesized signals.
    ///
    /// Output size is taken from the serialized form of the success value.
    pub fn observe<T, E, F>(&mut self, f: F) -> (Result<T, E>, Signals)
    where
        T: serde::Serialize,
        F: FnOnce() -> Result<T, E>,
    {
        let started = Instant::now();
        let result = f();
        let duration = started.elapsed();

        let (errored, output_bytes) = match &result {
            Ok(value) => (
                false,
                serde_json::to_vec(value).map(|v| v.len()).unwrap_or(0),
            ),
            Err(_) => (true, 0),
        };
        let signals = self.synthesize(&ExecutionFacts {
            duration,
            errored,
            output_bytes,
        });
        (result, signals)
    }
}
