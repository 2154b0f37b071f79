//! Ring buffer of recent effective rewards and effort drains.
//!
//! Consumed only by stagnation detection; nothing else reads history.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// One step's contribution to the stagnation window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    /// Effective (trust-gated) reward observed that step.
    pub reward: f64,
    /// Effort drained that step (`effort_before - effort_after`).
    pub effort_drain: f64,
}

/// Fixed-capacity record of the last `window` samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepHistory {
    window: usize,
    samples: VecDeque<HistorySample>,
}

impl StepHistory {
    /// An empty history with the given window size.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            samples: VecDeque::with_capacity(window),
        }
    }

    /// Append a sample, dropping the oldest beyond the window.
    pub fn push(&mut self, reward: f64, effort_drain: f64) {
        if self.window == 0 {
            return;
        }
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(HistorySample {
            reward,
            effort_drain,
        });
    }

    /// Whether the window is fully populated.
    pub fn is_full(&self) -> bool {
        self.window > 0 && self.samples.len() == self.window
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples are held.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean effective reward over the held samples; `0.0` when empty.
    pub fn mean_reward(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(|s| s.reward).sum::<f64>() / self.samples.len() as f64
    }

    /// Mean effort drain over the held samples; `0.0` when empty.
    pub fn mean_effort_drain(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(|s| s.effort_drain).sum::<f64>() / self.samples.len() as f64
    }
}
