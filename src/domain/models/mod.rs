//! Domain models
//!
//! Pure domain entities with validation rules. Framework-agnostic; the
//! update mechanics and transports live elsewhere.

pub mod budgets;
pub mod decision;
pub mod history;
pub mod pressures;
pub mod profile;
pub mod signals;
pub mod state;

pub use budgets::Budgets;
pub use decision::{Decision, FailureKind};
pub use history::{HistorySample, StepHistory};
pub use pressures::Pressures;
pub use profile::{Limits, Profile, Rates, Stagnation};
pub use signals::{clamp_signal, EffectiveSignals, Signals};
pub use state::KernelState;
