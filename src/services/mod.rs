//! Application services for the warden governor.

pub mod capture;
pub mod contracts;
pub mod coordinator;
pub mod enforcement;
pub mod evaluation;
pub mod kernel;
pub mod mechanics;

pub use capture::{ExecutionFacts, SignalSynthesizer};
pub use coordinator::{BudgetKind, CascadeDetector, Coordinator, MemberDraw, SharedBudgetPool};
pub use kernel::Kernel;
