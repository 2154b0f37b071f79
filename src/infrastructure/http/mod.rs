//! HTTP enforcement boundary (axum).

pub mod handlers;
pub mod metrics;
pub mod server;

pub use handlers::{AppState, ToolRegistry};
pub use metrics::Metrics;
pub use server::{build_router, serve};
