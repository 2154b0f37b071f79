//! Configuration: server settings and governance policy loading.

pub mod loader;

pub use loader::{ConfigLoader, PolicyError, WardenConfig, AUDIT_PATH_ENV_VAR};
