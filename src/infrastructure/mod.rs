//! Infrastructure layer
//!
//! Adapters to the outside world: configuration, logging, the durable audit
//! chain, and the HTTP enforcement boundary.

pub mod audit;
pub mod config;
pub mod http;
pub mod logging;
