//! Builders that wire configuration into running components.

/// Engine assembly from configuration.
pub mod engine_builder;

pub use engine_builder::{build_engine, DispatchEngine};
