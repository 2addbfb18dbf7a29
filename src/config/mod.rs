//! Configuration for the dispatch engine.

/// Engine configuration types and loaders.
pub mod engine;

pub use engine::{
    BusBackendConfig, ClaimSettings, DispatchSettings, EngineConfig, StoreBackendConfig,
};
