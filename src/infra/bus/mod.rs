//! Notification bus backends.

pub mod memory;

pub use memory::InMemoryBus;
