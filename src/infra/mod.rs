//! Infrastructure adapters for stores and the notification bus.

pub mod bus;
pub mod store;

pub use bus::InMemoryBus;
pub use store::{InMemoryStore, PostgresStore};
