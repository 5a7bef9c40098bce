//! Transport implementations.
//!
//! - `inmemory`: every endpoint lives in one process (tests, local playground)

pub mod inmemory;

pub use inmemory::{InMemoryNetwork, InMemoryTransport};
