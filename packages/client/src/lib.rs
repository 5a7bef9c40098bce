//! Interactive playground for meshchat.
//!
//! Runs a whole room inside one process: the user is the anchor and
//! simulated peers can be added, driven and dropped from the prompt.

mod error;
mod formatter;
mod playground;
mod runner;
mod ui;

pub use error::ClientError;
pub use playground::{Command, Playground};
pub use runner::run_client;
