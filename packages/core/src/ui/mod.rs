//! Presentation boundary of the engine.
//!
//! `run_session` owns a `MeshSession` and applies transport events, user
//! commands and timer ticks one at a time. UIs talk to it through a
//! `SessionHandle` and read state from `SessionView` snapshots.

mod runner;
mod signal;
mod view;

pub use runner::{SessionCommand, SessionHandle, run_session, spawn_session};
pub use signal::shutdown_signal;
pub use view::SessionView;
