//! Utilities shared by every meshchat package: logger setup and clocks.

pub mod logger;
pub mod time;
