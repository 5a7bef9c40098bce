//! Peer-mesh synchronization engine for serverless chat rooms.
//!
//! One participant's transport address doubles as the room's rendezvous
//! point (the anchor). Everyone else dials it, receives a backfill of the
//! message log and roster, and then dials the remaining peers directly.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
