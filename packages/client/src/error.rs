//! Error types for the meshchat playground.

use meshchat_core::domain::{SessionError, ValueObjectError};
use thiserror::Error;

/// Playground-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The prompt line could not be parsed
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// No simulated peer with this name
    #[error("No peer named '{0}'")]
    UnknownPeer(String),

    /// A simulated peer with this name is already running
    #[error("A peer named '{0}' is already in the room")]
    PeerExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValueObjectError),

    #[error(transparent)]
    Session(#[from] SessionError),
}
