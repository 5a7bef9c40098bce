//! Error types for the meshchat engine.

use thiserror::Error;

/// Errors raised while constructing value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("Peer address must not be empty")]
    EmptyPeerAddress,

    #[error("Room id must not be empty")]
    EmptyRoomId,

    #[error("Display name must not be empty")]
    EmptyDisplayName,

    #[error("Display name is {len} characters long (max {max})")]
    DisplayNameTooLong { len: usize, max: usize },

    #[error("Message must not be empty")]
    EmptyMessageContent,

    #[error("Message is {len} characters long (max {max})")]
    MessageContentTooLong { len: usize, max: usize },

    #[error("Message id must not be empty")]
    EmptyMessageId,
}

/// Failures while claiming the local transport address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapError {
    /// The requested address (the room id) is already held by someone else
    #[error("Address '{0}' is already in use")]
    AddressUnavailable(String),

    /// The substrate could not be reached
    #[error("Network unreachable: {0}")]
    Network(String),

    /// Signaling or relay failure inside the substrate
    #[error("Transport substrate error: {0}")]
    Substrate(String),
}

/// Failures of individual channels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Outbound connect returned nothing connectable
    #[error("Could not join peer '{0}'")]
    JoinFailed(String),

    /// The channel is already closed
    #[error("Channel to '{0}' is closed")]
    ChannelClosed(String),

    /// The channel failed after it was established
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Frames that cannot be decoded.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid frame payload: {0}")]
    InvalidPayload(#[from] ValueObjectError),
}

/// Errors returned to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The local address has not been assigned yet
    #[error("Session is not connected yet")]
    NotReady,

    #[error("Session has ended")]
    Ended,

    #[error("Invalid message: {0}")]
    InvalidMessage(#[from] ValueObjectError),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
}
