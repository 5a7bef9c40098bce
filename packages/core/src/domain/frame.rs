//! Application-level frames exchanged over a channel.

use super::{
    entity::{Message, Participant},
    value_object::{DisplayName, PeerAddress},
};

/// Frame kind tags as they appear on the wire
pub const USER_INFO: &str = "USER_INFO";
pub const INIT_MESSAGES: &str = "INIT_MESSAGES";
pub const INIT_PARTICIPANTS: &str = "INIT_PARTICIPANTS";
pub const NEW_MESSAGE: &str = "NEW_MESSAGE";

/// One protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Identity announcement sent on every channel open
    UserInfo {
        id: PeerAddress,
        username: DisplayName,
    },
    /// Full message log backfill
    InitMessages(Vec<Message>),
    /// Full roster backfill
    InitParticipants(Vec<Participant>),
    /// One live message
    NewMessage(Message),
    /// A kind this build does not understand; applying it is a no-op
    Unknown(String),
}

impl Frame {
    /// Wire tag of this frame
    pub fn kind(&self) -> &str {
        match self {
            Frame::UserInfo { .. } => USER_INFO,
            Frame::InitMessages(_) => INIT_MESSAGES,
            Frame::InitParticipants(_) => INIT_PARTICIPANTS,
            Frame::NewMessage(_) => NEW_MESSAGE,
            Frame::Unknown(kind) => kind,
        }
    }
}
