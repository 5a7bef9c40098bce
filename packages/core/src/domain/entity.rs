//! Entity 定義
//!
//! 一度生成されたら変更されないメッセージと参加者のレコード。

use super::value_object::{DisplayName, MessageContent, MessageId, PeerAddress, Timestamp};

/// A chat message as kept in the message log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    /// Display name of the sender at send time
    pub sender: DisplayName,
    pub sender_id: PeerAddress,
    pub content: MessageContent,
    pub timestamp: Timestamp,
}

impl Message {
    /// Create a message, deriving its id from the sender address and send time.
    pub fn new(
        sender_id: PeerAddress,
        sender: DisplayName,
        content: MessageContent,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: MessageId::compose(&sender_id, timestamp),
            sender,
            sender_id,
            content,
            timestamp,
        }
    }
}

/// A roster entry.
///
/// `is_connected` is what this process has observed, not a global truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: PeerAddress,
    pub username: DisplayName,
    pub is_connected: bool,
}

impl Participant {
    pub fn connected(id: PeerAddress, username: DisplayName) -> Self {
        Self {
            id,
            username,
            is_connected: true,
        }
    }
}
