//! Value Object 定義
//!
//! 生成時に検証され、以降は不変な値。

use std::fmt;

use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum length of a display name (in characters)
pub const MAX_DISPLAY_NAME_LENGTH: usize = 32;

/// Maximum length of a chat message (in characters)
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Opaque transport address of a peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerAddress(String);

impl PeerAddress {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::EmptyPeerAddress);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for PeerAddress {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Room identifier, used verbatim as the anchor's transport address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::EmptyRoomId);
        }
        Ok(Self(value))
    }

    /// Generate a fresh room identifier for a room this client creates.
    pub fn generate() -> Self {
        Self(format!("room-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The transport address every participant dials to reach the anchor.
    pub fn anchor_address(&self) -> PeerAddress {
        PeerAddress(self.0.clone())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human readable participant name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyDisplayName);
        }
        let len = trimmed.chars().count();
        if len > MAX_DISPLAY_NAME_LENGTH {
            return Err(ValueObjectError::DisplayNameTooLong {
                len,
                max: MAX_DISPLAY_NAME_LENGTH,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chat message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::EmptyMessageContent);
        }
        let len = value.chars().count();
        if len > MAX_MESSAGE_LENGTH {
            return Err(ValueObjectError::MessageContentTooLong {
                len,
                max: MAX_MESSAGE_LENGTH,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Globally unique message identifier (`<senderId>-<timestamp>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::EmptyMessageId);
        }
        Ok(Self(value))
    }

    /// Build the id of a message sent by `sender` at `timestamp`.
    pub fn compose(sender: &PeerAddress, timestamp: Timestamp) -> Self {
        Self(format!("{}-{}", sender.as_str(), timestamp.value()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_address_rejects_blank() {
        // テスト項目: 空白のみのアドレスは拒否される
        // given (前提条件):
        let value = "   ".to_string();

        // when (操作):
        let result = PeerAddress::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::EmptyPeerAddress));
    }

    #[test]
    fn test_room_id_is_anchor_address() {
        // テスト項目: ルーム ID がそのままアンカーのアドレスになる
        // given (前提条件):
        let room = RoomId::new("room-1".to_string()).unwrap();

        // when (操作):
        let address = room.anchor_address();

        // then (期待する結果):
        assert_eq!(address.as_str(), "room-1");
    }

    #[test]
    fn test_generated_room_ids_are_unique() {
        // テスト項目: 生成されたルーム ID は毎回異なる
        // given (前提条件):

        // when (操作):
        let a = RoomId::generate();
        let b = RoomId::generate();

        // then (期待する結果):
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("room-"));
    }

    #[test]
    fn test_display_name_is_trimmed_and_bounded() {
        // テスト項目: 表示名は前後の空白が除去され、長すぎる名前は拒否される
        // given (前提条件):
        let padded = "  alice ".to_string();
        let too_long = "x".repeat(MAX_DISPLAY_NAME_LENGTH + 1);

        // when (操作):
        let ok = DisplayName::new(padded);
        let err = DisplayName::new(too_long);

        // then (期待する結果):
        assert_eq!(ok.unwrap().as_str(), "alice");
        assert!(matches!(
            err,
            Err(ValueObjectError::DisplayNameTooLong { .. })
        ));
    }

    #[test]
    fn test_message_content_rejects_whitespace_only() {
        // テスト項目: 空白のみのメッセージは拒否される
        // given (前提条件):
        let value = " \n\t".to_string();

        // when (操作):
        let result = MessageContent::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::EmptyMessageContent));
    }

    #[test]
    fn test_message_id_is_composed_from_sender_and_time() {
        // テスト項目: メッセージ ID は送信者アドレスと送信時刻から作られる
        // given (前提条件):
        let sender = PeerAddress::new("peer-a".to_string()).unwrap();

        // when (操作):
        let id = MessageId::compose(&sender, Timestamp::new(1000));

        // then (期待する結果):
        assert_eq!(id.as_str(), "peer-a-1000");
    }
}
