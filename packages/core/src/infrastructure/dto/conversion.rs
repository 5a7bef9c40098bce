//! Conversion logic between DTOs and domain entities.

use crate::domain::{
    Message, Participant, ValueObjectError,
    value_object::{DisplayName, MessageContent, MessageId, PeerAddress, Timestamp},
};
use crate::infrastructure::dto::frame as dto;

// ========================================
// DTO → Domain Entity
// ========================================

impl TryFrom<dto::MessageDto> for Message {
    type Error = ValueObjectError;

    fn try_from(dto: dto::MessageDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: MessageId::new(dto.id)?,
            sender: DisplayName::new(dto.sender)?,
            sender_id: PeerAddress::new(dto.sender_id)?,
            content: MessageContent::new(dto.content)?,
            timestamp: Timestamp::new(dto.timestamp),
        })
    }
}

impl TryFrom<dto::ParticipantDto> for Participant {
    type Error = ValueObjectError;

    fn try_from(dto: dto::ParticipantDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PeerAddress::new(dto.id)?,
            username: DisplayName::new(dto.username)?,
            is_connected: dto.is_connected,
        })
    }
}

impl TryFrom<dto::UserInfoDto> for (PeerAddress, DisplayName) {
    type Error = ValueObjectError;

    fn try_from(dto: dto::UserInfoDto) -> Result<Self, Self::Error> {
        Ok((PeerAddress::new(dto.id)?, DisplayName::new(dto.username)?))
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<Message> for dto::MessageDto {
    fn from(model: Message) -> Self {
        Self {
            id: model.id.into_string(),
            sender: model.sender.into_string(),
            sender_id: model.sender_id.into_string(),
            content: model.content.into_string(),
            timestamp: model.timestamp.value(),
        }
    }
}

impl From<Participant> for dto::ParticipantDto {
    fn from(model: Participant) -> Self {
        Self {
            id: model.id.into_string(),
            username: model.username.into_string(),
            is_connected: model.is_connected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dto_message_to_domain() {
        // テスト項目: DTO の MessageDto がドメインエンティティに変換される
        // given (前提条件):
        let dto_msg = dto::MessageDto {
            id: "peer-a-1000".to_string(),
            sender: "alice".to_string(),
            sender_id: "peer-a".to_string(),
            content: "Hello!".to_string(),
            timestamp: 1000,
        };

        // when (操作):
        let domain_msg = Message::try_from(dto_msg).unwrap();

        // then (期待する結果):
        assert_eq!(domain_msg.id.as_str(), "peer-a-1000");
        assert_eq!(domain_msg.sender.as_str(), "alice");
        assert_eq!(domain_msg.sender_id.as_str(), "peer-a");
        assert_eq!(domain_msg.content.as_str(), "Hello!");
        assert_eq!(domain_msg.timestamp, Timestamp::new(1000));
    }

    #[test]
    fn test_dto_message_with_empty_content_is_rejected() {
        // テスト項目: 内容が空のメッセージ DTO は変換に失敗する
        // given (前提条件):
        let dto_msg = dto::MessageDto {
            id: "peer-a-1000".to_string(),
            sender: "alice".to_string(),
            sender_id: "peer-a".to_string(),
            content: "".to_string(),
            timestamp: 1000,
        };

        // when (操作):
        let result = Message::try_from(dto_msg);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::EmptyMessageContent));
    }

    #[test]
    fn test_domain_participant_to_dto() {
        // テスト項目: ドメインエンティティの Participant が DTO に変換される
        // given (前提条件):
        let participant = Participant {
            id: PeerAddress::new("peer-b".to_string()).unwrap(),
            username: DisplayName::new("bob".to_string()).unwrap(),
            is_connected: false,
        };

        // when (操作):
        let dto_participant: dto::ParticipantDto = participant.into();

        // then (期待する結果):
        assert_eq!(dto_participant.id, "peer-b");
        assert_eq!(dto_participant.username, "bob");
        assert!(!dto_participant.is_connected);
    }
}
