//! JSON frame codec.

use crate::domain::{
    DisplayName, Frame, Message, PeerAddress, ProtocolError,
    frame::{INIT_MESSAGES, INIT_PARTICIPANTS, NEW_MESSAGE, USER_INFO},
};

use super::dto::frame::{FrameEnvelope, MessageDto, ParticipantDto, UserInfoDto};

/// Serialize a frame to its JSON text form.
pub fn encode_frame(frame: &Frame) -> Result<String, ProtocolError> {
    let data = match frame {
        Frame::UserInfo { id, username } => serde_json::to_value(UserInfoDto {
            id: id.as_str().to_string(),
            username: username.as_str().to_string(),
        })?,
        Frame::InitMessages(messages) => serde_json::to_value(
            messages
                .iter()
                .cloned()
                .map(MessageDto::from)
                .collect::<Vec<_>>(),
        )?,
        Frame::InitParticipants(participants) => serde_json::to_value(
            participants
                .iter()
                .cloned()
                .map(ParticipantDto::from)
                .collect::<Vec<_>>(),
        )?,
        Frame::NewMessage(message) => serde_json::to_value(MessageDto::from(message.clone()))?,
        Frame::Unknown(_) => serde_json::Value::Null,
    };

    let envelope = FrameEnvelope {
        kind: frame.kind().to_string(),
        data,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Parse JSON text into a frame.
///
/// Unknown `type` values decode to `Frame::Unknown` so newer peers can add kinds.
pub fn decode_frame(text: &str) -> Result<Frame, ProtocolError> {
    let envelope: FrameEnvelope = serde_json::from_str(text)?;

    let frame = match envelope.kind.as_str() {
        USER_INFO => {
            let dto: UserInfoDto = serde_json::from_value(envelope.data)?;
            let (id, username): (PeerAddress, DisplayName) = dto.try_into()?;
            Frame::UserInfo { id, username }
        }
        INIT_MESSAGES => {
            let dtos: Vec<MessageDto> = serde_json::from_value(envelope.data)?;
            Frame::InitMessages(keep_valid(INIT_MESSAGES, dtos))
        }
        INIT_PARTICIPANTS => {
            let dtos: Vec<ParticipantDto> = serde_json::from_value(envelope.data)?;
            Frame::InitParticipants(keep_valid(INIT_PARTICIPANTS, dtos))
        }
        NEW_MESSAGE => {
            let dto: MessageDto = serde_json::from_value(envelope.data)?;
            Frame::NewMessage(Message::try_from(dto)?)
        }
        other => Frame::Unknown(other.to_string()),
    };

    Ok(frame)
}

/// Convert every entry of a batch, dropping the ones that fail validation.
fn keep_valid<D, T>(kind: &str, dtos: Vec<D>) -> Vec<T>
where
    T: TryFrom<D>,
    T::Error: std::fmt::Display,
{
    dtos.into_iter()
        .enumerate()
        .filter_map(|(index, dto)| match T::try_from(dto) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping invalid entry {} of {}: {}", index, kind, e);
                None
            }
        })
        .collect()
}
