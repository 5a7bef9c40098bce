//! UseCase: Sync Protocol Handler
//!
//! 4 種類のフレームを共有状態に適用します。どの操作も id による重複排除で
//! 冪等になっており、同じフレームを何度受け取っても結果は変わりません。

use crate::{
    domain::{Frame, Participant, PeerAddress, ProtocolError, SharedState},
    infrastructure::codec::decode_frame,
};

/// What applying one frame changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub messages_added: usize,
    /// Roster entries that were not known before
    pub participants_added: Vec<Participant>,
    /// A peer that announced itself with `USER_INFO` and was not known before
    pub introduced: Option<Participant>,
}

impl SyncOutcome {
    pub fn changed(&self) -> bool {
        self.messages_added > 0 || !self.participants_added.is_empty()
    }
}

pub struct SyncProtocolHandler;

impl SyncProtocolHandler {
    /// Decode a payload received from `from` and apply it.
    pub fn handle_payload(
        state: &mut SharedState,
        from: &PeerAddress,
        payload: &str,
    ) -> Result<SyncOutcome, ProtocolError> {
        let frame = decode_frame(payload)?;
        tracing::debug!("Received {} from '{}'", frame.kind(), from);
        Ok(Self::apply(state, frame))
    }

    /// Apply one frame to the shared state as a single step.
    pub fn apply(state: &mut SharedState, frame: Frame) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();
        match frame {
            Frame::UserInfo { id, username } => {
                let participant = Participant::connected(id, username);
                if state.insert_participant_if_absent(participant.clone()) {
                    tracing::info!("'{}' ({}) joined", participant.username, participant.id);
                    outcome.participants_added.push(participant.clone());
                    outcome.introduced = Some(participant);
                }
            }
            Frame::InitMessages(messages) => {
                outcome.messages_added = state.merge_messages(messages);
            }
            Frame::InitParticipants(participants) => {
                outcome.participants_added = state.merge_participants(participants);
            }
            Frame::NewMessage(message) => {
                if state.insert_message(message) {
                    outcome.messages_added = 1;
                }
            }
            Frame::Unknown(kind) => {
                tracing::debug!("Ignoring frame of unknown type '{}'", kind);
            }
        }
        outcome
    }

    /// `USER_INFO` announcing the local participant.
    pub fn user_info(state: &SharedState) -> Option<Frame> {
        let local = state.local_address()?;
        let participant = state.participant(local)?;
        Some(Frame::UserInfo {
            id: participant.id.clone(),
            username: participant.username.clone(),
        })
    }

    /// `INIT_MESSAGES` and `INIT_PARTICIPANTS` carrying the full local state.
    pub fn backfill(state: &SharedState) -> [Frame; 2] {
        [
            Frame::InitMessages(state.snapshot_messages()),
            Frame::InitParticipants(state.snapshot_participants()),
        ]
    }
}
