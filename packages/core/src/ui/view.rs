//! Read-only snapshot of a session, published after every state change.

use crate::{
    domain::{Message, Notice, Participant, PeerAddress},
    usecase::{ConnectionStatus, MeshSession, Role, SessionConfig},
};

/// What a UI needs to render one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// `None` until the transport has assigned an address
    pub local_address: Option<PeerAddress>,
    pub role: Role,
    pub status: ConnectionStatus,
    /// Ascending by timestamp
    pub messages: Vec<Message>,
    pub participants: Vec<Participant>,
    /// Peers with an open direct channel
    pub open_peers: Vec<PeerAddress>,
    pub minutes_remaining: u64,
    /// Notices that have not been dismissed yet
    pub notices: Vec<Notice>,
}

impl SessionView {
    /// View shown while the local address is being claimed.
    pub fn initial(config: &SessionConfig) -> Self {
        Self {
            local_address: None,
            role: config.role,
            status: ConnectionStatus::Connecting,
            messages: Vec::new(),
            participants: Vec::new(),
            open_peers: Vec::new(),
            minutes_remaining: config.idle_threshold.as_secs() / 60,
            notices: Vec::new(),
        }
    }

    /// Snapshot `session`. Dismissed notices are pruned on the way.
    pub fn capture(session: &mut MeshSession) -> Self {
        Self {
            local_address: session.local_address().cloned(),
            role: session.plan().role,
            status: session.status(),
            messages: session.messages().to_vec(),
            participants: session.participants().to_vec(),
            open_peers: session.open_peers(),
            minutes_remaining: session.minutes_remaining(),
            notices: session.active_notices(),
        }
    }

    pub fn participant(&self, id: &PeerAddress) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn connected_count(&self) -> usize {
        self.participants.iter().filter(|p| p.is_connected).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, RoomId};
    use std::time::Duration;

    #[test]
    fn test_initial_view_shows_full_idle_window() {
        // テスト項目: 初期ビューは接続中で、残り時間はしきい値そのものになる
        // given (前提条件):
        let config = SessionConfig::new(
            RoomId::new("room-1".to_string()).unwrap(),
            DisplayName::new("xavier".to_string()).unwrap(),
            Role::Joiner,
        )
        .with_idle_threshold(Duration::from_secs(5 * 60));

        // when (操作):
        let view = SessionView::initial(&config);

        // then (期待する結果):
        assert_eq!(view.status, ConnectionStatus::Connecting);
        assert_eq!(view.role, Role::Joiner);
        assert_eq!(view.minutes_remaining, 5);
        assert!(view.local_address.is_none());
        assert_eq!(view.connected_count(), 0);
    }
}
