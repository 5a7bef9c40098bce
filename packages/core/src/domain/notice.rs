//! Transient, auto-dismissed user-visible notices.

use super::{
    error::{BootstrapError, TransportError},
    value_object::Timestamp,
};

/// Default time a notice stays visible (milliseconds)
pub const DEFAULT_NOTICE_LIFETIME_MS: i64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    AddressUnavailable,
    NetworkUnreachable,
    SubstrateError,
    ConnectionError,
    JoinFailed,
    ProtocolError,
    SessionExpired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub raised_at: Timestamp,
}

impl Notice {
    pub fn from_bootstrap_error(error: &BootstrapError, now: Timestamp) -> Self {
        let kind = match error {
            BootstrapError::AddressUnavailable(_) => NoticeKind::AddressUnavailable,
            BootstrapError::Network(_) => NoticeKind::NetworkUnreachable,
            BootstrapError::Substrate(_) => NoticeKind::SubstrateError,
        };
        Self {
            kind,
            text: error.to_string(),
            raised_at: now,
        }
    }

    pub fn from_transport_error(error: &TransportError, now: Timestamp) -> Self {
        let kind = match error {
            TransportError::JoinFailed(_) => NoticeKind::JoinFailed,
            TransportError::ChannelClosed(_) | TransportError::Connection(_) => {
                NoticeKind::ConnectionError
            }
        };
        Self {
            kind,
            text: error.to_string(),
            raised_at: now,
        }
    }
}

/// Notices currently shown to the user.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
    lifetime_ms: i64,
}

impl NoticeBoard {
    pub fn new(lifetime_ms: i64) -> Self {
        Self {
            notices: Vec::new(),
            lifetime_ms,
        }
    }

    pub fn push(&mut self, notice: Notice) {
        tracing::warn!("{:?}: {}", notice.kind, notice.text);
        self.notices.push(notice);
    }

    /// Notices that have not yet been dismissed at `now`.
    pub fn active(&self, now: Timestamp) -> Vec<Notice> {
        self.notices
            .iter()
            .filter(|n| self.is_live(n, now))
            .cloned()
            .collect()
    }

    /// Drop every notice whose lifetime has passed.
    pub fn prune(&mut self, now: Timestamp) {
        let lifetime_ms = self.lifetime_ms;
        self.notices
            .retain(|n| now.value() - n.raised_at.value() < lifetime_ms);
    }

    fn is_live(&self, notice: &Notice, now: Timestamp) -> bool {
        now.value() - notice.raised_at.value() < self.lifetime_ms
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_LIFETIME_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_errors_map_to_distinct_kinds() {
        // テスト項目: アドレス取得失敗の 3 種類が別々の通知種別になる
        // given (前提条件):
        let now = Timestamp::new(0);

        // when (操作):
        let taken = Notice::from_bootstrap_error(
            &BootstrapError::AddressUnavailable("room-1".to_string()),
            now,
        );
        let network = Notice::from_bootstrap_error(&BootstrapError::Network("down".into()), now);
        let substrate =
            Notice::from_bootstrap_error(&BootstrapError::Substrate("relay".into()), now);

        // then (期待する結果):
        assert_eq!(taken.kind, NoticeKind::AddressUnavailable);
        assert_eq!(network.kind, NoticeKind::NetworkUnreachable);
        assert_eq!(substrate.kind, NoticeKind::SubstrateError);
        assert!(taken.text.contains("room-1"));
    }

    #[test]
    fn test_notices_are_dismissed_after_lifetime() {
        // テスト項目: 通知は一定時間後に自動的に消える
        // given (前提条件):
        let mut board = NoticeBoard::new(5_000);
        board.push(Notice::from_transport_error(
            &TransportError::JoinFailed("room-1".to_string()),
            Timestamp::new(1_000),
        ));

        // when (操作):
        let visible = board.active(Timestamp::new(5_999));
        let dismissed = board.active(Timestamp::new(6_000));
        board.prune(Timestamp::new(6_000));

        // then (期待する結果):
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].kind, NoticeKind::JoinFailed);
        assert!(dismissed.is_empty());
        assert!(board.active(Timestamp::new(1_000)).is_empty());
    }
}
