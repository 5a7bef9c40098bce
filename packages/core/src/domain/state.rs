//! Shared State Store
//!
//! チャットセッションのメッセージログと参加者名簿を保持し、
//! id による重複排除とタイムスタンプ順ソートを伴うマージ操作を提供します。
//!
//! ## 不変条件
//!
//! - メッセージログに同じ id のエントリは 2 つ存在しない
//! - メッセージログは常に timestamp の昇順（同値は挿入順）
//! - 名簿に同じ id のエントリは 2 つ存在しない
//! - 名簿のエントリは削除されず、切断フラグが立つだけ

use std::collections::HashSet;

use super::{
    entity::{Message, Participant},
    error::SessionError,
    value_object::{DisplayName, MessageContent, MessageId, PeerAddress, Timestamp},
};

/// Message log and roster of one chat session.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    messages: Vec<Message>,
    participants: Vec<Participant>,
    /// Local peer, known once the transport has assigned an address
    local: Option<PeerAddress>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn local_address(&self) -> Option<&PeerAddress> {
        self.local.as_ref()
    }

    pub fn participant(&self, id: &PeerAddress) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn has_participant(&self, id: &PeerAddress) -> bool {
        self.participant(id).is_some()
    }

    pub fn has_message(&self, id: &MessageId) -> bool {
        self.messages.iter().any(|m| &m.id == id)
    }

    /// Register the local participant once its address is known.
    ///
    /// Returns `true` if the roster changed.
    pub fn add_local_participant(&mut self, id: PeerAddress, username: DisplayName) -> bool {
        self.local = Some(id.clone());
        self.insert_participant_if_absent(Participant::connected(id, username))
    }

    /// Build a message from the local participant stamped with `now`, append it
    /// and return it for broadcast.
    pub fn append_local_message(
        &mut self,
        content: MessageContent,
        now: Timestamp,
    ) -> Result<Message, SessionError> {
        let local = self.local.clone().ok_or(SessionError::NotReady)?;
        let username = self
            .participant(&local)
            .map(|p| p.username.clone())
            .ok_or(SessionError::NotReady)?;

        // Two sends in the same millisecond would share an id.
        let mut timestamp = now;
        while self.has_message(&MessageId::compose(&local, timestamp)) {
            timestamp = Timestamp::new(timestamp.value() + 1);
        }

        let message = Message::new(local, username, content, timestamp);
        self.messages.push(message.clone());
        self.sort_messages();
        Ok(message)
    }

    /// Append a single message unless its id is already present.
    pub fn insert_message(&mut self, message: Message) -> bool {
        if self.has_message(&message.id) {
            return false;
        }
        self.messages.push(message);
        self.sort_messages();
        true
    }

    /// Merge a batch of messages, skipping ids already present (in the log or
    /// earlier in the batch). Returns the number of messages added.
    pub fn merge_messages(&mut self, incoming: Vec<Message>) -> usize {
        let mut seen: HashSet<MessageId> = self.messages.iter().map(|m| m.id.clone()).collect();
        let before = self.messages.len();

        for message in incoming {
            if seen.insert(message.id.clone()) {
                self.messages.push(message);
            }
        }

        let added = self.messages.len() - before;
        if added > 0 {
            self.sort_messages();
        }
        added
    }

    /// Insert a participant unless its id is already known.
    ///
    /// An existing entry is never downgraded or otherwise touched.
    pub fn insert_participant_if_absent(&mut self, participant: Participant) -> bool {
        if self.has_participant(&participant.id) {
            return false;
        }
        self.participants.push(participant);
        true
    }

    /// Merge a roster snapshot, keeping connected flags as sent.
    ///
    /// Returns the participants that were newly added.
    pub fn merge_participants(&mut self, incoming: Vec<Participant>) -> Vec<Participant> {
        let mut added = Vec::new();
        for participant in incoming {
            if self.insert_participant_if_absent(participant.clone()) {
                added.push(participant);
            }
        }
        added
    }

    /// Flag a participant as disconnected. Returns `true` if the flag flipped.
    pub fn mark_disconnected(&mut self, id: &PeerAddress) -> bool {
        match self.participants.iter_mut().find(|p| &p.id == id) {
            Some(participant) if participant.is_connected => {
                participant.is_connected = false;
                true
            }
            _ => false,
        }
    }

    pub fn snapshot_messages(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn snapshot_participants(&self) -> Vec<Participant> {
        self.participants.clone()
    }

    fn sort_messages(&mut self) {
        // stable: equal timestamps keep insertion order
        self.messages.sort_by_key(|m| m.timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(value: &str) -> PeerAddress {
        PeerAddress::new(value.to_string()).unwrap()
    }

    fn name(value: &str) -> DisplayName {
        DisplayName::new(value.to_string()).unwrap()
    }

    fn message(sender: &str, content: &str, timestamp: i64) -> Message {
        Message::new(
            addr(sender),
            name(sender),
            MessageContent::new(content.to_string()).unwrap(),
            Timestamp::new(timestamp),
        )
    }

    fn ids(state: &SharedState) -> Vec<String> {
        state
            .messages()
            .iter()
            .map(|m| m.id.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_append_local_message_requires_local_participant() {
        // テスト項目: ローカルアドレスが未確定の場合、メッセージは追加できない
        // given (前提条件):
        let mut state = SharedState::new();

        // when (操作):
        let result = state.append_local_message(
            MessageContent::new("hi".to_string()).unwrap(),
            Timestamp::new(1000),
        );

        // then (期待する結果):
        assert_eq!(result, Err(SessionError::NotReady));
        assert!(state.messages().is_empty());
    }

    #[test]
    fn test_append_local_message_stamps_sender_and_time() {
        // テスト項目: ローカルメッセージに送信者と時刻が付与される
        // given (前提条件):
        let mut state = SharedState::new();
        state.add_local_participant(addr("room-1"), name("alice"));

        // when (操作):
        let message = state
            .append_local_message(
                MessageContent::new("hi".to_string()).unwrap(),
                Timestamp::new(1000),
            )
            .unwrap();

        // then (期待する結果):
        assert_eq!(message.id.as_str(), "room-1-1000");
        assert_eq!(message.sender.as_str(), "alice");
        assert_eq!(message.sender_id.as_str(), "room-1");
        assert_eq!(state.messages(), &[message]);
    }

    #[test]
    fn test_append_local_message_in_same_millisecond_keeps_ids_unique() {
        // テスト項目: 同一ミリ秒に 2 回送信しても ID は重複しない
        // given (前提条件):
        let mut state = SharedState::new();
        state.add_local_participant(addr("room-1"), name("alice"));
        let now = Timestamp::new(1000);

        // when (操作):
        let first = state
            .append_local_message(MessageContent::new("a".to_string()).unwrap(), now)
            .unwrap();
        let second = state
            .append_local_message(MessageContent::new("b".to_string()).unwrap(), now)
            .unwrap();

        // then (期待する結果):
        assert_ne!(first.id, second.id);
        assert_eq!(second.timestamp.value(), 1001);
        assert_eq!(ids(&state), vec!["room-1-1000", "room-1-1001"]);
    }

    #[test]
    fn test_insert_message_is_idempotent() {
        // テスト項目: 同じ ID のメッセージを 2 回挿入しても 1 件だけ残る
        // given (前提条件):
        let mut state = SharedState::new();
        let m1 = message("peer-b", "hello", 1000);

        // when (操作):
        let first = state.insert_message(m1.clone());
        let second = state.insert_message(m1);

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(state.messages().len(), 1);
    }

    #[test]
    fn test_merge_messages_unions_and_sorts_by_timestamp() {
        // テスト項目: マージ結果は両方のログの和集合で、timestamp 順に並ぶ
        // given (前提条件):
        let mut state = SharedState::new();
        state.insert_message(message("a", "a1", 1000));
        state.insert_message(message("a", "a2", 3000));
        let incoming = vec![
            message("b", "b1", 2000),
            message("a", "a2", 3000),
            message("b", "b2", 500),
        ];

        // when (操作):
        let added = state.merge_messages(incoming);

        // then (期待する結果):
        assert_eq!(added, 2);
        assert_eq!(ids(&state), vec!["b-500", "a-1000", "b-2000", "a-3000"]);
    }

    #[test]
    fn test_merge_messages_collapses_duplicates_within_batch() {
        // テスト項目: 同一バッチ内の重複 ID も 1 件にまとめられる
        // given (前提条件):
        let mut state = SharedState::new();
        let m = message("b", "dup", 1000);

        // when (操作):
        let added = state.merge_messages(vec![m.clone(), m]);

        // then (期待する結果):
        assert_eq!(added, 1);
        assert_eq!(state.messages().len(), 1);
    }

    #[test]
    fn test_equal_timestamps_keep_arrival_order() {
        // テスト項目: 同じ timestamp のメッセージは到着順を保つ
        // given (前提条件):
        let mut state = SharedState::new();
        state.insert_message(message("z", "first", 1000));

        // when (操作):
        state.insert_message(message("a", "second", 1000));
        state.insert_message(message("m", "earlier", 900));

        // then (期待する結果):
        assert_eq!(ids(&state), vec!["m-900", "z-1000", "a-1000"]);
    }

    #[test]
    fn test_insert_participant_never_downgrades_existing_entry() {
        // テスト項目: 既存の参加者エントリは上書きされない
        // given (前提条件):
        let mut state = SharedState::new();
        state.insert_participant_if_absent(Participant::connected(addr("b"), name("bob")));
        state.mark_disconnected(&addr("b"));

        // when (操作):
        let inserted =
            state.insert_participant_if_absent(Participant::connected(addr("b"), name("bobby")));

        // then (期待する結果):
        assert!(!inserted);
        let bob = state.participant(&addr("b")).unwrap();
        assert_eq!(bob.username.as_str(), "bob");
        assert!(!bob.is_connected);
    }

    #[test]
    fn test_merge_participants_keeps_sender_flags_and_returns_new_entries() {
        // テスト項目: 名簿のマージでは未知の参加者のみ追加され、接続フラグは送信元のまま
        // given (前提条件):
        let mut state = SharedState::new();
        state.add_local_participant(addr("me"), name("me"));
        let incoming = vec![
            Participant::connected(addr("me"), name("someone else")),
            Participant {
                id: addr("gone"),
                username: name("ghost"),
                is_connected: false,
            },
            Participant::connected(addr("c"), name("carol")),
        ];

        // when (操作):
        let added = state.merge_participants(incoming);

        // then (期待する結果):
        assert_eq!(added.len(), 2);
        assert_eq!(state.participants().len(), 3);
        assert_eq!(state.participant(&addr("me")).unwrap().username.as_str(), "me");
        assert!(!state.participant(&addr("gone")).unwrap().is_connected);
    }

    #[test]
    fn test_mark_disconnected_retains_entry() {
        // テスト項目: 切断された参加者は名簿に残り、フラグだけが変わる
        // given (前提条件):
        let mut state = SharedState::new();
        state.insert_participant_if_absent(Participant::connected(addr("b"), name("bob")));

        // when (操作):
        let first = state.mark_disconnected(&addr("b"));
        let second = state.mark_disconnected(&addr("b"));
        let unknown = state.mark_disconnected(&addr("nobody"));

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert!(!unknown);
        assert_eq!(state.participants().len(), 1);
        assert_eq!(state.participants()[0].username.as_str(), "bob");
    }
}
