//! UseCase: Mesh Session
//!
//! 1 つのチャットセッションのエンジン本体。共有状態・チャンネル集合・
//! アイドル監視を所有し、トランスポートからのシグナルと UI からの操作を
//! 1 つずつ同期的に適用します（同時に進行する変更は常に 1 つだけ）。
//!
//! ## データフロー
//!
//! ```text
//! Transport signal ─▶ MeshSession::handle_event ─▶ SyncProtocolHandler ─▶ SharedState
//!                                                   └─▶ SessionTimeoutMonitor (activity)
//! send_message ─▶ SharedState ─▶ broadcast on every open channel
//! ```

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use meshchat_shared::time::Clock;

use crate::{
    domain::{
        BootstrapError, ChannelHandle, ChannelId, ChannelSignal, ConnectRequest, DisplayName,
        Frame, Message, MessageContent, Notice, NoticeBoard, NoticeKind, Participant,
        PeerAddress, RoomId, SessionError, SharedState, Timestamp, Transport, TransportError,
        TransportEvent, notice::DEFAULT_NOTICE_LIFETIME_MS,
    },
    infrastructure::codec::encode_frame,
};

use super::{
    bootstrap::{BootstrapPlan, Role},
    connection::ConnectionManager,
    sync::SyncProtocolHandler,
    timeout::{DEFAULT_IDLE_THRESHOLD, DEFAULT_POLL_INTERVAL, MonitorState, SessionTimeoutMonitor},
};

/// Per-session settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub room: RoomId,
    pub username: DisplayName,
    pub role: Role,
    pub idle_threshold: Duration,
    pub poll_interval: Duration,
    pub notice_lifetime: Duration,
}

impl SessionConfig {
    pub fn new(room: RoomId, username: DisplayName, role: Role) -> Self {
        Self {
            room,
            username,
            role,
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            poll_interval: DEFAULT_POLL_INTERVAL,
            notice_lifetime: Duration::from_millis(DEFAULT_NOTICE_LIFETIME_MS as u64),
        }
    }

    pub fn with_idle_threshold(mut self, idle_threshold: Duration) -> Self {
        self.idle_threshold = idle_threshold;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_notice_lifetime(mut self, notice_lifetime: Duration) -> Self {
        self.notice_lifetime = notice_lifetime;
        self
    }

    pub fn plan(&self) -> BootstrapPlan {
        match self.role {
            Role::Anchor => BootstrapPlan::create(self.room.clone()),
            Role::Joiner => BootstrapPlan::join(self.room.clone()),
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The user (or the host environment) left
    Left,
    /// Idle timeout
    Expired,
    /// The local address could not be claimed
    BootstrapFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Waiting for the local address
    Connecting,
    Connected,
    Ended(EndReason),
}

/// The engine object for one chat session.
pub struct MeshSession {
    config: SessionConfig,
    plan: BootstrapPlan,
    clock: Arc<dyn Clock>,
    state: SharedState,
    connections: ConnectionManager,
    monitor: SessionTimeoutMonitor,
    notices: NoticeBoard,
    status: ConnectionStatus,
    /// Roster ids sent to each backfilled newcomer that has not announced itself yet
    backfilled: HashMap<PeerAddress, HashSet<PeerAddress>>,
}

impl MeshSession {
    pub fn new(config: SessionConfig, transport: Arc<dyn Transport>, clock: Arc<dyn Clock>) -> Self {
        let now = Timestamp::new(clock.now_millis());
        let notice_lifetime_ms =
            i64::try_from(config.notice_lifetime.as_millis()).unwrap_or(i64::MAX);
        Self {
            plan: config.plan(),
            monitor: SessionTimeoutMonitor::new(config.idle_threshold, now),
            notices: NoticeBoard::new(notice_lifetime_ms),
            connections: ConnectionManager::new(transport),
            state: SharedState::new(),
            status: ConnectionStatus::Connecting,
            backfilled: HashMap::new(),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn plan(&self) -> &BootstrapPlan {
        &self.plan
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn has_ended(&self) -> bool {
        matches!(self.status, ConnectionStatus::Ended(_))
    }

    pub fn local_address(&self) -> Option<&PeerAddress> {
        self.state.local_address()
    }

    pub fn messages(&self) -> &[Message] {
        self.state.messages()
    }

    pub fn participants(&self) -> &[Participant] {
        self.state.participants()
    }

    pub fn open_peers(&self) -> Vec<PeerAddress> {
        self.connections.open_peers()
    }

    pub fn last_activity(&self) -> Timestamp {
        self.monitor.last_activity()
    }

    pub fn time_remaining(&self) -> Duration {
        self.monitor.time_remaining(self.now())
    }

    pub fn minutes_remaining(&self) -> u64 {
        self.monitor.minutes_remaining(self.now())
    }

    /// Notices that are still visible; dismissed ones are dropped.
    pub fn active_notices(&mut self) -> Vec<Notice> {
        let now = self.now();
        self.notices.prune(now);
        self.notices.active(now)
    }

    // ========================================
    // Bootstrap
    // ========================================

    /// The transport assigned our address: register ourselves and, as a
    /// joiner, dial the anchor with a join request.
    pub fn on_local_address_ready(&mut self, address: PeerAddress) {
        if self.has_ended() {
            return;
        }
        tracing::info!(
            "Ready as '{}' at '{}' in room '{}'",
            self.config.username,
            address,
            self.config.room
        );
        self.connections.set_local_address(address.clone());
        if self
            .state
            .add_local_participant(address, self.config.username.clone())
        {
            self.touch();
        }
        self.status = ConnectionStatus::Connected;

        if !self.plan.is_anchor() {
            let anchor = self.plan.anchor_address();
            let _ = self.on_outgoing_channel_requested(anchor, true);
        }
    }

    pub fn on_bootstrap_failed(&mut self, error: &BootstrapError) {
        let now = self.now();
        self.notices.push(Notice::from_bootstrap_error(error, now));
        self.status = ConnectionStatus::Ended(EndReason::BootstrapFailed);
    }

    // ========================================
    // Channel lifecycle
    // ========================================

    pub fn handle_event(&mut self, event: TransportEvent) {
        if self.has_ended() {
            return;
        }
        match event {
            TransportEvent::Incoming(handle) => self.on_incoming_channel(handle),
            TransportEvent::Channel { id, signal } => match signal {
                ChannelSignal::Open => self.on_channel_open(id),
                ChannelSignal::Data(payload) => self.on_channel_data(id, &payload),
                ChannelSignal::Close => self.on_channel_close(id),
                ChannelSignal::Error(reason) => self.on_channel_error(id, &reason),
            },
        }
    }

    pub fn on_incoming_channel(&mut self, handle: Box<dyn ChannelHandle>) {
        self.connections.accept(handle);
    }

    /// Open a channel to `target`, tagged as a join request when `join_request`.
    pub fn on_outgoing_channel_requested(
        &mut self,
        target: PeerAddress,
        join_request: bool,
    ) -> Result<ChannelId, TransportError> {
        let request = if join_request {
            ConnectRequest::join(target)
        } else {
            ConnectRequest::new(target)
        };
        match self.connections.dial(request) {
            Ok(id) => Ok(id),
            Err(e) => {
                let now = self.now();
                self.notices.push(Notice::from_transport_error(&e, now));
                Err(e)
            }
        }
    }

    pub fn on_channel_open(&mut self, id: ChannelId) {
        let Some(opened) = self.connections.mark_open(id) else {
            tracing::debug!("Open signal for untracked channel {}", id);
            return;
        };
        tracing::info!("Channel {} to '{}' is open", id, opened.peer);

        let mut frames: Vec<Frame> = SyncProtocolHandler::user_info(&self.state)
            .into_iter()
            .collect();
        if opened.send_backfill {
            tracing::info!(
                "Backfilling '{}' with {} messages and {} participants",
                opened.peer,
                self.state.messages().len(),
                self.state.participants().len()
            );
            frames.extend(SyncProtocolHandler::backfill(&self.state));
            let sent = self
                .state
                .participants()
                .iter()
                .map(|p| p.id.clone())
                .collect();
            self.backfilled.insert(opened.peer.clone(), sent);
        }
        for frame in frames {
            self.send_frame(&opened.peer, &frame);
        }
    }

    pub fn on_channel_data(&mut self, id: ChannelId, payload: &str) {
        let Some(peer) = self.connections.peer_of(id) else {
            tracing::debug!("Data on untracked channel {}", id);
            return;
        };

        match SyncProtocolHandler::handle_payload(&mut self.state, &peer, payload) {
            Ok(outcome) => {
                if outcome.changed() {
                    self.touch();
                }
                if let Some(newcomer) = &outcome.introduced {
                    self.introduce(newcomer);
                }
                self.complete_mesh(&outcome.participants_added);
            }
            Err(e) => {
                let now = self.now();
                self.notices.push(Notice {
                    kind: NoticeKind::ProtocolError,
                    text: format!("Bad frame from '{}': {}", peer, e),
                    raised_at: now,
                });
            }
        }
    }

    pub fn on_channel_close(&mut self, id: ChannelId) {
        let Some(removed) = self.connections.remove(id) else {
            return;
        };
        tracing::info!("Channel {} to '{}' closed", id, removed.peer);
        if !removed.was_open || self.connections.has_channel_to(&removed.peer) {
            return;
        }
        self.backfilled.remove(&removed.peer);
        if self.state.mark_disconnected(&removed.peer) {
            tracing::info!("'{}' marked disconnected", removed.peer);
            self.touch();
        }
    }

    /// A channel failed: tell the user and end that channel. No retry.
    pub fn on_channel_error(&mut self, id: ChannelId, reason: &str) {
        let peer = self
            .connections
            .peer_of(id)
            .map(|p| p.to_string())
            .unwrap_or_else(|| id.to_string());
        let error = TransportError::Connection(format!("{}: {}", peer, reason));
        let now = self.now();
        self.notices.push(Notice::from_transport_error(&error, now));
        self.connections.close_channel(id);
    }

    /// A newcomer we backfilled just announced itself. Open peers missing
    /// from its backfill have not heard of it either, so hand them its entry
    /// and let mesh completion connect the two.
    fn introduce(&mut self, newcomer: &Participant) {
        let Some(known) = self.backfilled.remove(&newcomer.id) else {
            return;
        };
        let frame = Frame::InitParticipants(vec![newcomer.clone()]);
        for peer in self.connections.open_peers() {
            if peer == newcomer.id || known.contains(&peer) {
                continue;
            }
            tracing::debug!("Introducing '{}' to '{}'", newcomer.id, peer);
            self.send_frame(&peer, &frame);
        }
    }

    /// Dial participants learned from a roster backfill that we have no
    /// channel to yet. These dials exchange identities only.
    fn complete_mesh(&mut self, learned: &[Participant]) {
        for participant in learned {
            if !participant.is_connected
                || Some(&participant.id) == self.state.local_address()
                || self.connections.has_channel_to(&participant.id)
            {
                continue;
            }
            tracing::debug!("Completing mesh with '{}'", participant.id);
            let _ = self.on_outgoing_channel_requested(participant.id.clone(), false);
        }
    }

    // ========================================
    // Presentation entry points
    // ========================================

    /// Append a local message and broadcast it to every open channel.
    pub fn send_message(&mut self, text: &str) -> Result<Message, SessionError> {
        if self.has_ended() {
            return Err(SessionError::Ended);
        }
        let content = MessageContent::new(text.to_string())?;
        let now = self.now();
        let message = self.state.append_local_message(content, now)?;
        self.touch();

        let frame = Frame::NewMessage(message.clone());
        match encode_frame(&frame) {
            Ok(payload) => {
                for (peer, error) in self.connections.broadcast(&payload) {
                    tracing::warn!("Message not delivered to '{}'", peer);
                    self.notices.push(Notice::from_transport_error(&error, now));
                }
            }
            Err(e) => tracing::error!("Failed to encode message: {}", e),
        }
        Ok(message)
    }

    /// End the session at the user's request. Idempotent.
    pub fn leave(&mut self) {
        self.end(EndReason::Left);
    }

    /// Timeout check, driven by the poll interval.
    pub fn poll_timeout(&mut self) -> MonitorState {
        if self.has_ended() {
            return self.monitor.state();
        }
        let now = self.now();
        let state = self.monitor.poll(now);
        if state == MonitorState::Expired {
            self.notices.push(Notice {
                kind: NoticeKind::SessionExpired,
                text: "Session expired after inactivity".to_string(),
                raised_at: now,
            });
            self.end(EndReason::Expired);
        }
        state
    }

    // ========================================
    // Internals
    // ========================================

    fn end(&mut self, reason: EndReason) {
        if self.has_ended() {
            return;
        }
        tracing::info!("Ending session ({:?})", reason);
        self.connections.shutdown();
        self.status = ConnectionStatus::Ended(reason);
    }

    fn send_frame(&mut self, peer: &PeerAddress, frame: &Frame) {
        let result = encode_frame(frame)
            .map_err(|e| TransportError::Connection(e.to_string()))
            .and_then(|payload| self.connections.send_to(peer, payload));
        if let Err(e) = result {
            tracing::warn!("Failed to send {} to '{}': {}", frame.kind(), peer, e);
            let now = self.now();
            self.notices.push(Notice::from_transport_error(&e, now));
        }
    }

    fn touch(&mut self) {
        let now = self.now();
        self.monitor.record_activity(now);
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}
