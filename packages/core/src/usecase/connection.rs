//! UseCase: Connection Manager
//!
//! ## 責務
//!
//! - アクティブなチャンネルの集合を保持（リモートアドレスごとに最大 1 本）
//! - 発信（dial）と着信（accept）の記録、open 時のアクティブ化
//! - 個別送信とブロードキャスト、セッション終了時の一括クローズ
//!
//! A channel is *pending* from dial/accept until the transport reports open;
//! only open channels are in the active set.

use std::{collections::HashMap, sync::Arc};

use crate::domain::{
    ChannelHandle, ChannelId, ConnectRequest, PeerAddress, Transport, TransportError,
};

/// Which side initiated a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

struct TrackedChannel {
    handle: Box<dyn ChannelHandle>,
    direction: Direction,
}

impl TrackedChannel {
    fn is_join_request(&self) -> bool {
        self.handle.metadata().is_some_and(|m| m.is_join_request)
    }
}

/// A channel that just entered the active set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedChannel {
    pub id: ChannelId,
    pub peer: PeerAddress,
    pub direction: Direction,
    /// We accepted a join request on this channel and owe the dialer a backfill
    pub send_backfill: bool,
}

/// A channel that left the connection manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedChannel {
    pub peer: PeerAddress,
    pub was_open: bool,
}

pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    local: Option<PeerAddress>,
    pending: HashMap<ChannelId, TrackedChannel>,
    open: HashMap<PeerAddress, TrackedChannel>,
}

impl ConnectionManager {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            local: None,
            pending: HashMap::new(),
            open: HashMap::new(),
        }
    }

    pub fn set_local_address(&mut self, address: PeerAddress) {
        self.local = Some(address);
    }

    /// Dial a peer. The channel stays pending until its open signal.
    pub fn dial(&mut self, request: ConnectRequest) -> Result<ChannelId, TransportError> {
        let target = request.target.clone();
        let join = request.is_join_request();
        let handle = self.transport.connect(request)?;
        let id = handle.id();
        tracing::info!(
            "Dialing '{}' on channel {}{}",
            target,
            id,
            if join { " (join request)" } else { "" }
        );
        self.pending.insert(
            id,
            TrackedChannel {
                handle,
                direction: Direction::Outbound,
            },
        );
        Ok(id)
    }

    /// Accept an inbound channel. Every inbound channel is accepted.
    pub fn accept(&mut self, handle: Box<dyn ChannelHandle>) -> ChannelId {
        let id = handle.id();
        tracing::info!("Accepted channel {} from '{}'", id, handle.peer());
        self.pending.insert(
            id,
            TrackedChannel {
                handle,
                direction: Direction::Inbound,
            },
        );
        id
    }

    /// Move a pending channel into the active set.
    ///
    /// When both peers dialed each other, both sides keep the channel dialed by
    /// the peer with the smaller address and close the other one.
    pub fn mark_open(&mut self, id: ChannelId) -> Option<OpenedChannel> {
        let channel = self.pending.remove(&id)?;
        let peer = channel.handle.peer().clone();

        if let Some(existing) = self.open.get(&peer)
            && !self.prefers(&peer, channel.direction, existing.direction)
        {
            tracing::debug!(
                "Keeping channel {} to '{}', closing duplicate {}",
                existing.handle.id(),
                peer,
                id
            );
            channel.handle.close();
            return None;
        }

        let opened = OpenedChannel {
            id,
            peer: peer.clone(),
            direction: channel.direction,
            send_backfill: channel.direction == Direction::Inbound && channel.is_join_request(),
        };
        if let Some(replaced) = self.open.insert(peer, channel) {
            tracing::debug!("Replacing channel {} to '{}'", replaced.handle.id(), opened.peer);
            replaced.handle.close();
        }
        Some(opened)
    }

    /// Whether a newly opened channel should win over the one already open.
    fn prefers(&self, peer: &PeerAddress, new: Direction, existing: Direction) -> bool {
        if new == existing {
            return true;
        }
        let Some(local) = self.local.as_ref() else {
            return true;
        };
        let preferred = if local < peer {
            Direction::Outbound
        } else {
            Direction::Inbound
        };
        new == preferred
    }

    /// Forget a channel after its close signal.
    pub fn remove(&mut self, id: ChannelId) -> Option<RemovedChannel> {
        if let Some(channel) = self.pending.remove(&id) {
            return Some(RemovedChannel {
                peer: channel.handle.peer().clone(),
                was_open: false,
            });
        }
        let peer = self.open_peer_of(id)?;
        self.open.remove(&peer);
        Some(RemovedChannel {
            peer,
            was_open: true,
        })
    }

    /// Close one channel; its close signal removes it later.
    pub fn close_channel(&self, id: ChannelId) {
        if let Some(channel) = self.pending.get(&id) {
            channel.handle.close();
        } else if let Some(channel) = self.open.values().find(|c| c.handle.id() == id) {
            channel.handle.close();
        }
    }

    /// Remote address of a pending or open channel.
    pub fn peer_of(&self, id: ChannelId) -> Option<PeerAddress> {
        self.pending
            .get(&id)
            .map(|c| c.handle.peer().clone())
            .or_else(|| self.open_peer_of(id))
    }

    fn open_peer_of(&self, id: ChannelId) -> Option<PeerAddress> {
        self.open
            .iter()
            .find(|(_, c)| c.handle.id() == id)
            .map(|(peer, _)| peer.clone())
    }

    /// Whether any channel, pending or open, leads to `peer`.
    pub fn has_channel_to(&self, peer: &PeerAddress) -> bool {
        self.open.contains_key(peer) || self.pending.values().any(|c| c.handle.peer() == peer)
    }

    pub fn is_open(&self, peer: &PeerAddress) -> bool {
        self.open.contains_key(peer)
    }

    pub fn open_peers(&self) -> Vec<PeerAddress> {
        let mut peers: Vec<PeerAddress> = self.open.keys().cloned().collect();
        peers.sort();
        peers
    }

    pub fn send_to(&self, peer: &PeerAddress, payload: String) -> Result<(), TransportError> {
        match self.open.get(peer) {
            Some(channel) => channel.handle.send(payload),
            None => Err(TransportError::ChannelClosed(peer.as_str().to_string())),
        }
    }

    /// Send `payload` on every open channel, collecting the failures.
    pub fn broadcast(&self, payload: &str) -> Vec<(PeerAddress, TransportError)> {
        let mut failures = Vec::new();
        for (peer, channel) in self.open.iter() {
            match channel.handle.send(payload.to_string()) {
                Ok(()) => tracing::debug!("Broadcasted frame to '{}'", peer),
                Err(e) => {
                    tracing::warn!("Failed to send frame to '{}': {}", peer, e);
                    failures.push((peer.clone(), e));
                }
            }
        }
        failures
    }

    /// Close every channel and release the local address.
    pub fn shutdown(&mut self) {
        for (_, channel) in self.pending.drain() {
            channel.handle.close();
        }
        for (peer, channel) in self.open.drain() {
            tracing::debug!("Closing channel to '{}'", peer);
            channel.handle.close();
        }
        self.transport.release();
    }
}
