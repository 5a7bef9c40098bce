//! In-process transport substrate.
//!
//! ## 責務
//!
//! - アドレスの払い出しと衝突検出（アンカーのアドレスは早い者勝ち）
//! - エンドポイント間のチャンネル生成と、チャンネルごとの順序付き配送
//! - 対称的なクローズ、障害の注入（`sever`, `set_offline`）
//!
//! Each endpoint owns one event queue; both ends of a channel push into the
//! other end's queue, so per-channel ordering is the queue's FIFO order.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    BootstrapError, ChannelHandle, ChannelId, ChannelSignal, ConnectMetadata, ConnectRequest,
    EventSender, PeerAddress, Transport, TransportError, TransportEvent,
};

#[derive(Default)]
struct NetworkState {
    endpoints: HashMap<PeerAddress, EventSender>,
    links: Vec<Link>,
    next_channel: u64,
    offline: bool,
}

impl NetworkState {
    fn allocate_channel_id(&mut self) -> ChannelId {
        self.next_channel += 1;
        ChannelId(self.next_channel)
    }

    /// Forget links whose channel has been closed from either end.
    fn prune_closed_links(&mut self) {
        self.links.retain(|link| !link.closed.load(Ordering::SeqCst));
    }
}

/// Both ends of one channel, kept so the network can fail them from outside.
struct Link {
    ends: [LinkEnd; 2],
    closed: Arc<AtomicBool>,
}

#[derive(Clone)]
struct LinkEnd {
    id: ChannelId,
    owner: PeerAddress,
    events: EventSender,
}

/// A shared in-process network that hands out endpoints.
#[derive(Clone, Default)]
pub struct InMemoryNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl InMemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an endpoint on this network. It holds no address until `open`.
    pub fn transport(&self) -> InMemoryTransport {
        InMemoryTransport {
            network: self.clone(),
            local: Mutex::new(None),
        }
    }

    /// While offline every `open` fails with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn is_registered(&self, address: &PeerAddress) -> bool {
        self.lock().endpoints.contains_key(address)
    }

    /// Simulate an abrupt drop of `address`: every open channel it takes part
    /// in is closed on both ends and the address is unregistered.
    ///
    /// With a `reason`, the surviving ends first observe an error signal.
    pub fn sever(&self, address: &PeerAddress, reason: Option<&str>) {
        let mut state = self.lock();
        state.endpoints.remove(address);

        for link in state.links.iter() {
            if !link.ends.iter().any(|end| &end.owner == address) {
                continue;
            }
            if link.closed.swap(true, Ordering::SeqCst) {
                continue;
            }
            for end in link.ends.iter() {
                if let Some(reason) = reason
                    && &end.owner != address
                {
                    let _ = end.events.send(TransportEvent::Channel {
                        id: end.id,
                        signal: ChannelSignal::Error(reason.to_string()),
                    });
                }
                let _ = end.events.send(TransportEvent::Channel {
                    id: end.id,
                    signal: ChannelSignal::Close,
                });
            }
        }
        state.prune_closed_links();
        tracing::debug!("Severed '{}' from the in-memory network", address);
    }

    #[cfg(test)]
    fn link_count(&self) -> usize {
        self.lock().links.len()
    }

    fn lock(&self) -> MutexGuard<'_, NetworkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One endpoint of an [`InMemoryNetwork`].
pub struct InMemoryTransport {
    network: InMemoryNetwork,
    local: Mutex<Option<PeerAddress>>,
}

impl InMemoryTransport {
    pub fn local_address(&self) -> Option<PeerAddress> {
        self.local
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn open(
        &self,
        desired: Option<PeerAddress>,
        events: EventSender,
    ) -> Result<PeerAddress, BootstrapError> {
        let mut state = self.network.lock();
        if state.offline {
            return Err(BootstrapError::Network(
                "in-memory network is offline".to_string(),
            ));
        }

        let address = match desired {
            Some(address) => {
                if state.endpoints.contains_key(&address) {
                    return Err(BootstrapError::AddressUnavailable(
                        address.as_str().to_string(),
                    ));
                }
                address
            }
            None => PeerAddress::new(Uuid::new_v4().to_string())
                .map_err(|e| BootstrapError::Substrate(e.to_string()))?,
        };

        state.endpoints.insert(address.clone(), events);
        *self.local.lock().unwrap_or_else(PoisonError::into_inner) = Some(address.clone());
        tracing::debug!("Endpoint registered at '{}'", address);
        Ok(address)
    }

    fn connect(&self, request: ConnectRequest) -> Result<Box<dyn ChannelHandle>, TransportError> {
        let local = self
            .local_address()
            .ok_or_else(|| TransportError::Connection("endpoint is not open".to_string()))?;

        let mut state = self.network.lock();
        let remote_events = state
            .endpoints
            .get(&request.target)
            .cloned()
            .ok_or_else(|| TransportError::JoinFailed(request.target.as_str().to_string()))?;
        let local_events = state
            .endpoints
            .get(&local)
            .cloned()
            .ok_or_else(|| TransportError::Connection("endpoint is not open".to_string()))?;

        let local_end = LinkEnd {
            id: state.allocate_channel_id(),
            owner: local.clone(),
            events: local_events,
        };
        let remote_end = LinkEnd {
            id: state.allocate_channel_id(),
            owner: request.target.clone(),
            events: remote_events,
        };
        let closed = Arc::new(AtomicBool::new(false));

        let outbound = InMemoryChannel {
            own: local_end.clone(),
            remote: remote_end.clone(),
            metadata: request.metadata,
            closed: closed.clone(),
        };
        let inbound = InMemoryChannel {
            own: remote_end.clone(),
            remote: local_end.clone(),
            metadata: request.metadata,
            closed: closed.clone(),
        };

        remote_end
            .events
            .send(TransportEvent::Incoming(Box::new(inbound)))
            .map_err(|_| TransportError::JoinFailed(request.target.as_str().to_string()))?;
        let _ = remote_end.events.send(TransportEvent::Channel {
            id: remote_end.id,
            signal: ChannelSignal::Open,
        });
        let _ = local_end.events.send(TransportEvent::Channel {
            id: local_end.id,
            signal: ChannelSignal::Open,
        });

        state.prune_closed_links();
        state.links.push(Link {
            ends: [local_end, remote_end],
            closed,
        });

        Ok(Box::new(outbound))
    }

    fn release(&self) {
        let local = self
            .local
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(address) = local {
            let mut state = self.network.lock();
            state.endpoints.remove(&address);
            state.prune_closed_links();
            tracing::debug!("Endpoint '{}' released", address);
        }
    }
}

/// One end of an in-memory channel.
pub struct InMemoryChannel {
    own: LinkEnd,
    remote: LinkEnd,
    metadata: Option<ConnectMetadata>,
    closed: Arc<AtomicBool>,
}

impl std::fmt::Debug for InMemoryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryChannel")
            .field("id", &self.own.id)
            .field("peer", &self.remote.owner)
            .field("metadata", &self.metadata)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl ChannelHandle for InMemoryChannel {
    fn id(&self) -> ChannelId {
        self.own.id
    }

    fn peer(&self) -> &PeerAddress {
        &self.remote.owner
    }

    fn metadata(&self) -> Option<ConnectMetadata> {
        self.metadata
    }

    fn send(&self, payload: String) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ChannelClosed(
                self.remote.owner.as_str().to_string(),
            ));
        }
        self.remote
            .events
            .send(TransportEvent::Channel {
                id: self.remote.id,
                signal: ChannelSignal::Data(payload),
            })
            .map_err(|e| TransportError::Connection(e.to_string()))
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        for end in [&self.own, &self.remote] {
            let _ = end.events.send(TransportEvent::Channel {
                id: end.id,
                signal: ChannelSignal::Close,
            });
        }
    }
}
