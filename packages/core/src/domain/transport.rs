//! Transport trait 定義
//!
//! エンジンが消費する「ピアとの信頼性のある順序付きチャンネル」の抽象。
//! NAT 越えやシグナリングなどの具体的な実装は Infrastructure 層が提供します。

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    error::{BootstrapError, TransportError},
    value_object::PeerAddress,
};

/// Transport-assigned identifier of one channel endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Metadata attached to a connection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectMetadata {
    /// Set by a newcomer dialing the anchor; asks the remote side for a backfill
    pub is_join_request: bool,
}

impl ConnectMetadata {
    pub fn join_request() -> Self {
        Self {
            is_join_request: true,
        }
    }
}

/// Request to open a channel to `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub target: PeerAddress,
    pub metadata: Option<ConnectMetadata>,
}

impl ConnectRequest {
    pub fn new(target: PeerAddress) -> Self {
        Self {
            target,
            metadata: None,
        }
    }

    pub fn join(target: PeerAddress) -> Self {
        Self {
            target,
            metadata: Some(ConnectMetadata::join_request()),
        }
    }

    pub fn is_join_request(&self) -> bool {
        self.metadata.is_some_and(|m| m.is_join_request)
    }
}

/// One end of a reliable ordered channel.
pub trait ChannelHandle: Send + Sync + fmt::Debug {
    fn id(&self) -> ChannelId;

    /// Address of the remote peer
    fn peer(&self) -> &PeerAddress;

    /// Metadata the dialing side attached, visible on both ends
    fn metadata(&self) -> Option<ConnectMetadata>;

    fn send(&self, payload: String) -> Result<(), TransportError>;

    fn close(&self);
}

/// Lifecycle signal of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSignal {
    Open,
    Data(String),
    Close,
    Error(String),
}

/// Everything the transport reports back to the engine.
#[derive(Debug)]
pub enum TransportEvent {
    /// A remote peer dialed us
    Incoming(Box<dyn ChannelHandle>),
    /// A signal for an already known channel
    Channel {
        id: ChannelId,
        signal: ChannelSignal,
    },
}

/// Sender half of the engine's event queue, handed to the transport on open
pub type EventSender = mpsc::UnboundedSender<TransportEvent>;

/// Point-to-point transport substrate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Claim a local address. `None` asks the substrate to assign one.
    ///
    /// Signals for every channel of this endpoint are delivered to `events`.
    async fn open(
        &self,
        desired: Option<PeerAddress>,
        events: EventSender,
    ) -> Result<PeerAddress, BootstrapError>;

    /// Start dialing a peer. The returned channel is usable once `Open` arrives.
    fn connect(&self, request: ConnectRequest) -> Result<Box<dyn ChannelHandle>, TransportError>;

    /// Give up the local address.
    fn release(&self);
}
