//! UseCase: Identity Bootstrap
//!
//! ルームを作成したクライアントだけがアンカーとなり、ルーム ID そのものを
//! アドレスとして要求します。それ以外のクライアントはアドレスを払い出してもらい、
//! 接続後にルーム ID（アンカーのアドレス）へ接続します。
//!
//! アドレス取得の失敗は自動で再試行しません。

use crate::domain::{BootstrapError, EventSender, PeerAddress, RoomId, Transport};

/// Part this client plays in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Created the room; its address is the room id
    Anchor,
    /// Gets an assigned address and dials the anchor
    Joiner,
}

/// Outcome of the bootstrap decision for one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapPlan {
    pub room: RoomId,
    pub role: Role,
}

impl BootstrapPlan {
    /// Plan for the client that requested creation of `room`.
    pub fn create(room: RoomId) -> Self {
        Self {
            room,
            role: Role::Anchor,
        }
    }

    /// Plan for every other client of `room`.
    pub fn join(room: RoomId) -> Self {
        Self {
            room,
            role: Role::Joiner,
        }
    }

    pub fn is_anchor(&self) -> bool {
        self.role == Role::Anchor
    }

    /// Address to request from the substrate; `None` means "assign one".
    pub fn requested_address(&self) -> Option<PeerAddress> {
        match self.role {
            Role::Anchor => Some(self.room.anchor_address()),
            Role::Joiner => None,
        }
    }

    pub fn anchor_address(&self) -> PeerAddress {
        self.room.anchor_address()
    }
}

/// Claim the local address dictated by `plan`.
///
/// Channel signals for the claimed endpoint flow into `events`.
pub async fn claim_local_address(
    transport: &dyn Transport,
    plan: &BootstrapPlan,
    events: EventSender,
) -> Result<PeerAddress, BootstrapError> {
    let requested = plan.requested_address();
    tracing::info!(
        "Claiming {} address for room '{}' as {:?}",
        match &requested {
            Some(address) => format!("fixed '{}'", address),
            None => "an assigned".to_string(),
        },
        plan.room,
        plan.role
    );

    match transport.open(requested, events).await {
        Ok(address) => {
            tracing::info!("Local address is '{}'", address);
            Ok(address)
        }
        Err(e) => {
            tracing::error!("Failed to claim local address: {}", e);
            Err(e)
        }
    }
}
