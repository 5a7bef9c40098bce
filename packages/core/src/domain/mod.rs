//! Domain layer: value objects, entities, frames, errors and the traits the engine consumes.

pub mod entity;
pub mod error;
pub mod frame;
pub mod notice;
pub mod state;
pub mod transport;
pub mod value_object;

pub use entity::{Message, Participant};
pub use error::{BootstrapError, ProtocolError, SessionError, TransportError, ValueObjectError};
pub use frame::Frame;
pub use notice::{Notice, NoticeBoard, NoticeKind};
pub use state::SharedState;
pub use transport::{
    ChannelHandle, ChannelId, ChannelSignal, ConnectMetadata, ConnectRequest, EventSender,
    Transport, TransportEvent,
};
pub use value_object::{DisplayName, MessageContent, MessageId, PeerAddress, RoomId, Timestamp};
