//! UseCase layer: the peer-mesh synchronization engine.
//!
//! - `bootstrap`: decides anchor/joiner and claims the local address
//! - `connection`: owns the channel set
//! - `sync`: applies protocol frames to the shared state
//! - `timeout`: idle-session expiry
//! - `session`: the engine object wiring everything together

pub mod bootstrap;
pub mod connection;
pub mod session;
pub mod sync;
pub mod timeout;

pub use bootstrap::{BootstrapPlan, Role, claim_local_address};
pub use connection::{ConnectionManager, Direction, OpenedChannel};
pub use session::{ConnectionStatus, EndReason, MeshSession, SessionConfig};
pub use sync::{SyncOutcome, SyncProtocolHandler};
pub use timeout::{MonitorState, SessionTimeoutMonitor};
