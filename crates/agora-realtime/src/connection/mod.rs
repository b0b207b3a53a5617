//! Connection state: the registry-owned record, and the transport-side
//! handle, pool, and heartbeat.

pub mod handle;
pub mod heartbeat;
pub mod pool;
pub mod record;

pub use handle::{ConnectionHandle, Frame};
pub use pool::ConnectionPool;
pub use record::{ConnectionInfo, ConnectionRecord};
