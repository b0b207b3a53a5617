//! Rooms and the connection/room registry.

pub mod registry;
pub mod room;

pub use registry::Registry;
pub use room::{Room, RoomSummary};
