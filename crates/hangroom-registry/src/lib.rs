//! Connection registry for Hangroom.
//!
//! Tracks every live connection: which room it's in (or the lobby) and
//! the name it plays under, with a secondary index answering "which
//! connections are in room X?" for broadcasts.
//!
//! # How it fits in the stack
//!
//! ```text
//! Coordinator / Router (above)  ← resolves rooms, fans out events
//!     ↕
//! Registry (this crate)  ← connection → room, room → connections
//!     ↕
//! Transport / Protocol (below)  ← ConnectionId, RoomCode
//! ```

mod error;
mod memory;
mod record;
mod registry;

pub use error::RegistryError;
pub use memory::InMemoryConnectionRegistry;
pub use record::ConnectionRecord;
pub use registry::ConnectionRegistry;
