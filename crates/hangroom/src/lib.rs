//! # Hangroom
//!
//! A two-player, turn-based hangman server over WebSockets.
//!
//! Players create a room, share its four-letter code, and take turns
//! guessing letters of a secret word. The server is authoritative: every
//! request is checked against the room's current session and only
//! accepted transitions are broadcast to the room.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hangroom::prelude::*;
//!
//! # async fn start() -> Result<(), HangroomError> {
//! let server = HangroomServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .words(WordList::new(["rust", "tokio", "ferris"])?)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod coordinator;
mod error;
mod handler;
mod router;
mod server;

pub use coordinator::{CoordinatorConfig, SessionCoordinator};
pub use error::HangroomError;
pub use router::BroadcastRouter;
pub use server::{HangroomServer, HangroomServerBuilder, ServerConfig};

pub mod prelude {
    pub use crate::{
        BroadcastRouter, CoordinatorConfig, HangroomError, HangroomServer, HangroomServerBuilder,
        ServerConfig, SessionCoordinator,
    };
    pub use hangroom_protocol::{
        ClientRequest, Codec, GameStateView, GameStatus, JsonCodec, PlayerView, RoomCode,
        ServerEvent,
    };
    pub use hangroom_registry::{ConnectionRegistry, InMemoryConnectionRegistry};
    pub use hangroom_room::{
        GameError, GameSession, InMemorySessionStore, RoomConfig, SessionStore, WordList,
    };
    pub use hangroom_transport::{ConnectionId, Delivery, Outbox};
}
