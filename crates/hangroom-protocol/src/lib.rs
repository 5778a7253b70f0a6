//! Wire protocol for Hangroom.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`ClientRequest`], [`ServerEvent`], [`GameStateView`],
//!   [`RoomCode`]): the messages that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`], [`decode_request`]): how
//!   those messages are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong at that boundary.
//!
//! The protocol layer knows nothing about connections or game rules.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientRequest) → Coordinator (rooms)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, decode_request};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientRequest, GameStateView, GameStatus, PlayerView, RoomCode, ServerEvent,
};
