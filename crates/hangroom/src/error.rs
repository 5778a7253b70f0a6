//! Unified error type for the Hangroom server.

use hangroom_protocol::ProtocolError;
use hangroom_registry::RegistryError;
use hangroom_room::{GameError, StoreError, WordListError};
use hangroom_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically. Only [`Game`](Self::Game)
/// is ever shown to a client; everything else stays in the server logs.
#[derive(Debug, thiserror::Error)]
pub enum HangroomError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unknown action).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The connection registry had no record of a connection.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The session store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A request was refused by the game rules.
    #[error(transparent)]
    Game(#[from] GameError),

    /// A configured word list couldn't be used.
    #[error(transparent)]
    WordList(#[from] WordListError),
}

#[cfg(test)]
mod tests {
    use hangroom_protocol::RoomCode;
    use hangroom_transport::ConnectionId;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let hangroom_err: HangroomError = err.into();
        assert!(matches!(hangroom_err, HangroomError::Transport(_)));
        assert!(hangroom_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownAction("dance".into());
        let hangroom_err: HangroomError = err.into();
        assert!(matches!(hangroom_err, HangroomError::Protocol(_)));
    }

    #[test]
    fn test_from_registry_error() {
        let err = RegistryError::NotFound(ConnectionId::new(3));
        let hangroom_err: HangroomError = err.into();
        assert!(matches!(hangroom_err, HangroomError::Registry(_)));
    }

    #[test]
    fn test_from_store_error() {
        let err = StoreError::NotFound(RoomCode::parse("ABCD").unwrap());
        let hangroom_err: HangroomError = err.into();
        assert!(matches!(hangroom_err, HangroomError::Store(_)));
    }

    #[test]
    fn test_from_game_error_keeps_client_message() {
        let hangroom_err: HangroomError = GameError::NotYourTurn.into();
        assert_eq!(hangroom_err.to_string(), "Not your turn");
    }
}
