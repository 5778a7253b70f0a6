use crate::ConnectionId;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The addressed connection no longer exists. Pushes to it will
    /// never succeed again, so callers should forget the connection.
    #[error("recipient {0} is gone")]
    RecipientGone(ConnectionId),
}

impl TransportError {
    /// Returns `true` if the error means the peer is permanently gone.
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::RecipientGone(_) | Self::ConnectionClosed(_))
    }
}
