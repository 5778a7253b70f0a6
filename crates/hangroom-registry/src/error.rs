//! Error types for the registry layer.

use hangroom_transport::ConnectionId;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No record exists for the connection. It was never registered, or
    /// it was already removed by a disconnect or a failed delivery.
    #[error("connection {0} not registered")]
    NotFound(ConnectionId),
}
