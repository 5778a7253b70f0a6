//! Fan-out of server events to the connections in a room.

use std::sync::Arc;

use hangroom_protocol::{Codec, ProtocolError, RoomCode, ServerEvent};
use hangroom_registry::ConnectionRegistry;
use hangroom_transport::{ConnectionId, Delivery};

/// Delivers [`ServerEvent`]s to one connection or to a whole room.
///
/// Each delivery is independent. A recipient that has gone away is
/// removed from the registry and skipped; it never stops delivery to
/// the others and is never reported to whoever caused the event.
pub struct BroadcastRouter<R, D, C> {
    registry: Arc<R>,
    delivery: Arc<D>,
    codec: C,
}

impl<R, D, C> BroadcastRouter<R, D, C>
where
    R: ConnectionRegistry,
    D: Delivery,
    C: Codec,
{
    pub fn new(registry: Arc<R>, delivery: Arc<D>, codec: C) -> Self {
        Self {
            registry,
            delivery,
            codec,
        }
    }

    /// The codec events are encoded with.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Sends `event` to every member of `room` except `exclude`.
    ///
    /// Returns how many members accepted the delivery.
    ///
    /// # Errors
    /// Only if the event can't be encoded; per-recipient failures are
    /// absorbed.
    pub async fn broadcast(
        &self,
        room: &RoomCode,
        event: &ServerEvent,
        exclude: Option<ConnectionId>,
    ) -> Result<usize, ProtocolError> {
        let bytes = self.codec.encode(event)?;
        let members = self.registry.members_of(room).await;

        let mut delivered = 0;
        for member in members.into_iter().filter(|m| Some(*m) != exclude) {
            if self.push(member, bytes.clone()).await {
                delivered += 1;
            }
        }
        tracing::debug!(room = %room, delivered, "broadcast sent");
        Ok(delivered)
    }

    /// Sends `event` to a single connection.
    ///
    /// Returns `false` if the connection was gone.
    ///
    /// # Errors
    /// Only if the event can't be encoded.
    pub async fn send_to_one(
        &self,
        to: ConnectionId,
        event: &ServerEvent,
    ) -> Result<bool, ProtocolError> {
        let bytes = self.codec.encode(event)?;
        Ok(self.push(to, bytes).await)
    }

    async fn push(&self, to: ConnectionId, bytes: Vec<u8>) -> bool {
        match self.delivery.deliver(to, bytes).await {
            Ok(()) => true,
            Err(e) if e.is_gone() => {
                tracing::debug!(conn_id = %to, "recipient gone, unregistering");
                self.registry.unregister(to).await;
                false
            }
            Err(e) => {
                tracing::warn!(conn_id = %to, error = %e, "delivery failed");
                false
            }
        }
    }
}
