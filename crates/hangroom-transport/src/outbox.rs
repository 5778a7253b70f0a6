//! Per-connection outbound queues.
//!
//! Every live connection owns an unbounded queue. The connection's handler
//! task drains it into the socket; everything else in the server only
//! pushes into it by [`ConnectionId`]. Pushing never waits on the peer.

use std::collections::HashMap;

use tokio::sync::{Mutex, mpsc};

use crate::{ConnectionId, Delivery, TransportError};

/// Receiving half of a connection's outbound queue.
pub type OutboxReceiver = mpsc::UnboundedReceiver<Vec<u8>>;

/// Routes pushed messages to the queue of the addressed connection.
#[derive(Debug, Default)]
pub struct Outbox {
    queues: Mutex<HashMap<ConnectionId, mpsc::UnboundedSender<Vec<u8>>>>,
}

impl Outbox {
    /// Creates an outbox with no attached connections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a queue for `id` and returns its receiving half.
    ///
    /// Re-attaching an id replaces (and closes) the previous queue.
    pub async fn attach(&self, id: ConnectionId) -> OutboxReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.queues.lock().await.insert(id, tx);
        tracing::debug!(%id, "outbox attached");
        rx
    }

    /// Drops the queue for `id`. Later pushes report the recipient gone.
    pub async fn detach(&self, id: ConnectionId) {
        if self.queues.lock().await.remove(&id).is_some() {
            tracing::debug!(%id, "outbox detached");
        }
    }

    /// Returns the number of attached connections.
    pub async fn len(&self) -> usize {
        self.queues.lock().await.len()
    }

    /// Returns `true` if no connection is attached.
    pub async fn is_empty(&self) -> bool {
        self.queues.lock().await.is_empty()
    }
}

impl Delivery for Outbox {
    async fn deliver(
        &self,
        to: ConnectionId,
        data: Vec<u8>,
    ) -> Result<(), TransportError> {
        let mut queues = self.queues.lock().await;
        let sender = queues.get(&to).ok_or(TransportError::RecipientGone(to))?;
        if sender.send(data).is_err() {
            // The handler dropped its receiver without detaching.
            queues.remove(&to);
            return Err(TransportError::RecipientGone(to));
        }
        Ok(())
    }
}
