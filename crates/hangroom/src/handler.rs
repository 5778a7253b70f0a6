//! Per-connection handler: inbound requests and outbound pushes.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Attach an outbound queue and register in the lobby
//!   2. Loop: decode requests into the coordinator, drain pushed events
//!      into the socket, and close after `idle_timeout` without input
//!   3. On exit (clean or not) the guard runs disconnect handling

use std::sync::Arc;

use hangroom_registry::ConnectionRegistry;
use hangroom_room::SessionStore;
use hangroom_transport::{Connection, ConnectionId, OutboxReceiver, WebSocketConnection};
use tokio::time::Instant;

use crate::HangroomError;
use crate::server::ServerState;

/// Drop guard that runs disconnect handling when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async work.
/// The outbound queue is held until the player has left their room, so
/// broadcasts racing with the disconnect never see the connection as
/// gone and unregister it before its seat is released.
struct DisconnectGuard<S: SessionStore, R: ConnectionRegistry> {
    conn_id: ConnectionId,
    state: Arc<ServerState<S, R>>,
    outbound: Option<OutboxReceiver>,
}

impl<S: SessionStore, R: ConnectionRegistry> Drop for DisconnectGuard<S, R> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        let outbound = self.outbound.take();
        tokio::spawn(async move {
            if let Err(e) = state.coordinator.disconnect(conn_id).await {
                tracing::warn!(%conn_id, error = %e, "disconnect cleanup failed");
            }
            state.outbox.detach(conn_id).await;
            drop(outbound);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, R>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S, R>>,
) -> Result<(), HangroomError>
where
    S: SessionStore,
    R: ConnectionRegistry,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let outbound = state.outbox.attach(conn_id).await;
    state.coordinator.connect(conn_id).await;
    let mut guard = DisconnectGuard {
        conn_id,
        state: Arc::clone(&state),
        outbound: Some(outbound),
    };
    let Some(outbound) = guard.outbound.as_mut() else {
        return Ok(());
    };

    let idle_timeout = state.config.idle_timeout;
    let idle = tokio::time::sleep(idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            inbound = conn.recv() => match inbound {
                Ok(Some(data)) => {
                    idle.as_mut().reset(Instant::now() + idle_timeout);
                    if let Err(e) = state.coordinator.handle_bytes(conn_id, &data).await {
                        tracing::error!(%conn_id, error = %e, "request failed");
                    }
                }
                Ok(None) => {
                    tracing::info!(%conn_id, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    break;
                }
            },

            pushed = outbound.recv() => match pushed {
                Some(data) => conn.send(&data).await?,
                None => {
                    tracing::debug!(%conn_id, "outbound queue closed");
                    break;
                }
            },

            () = &mut idle => {
                tracing::info!(%conn_id, "connection idle, closing");
                break;
            }
        }
    }

    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }
    // guard drops here → disconnect fires.
    Ok(())
}
