//! `HangroomServer` builder and server loop.
//!
//! This is the entry point for running a Hangroom server. It ties
//! together all the layers: transport → protocol → registry/room →
//! coordinator.

use std::sync::Arc;
use std::time::Duration;

use hangroom_protocol::JsonCodec;
use hangroom_registry::{ConnectionRegistry, InMemoryConnectionRegistry};
use hangroom_room::{InMemorySessionStore, RoomConfig, SessionStore, WordList};
use hangroom_transport::{Outbox, Transport, WebSocketTransport};
use serde::{Deserialize, Serialize};

use crate::handler::handle_connection;
use crate::{CoordinatorConfig, HangroomError, SessionCoordinator};

/// Network-facing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// A connection with no inbound message for this long is closed.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            idle_timeout: Duration::from_secs(10 * 60),
        }
    }
}

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState<S, R> {
    pub(crate) coordinator: SessionCoordinator<S, R, Outbox, JsonCodec>,
    pub(crate) outbox: Arc<Outbox>,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a Hangroom server.
///
/// # Example
///
/// ```rust,no_run
/// use hangroom::prelude::*;
///
/// # async fn start() -> Result<(), HangroomError> {
/// let server = HangroomServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct HangroomServerBuilder {
    config: ServerConfig,
    rooms: RoomConfig,
    coordinator: CoordinatorConfig,
    words: WordList,
}

impl HangroomServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            rooms: RoomConfig::default(),
            coordinator: CoordinatorConfig::default(),
            words: WordList::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets how long a silent connection is kept open.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Sets the room settings.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.rooms = config;
        self
    }

    /// Sets the coordinator settings.
    pub fn coordinator_config(mut self, config: CoordinatorConfig) -> Self {
        self.coordinator = config;
        self
    }

    /// Sets the words games are drawn from.
    pub fn words(mut self, words: WordList) -> Self {
        self.words = words;
        self
    }

    /// Binds the listener with in-memory room and connection state.
    pub async fn build(
        self,
    ) -> Result<HangroomServer<InMemorySessionStore, InMemoryConnectionRegistry>, HangroomError>
    {
        self.build_with(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryConnectionRegistry::new()),
        )
        .await
    }

    /// Binds the listener on top of the given store and registry.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build_with<S, R>(
        self,
        store: Arc<S>,
        registry: Arc<R>,
    ) -> Result<HangroomServer<S, R>, HangroomError>
    where
        S: SessionStore,
        R: ConnectionRegistry,
    {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let outbox = Arc::new(Outbox::new());

        let coordinator =
            SessionCoordinator::new(store, registry, Arc::clone(&outbox), JsonCodec)
                .with_words(self.words)
                .with_room_config(self.rooms)
                .with_config(self.coordinator);

        let state = Arc::new(ServerState {
            coordinator,
            outbox,
            config: self.config,
        });

        Ok(HangroomServer { transport, state })
    }
}

impl Default for HangroomServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Hangroom server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct HangroomServer<S, R> {
    transport: WebSocketTransport,
    state: Arc<ServerState<S, R>>,
}

impl HangroomServer<InMemorySessionStore, InMemoryConnectionRegistry> {
    /// Creates a new builder.
    pub fn builder() -> HangroomServerBuilder {
        HangroomServerBuilder::new()
    }
}

impl<S, R> HangroomServer<S, R>
where
    S: SessionStore,
    R: ConnectionRegistry,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), HangroomError> {
        tracing::info!(addr = %self.state.config.bind_addr, "Hangroom server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
