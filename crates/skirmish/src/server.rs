//! `SkirmishServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room.

use std::sync::Arc;
use std::time::Duration;

use skirmish_protocol::{Codec, JsonCodec};
use skirmish_room::RoomRegistry;
use skirmish_transport::{Transport, WebSocketTransport};

use crate::SkirmishError;
use crate::config::ServerConfig;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: RoomRegistry,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Skirmish server.
///
/// # Example
///
/// ```rust,no_run
/// use skirmish::prelude::*;
///
/// # async fn start() -> Result<(), SkirmishError> {
/// let server = SkirmishServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct SkirmishServerBuilder {
    config: ServerConfig,
}

impl SkirmishServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces every setting with `config`.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_address = addr.to_string();
        self
    }

    /// Sets the deadline for each outbound frame.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    /// Binds the listener. Frames are JSON over WebSocket.
    pub async fn build(self) -> Result<SkirmishServer<JsonCodec>, SkirmishError> {
        let transport = WebSocketTransport::bind(&self.config.bind_address)
            .await?
            .with_write_timeout(self.config.write_timeout);

        let state = Arc::new(ServerState {
            registry: RoomRegistry::new(),
            codec: JsonCodec,
        });

        Ok(SkirmishServer { transport, state })
    }
}

impl Default for SkirmishServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Skirmish relay.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SkirmishServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl SkirmishServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> SkirmishServerBuilder {
        SkirmishServerBuilder::new()
    }
}

impl<C: Codec> SkirmishServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop, spawning one handler task per connection.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), SkirmishError> {
        tracing::info!(addr = ?self.local_addr().ok(), "skirmish relay running");

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
