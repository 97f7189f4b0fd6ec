//! Per-connection handler: identity, read loop, writer task, cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Assign a fresh `ClientId` and an outbound channel
//!   2. Spawn the writer task draining that channel onto the socket
//!   3. Loop: receive frames → decode → route
//!   4. On close, a failed write, a transport failure or a terminal error:
//!      leave the room, stop the writer, close the socket

use std::sync::Arc;

use serde_json::{Map, Value};
use skirmish_protocol::{ClientId, ClientMessage, Codec};
use skirmish_room::ClientReceiver;
use skirmish_transport::{Connection, TransportError, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::SkirmishError;
use crate::router::ClientSession;
use crate::server::ServerState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), SkirmishError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let client_id = ClientId::generate();
    tracing::info!(%conn_id, %client_id, "client connected");

    let (tx, rx) = mpsc::unbounded_channel();
    let mut session = ClientSession::new(client_id.clone(), tx);
    let mut writer = tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&state), rx));

    let result = read_loop(&conn, &state, &mut session, &mut writer).await;

    match &result {
        Ok(()) => {}
        Err(SkirmishError::Transport(e)) => {
            tracing::debug!(%conn_id, %client_id, error = %e, "transport failed");
        }
        Err(e) => {
            tracing::warn!(%conn_id, %client_id, error = %e, "tearing down connection");
        }
    }

    if let Err(e) = session.leave_room(&state.registry).await {
        tracing::debug!(%client_id, error = %e, "leave on disconnect failed");
    }
    writer.abort();
    let _ = conn.close().await;

    tracing::info!(%conn_id, %client_id, "client disconnected");
    result
}

/// Reads frames until the peer closes, the writer stops, or an error
/// ends the session.
///
/// Only the wait for the next frame races the writer; a frame that has
/// been received is always routed to completion, so room membership and
/// `session` never disagree. Non-terminal errors (unknown kind, rejected
/// moves, duplicate join) are logged and the frame dropped.
async fn read_loop<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    session: &mut ClientSession,
    writer: &mut JoinHandle<Result<(), SkirmishError>>,
) -> Result<(), SkirmishError> {
    loop {
        let frame = tokio::select! {
            frame = conn.recv() => frame?,
            joined = &mut *writer => {
                return match joined {
                    Ok(result) => result,
                    Err(e) => Err(TransportError::ConnectionClosed(format!("writer task ended: {e}")).into()),
                };
            }
        };
        let Some(data) = frame else {
            break;
        };

        let object: Map<String, Value> = state.codec.decode(&data)?;

        let result = match ClientMessage::try_from(object) {
            Ok(msg) => session.dispatch(&state.registry, msg).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            if e.is_terminal() {
                return Err(e);
            }
            tracing::debug!(client_id = %session.id(), error = %e, "message dropped");
        }
    }

    tracing::debug!(client_id = %session.id(), "connection closed by peer");
    Ok(())
}

/// Drains the client's outbound channel onto the socket, one frame per
/// message. Each send is bounded by the connection's write deadline.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut rx: ClientReceiver,
) -> Result<(), SkirmishError> {
    while let Some(msg) = rx.recv().await {
        let bytes = state.codec.encode(&msg)?;
        conn.send(&bytes).await?;
    }
    Ok(())
}
