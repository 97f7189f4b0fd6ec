//! WebSocket transport implementation using `tokio-tungstenite`.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Write deadline applied to every outbound frame unless overridden.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
    write_timeout: Duration,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self {
            listener,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        })
    }

    /// Sets the write deadline handed to every accepted connection.
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let ws = tokio_tungstenite::accept_async(stream).await.map_err(|e| {
            TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;

        let id = ConnectionId::next();
        tracing::debug!(%id, %addr, "accepted WebSocket connection");

        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            write_timeout: self.write_timeout,
        })
    }
}

/// A single WebSocket connection.
///
/// The socket is split so that a reader parked in [`recv`](Connection::recv)
/// never blocks a writer.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    write_timeout: Duration,
}

impl WebSocketConnection {
    /// Returns the write deadline applied to each send.
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let text = std::str::from_utf8(data).map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        let msg = Message::text(text.to_owned());

        let write = async {
            self.sink.lock().await.send(msg).await.map_err(|e| {
                TransportError::SendFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    e,
                ))
            })
        };

        match tokio::time::timeout(self.write_timeout, write).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::SendTimedOut(self.write_timeout)),
        }
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    /// Sends a close frame, bounded by the same write deadline as
    /// [`send`](Connection::send) so a stalled peer cannot hold it open.
    async fn close(&self) -> Result<(), Self::Error> {
        let close = async {
            self.sink.lock().await.close().await.map_err(|e| {
                TransportError::ConnectionClosed(e.to_string())
            })
        };

        match tokio::time::timeout(self.write_timeout, close).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::SendTimedOut(self.write_timeout)),
        }
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
