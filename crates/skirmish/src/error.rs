//! Unified error type for the Skirmish server.

use skirmish_protocol::ProtocolError;
use skirmish_room::RoomError;
use skirmish_transport::TransportError;

use crate::config::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not joined, not a member, not playing).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Invalid server configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SkirmishError {
    /// Returns `true` if the error ends the client's connection.
    ///
    /// Transport failures always do. Protocol and room errors defer to
    /// their own classification: a frame with no recognized kind or a
    /// rejected game move is dropped, a malformed frame or acting before
    /// `join` is not.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Config(_) => true,
            Self::Protocol(e) => e.is_terminal(),
            Self::Room(e) => e.is_terminal(),
        }
    }
}
