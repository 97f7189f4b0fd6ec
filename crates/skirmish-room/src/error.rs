//! Error types for the room layer.

use skirmish_protocol::{ClientId, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The client sent a room-scoped message before joining any room.
    #[error("client {0} has not joined a room")]
    NotJoined(ClientId),

    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The client is already a member of this room.
    #[error("client {0} already in room {1}")]
    AlreadyInRoom(ClientId, RoomId),

    /// The client is not a member of this room.
    #[error("client {0} not in room {1}")]
    NotInRoom(ClientId, RoomId),

    /// The operation needs a running tournament.
    #[error("room {0} is not playing")]
    NotPlaying(RoomId),

    /// The client was eliminated or joined after the tournament began.
    #[error("client {0} is not an active player in room {1}")]
    NotActivePlayer(ClientId, RoomId),

    /// Round resolution hit a state that cannot occur.
    #[error("tournament invariant violated: {0}")]
    Invariant(String),
}

impl RoomError {
    /// Returns `true` if the client's connection must be torn down.
    ///
    /// Only acting without a room is fatal; every other room error is
    /// logged and the offending message dropped.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NotJoined(_))
    }
}
