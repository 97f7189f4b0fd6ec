//! Message router: applies one decoded client message to room state.

use std::sync::Arc;

use skirmish_protocol::{ClientId, ClientMessage, ServerMessage};
use skirmish_room::{ClientSender, Room, RoomError, RoomRegistry};

use crate::SkirmishError;

/// Per-connection routing state.
///
/// A client is in at most one room. Holding the room handle is safe
/// because a room outlives every one of its members.
pub(crate) struct ClientSession {
    id: ClientId,
    sender: ClientSender,
    room: Option<Arc<Room>>,
}

impl ClientSession {
    pub(crate) fn new(id: ClientId, sender: ClientSender) -> Self {
        Self {
            id,
            sender,
            room: None,
        }
    }

    pub(crate) fn id(&self) -> &ClientId {
        &self.id
    }

    /// Applies `msg` on behalf of this client.
    ///
    /// # Errors
    /// Any room or protocol error. [`RoomError::NotJoined`] for a
    /// room-scoped message sent before `join`; the caller closes the
    /// connection for that one.
    pub(crate) async fn dispatch(
        &mut self,
        registry: &RoomRegistry,
        msg: ClientMessage,
    ) -> Result<(), SkirmishError> {
        tracing::debug!(client_id = %self.id, kind = msg.kind().field(), "routing message");

        match msg {
            ClientMessage::Join { room } => {
                let switching = self.room.as_ref().is_some_and(|current| current.id() != &room);
                if switching {
                    self.leave_room(registry).await?;
                }
                let handle = registry
                    .join(&room, self.id.clone(), self.sender.clone())
                    .await?;
                self.room = Some(handle);
            }
            ClientMessage::Offer { to, message } | ClientMessage::Answer { to, message } => {
                self.joined()?
                    .send_to(&to, ServerMessage::Relay(message))
                    .await;
            }
            ClientMessage::Ice { message } => {
                self.joined()?
                    .broadcast_except(ServerMessage::Relay(message), &self.id)
                    .await;
            }
            ClientMessage::Leave => {
                self.joined()?;
                self.leave_room(registry).await?;
            }
            ClientMessage::Fight => {
                self.joined()?.fight(&self.id).await?;
            }
            ClientMessage::Shoot { choice } => {
                self.joined()?.shoot(&self.id, choice).await?;
            }
        }
        Ok(())
    }

    /// Leaves the current room, if any. Used for `leave` and for
    /// connection teardown.
    pub(crate) async fn leave_room(&mut self, registry: &RoomRegistry) -> Result<(), SkirmishError> {
        let Some(room) = self.room.clone() else {
            return Ok(());
        };
        // Forget the room only once the registry has let go of us; a
        // cancelled leave must stay retryable.
        registry.leave(room.id(), &self.id).await?;
        self.room = None;
        Ok(())
    }

    fn joined(&self) -> Result<&Arc<Room>, RoomError> {
        self.room
            .as_ref()
            .ok_or_else(|| RoomError::NotJoined(self.id.clone()))
    }
}
