//! Room registry: creates rooms on first join and drops them when empty.

use std::collections::HashMap;
use std::sync::Arc;

use skirmish_protocol::{ClientId, RoomId};
use tokio::sync::Mutex;

use crate::{ClientSender, Room, RoomError};

/// Process-wide map from room key to [`Room`].
///
/// The registry lock is separate from each room's lock. Join and leave
/// take the registry lock first and the room lock second, so a room can
/// never be deleted between a lookup and the membership change. All
/// other room operations only hold the registry lock long enough to
/// clone the room handle.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomId, Arc<Room>>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Adds `client` to the room named `room_id`, creating the room if
    /// it does not exist yet.
    ///
    /// # Errors
    /// [`RoomError::AlreadyInRoom`] if the client is already a member;
    /// nothing is broadcast in that case.
    pub async fn join(
        &self,
        room_id: &RoomId,
        client: ClientId,
        sender: ClientSender,
    ) -> Result<Arc<Room>, RoomError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get(room_id)
            .cloned()
            .unwrap_or_else(|| Arc::new(Room::new(room_id.clone())));

        // The room is only published once it has a member, so an
        // abandoned join never leaves an empty room behind.
        room.join(client, sender).await?;
        if !rooms.contains_key(room_id) {
            rooms.insert(room_id.clone(), Arc::clone(&room));
            tracing::info!(%room_id, "room created");
        }
        Ok(room)
    }

    /// Removes `client` from the room named `room_id`. Deletes the room
    /// when its last member leaves.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if the room does not exist.
    /// - [`RoomError::NotInRoom`] if the client is not a member.
    pub async fn leave(&self, room_id: &RoomId, client: &ClientId) -> Result<(), RoomError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;

        if room.leave(client).await? == 0 {
            rooms.remove(room_id);
            tracing::info!(%room_id, "room destroyed");
        }
        Ok(())
    }

    /// Returns a handle to the room named `room_id`, if it exists.
    pub async fn get(&self, room_id: &RoomId) -> Option<Arc<Room>> {
        self.rooms.lock().await.get(room_id).cloned()
    }

    /// Returns the number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
