use crate::game::room::Room;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Owns the room-id → room map and the connection-id → room-id reverse index.
/// Rooms are scanned in creation order when seating a new player; closed
/// rooms are swept out of the scan as they are encountered.
#[derive(Debug, Default)]
pub struct Registry {
  rooms: DashMap<String, Arc<Room>>,
  room_order: Mutex<Vec<String>>,
  player_rooms: DashMap<String, String>,
}

#[derive(Debug, Clone, Copy)]
pub struct RegistryStats {
  pub rooms: usize,
  pub players: usize,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the earliest-created room with a free seat, creating a new one
  /// when every live room is full.
  pub async fn assign_room(&self) -> Arc<Room> {
    let mut order = self.room_order.lock().await;

    order.retain(|room_id| {
      let live = self
        .rooms
        .get(room_id)
        .map(|room| !room.is_closed())
        .unwrap_or(false);
      if !live {
        self.rooms.remove(room_id);
      }
      live
    });

    for room_id in order.iter() {
      if let Some(room) = self.rooms.get(room_id) {
        if room.has_capacity() {
          return Arc::clone(room.value());
        }
      }
    }

    let room = Room::spawn();
    self.rooms.insert(room.id().to_string(), Arc::clone(&room));
    order.push(room.id().to_string());
    room
  }

  pub async fn remove_room(&self, room_id: &str) {
    if self.rooms.remove(room_id).is_some() {
      tracing::info!(room_id, "room removed");
    }
    let mut order = self.room_order.lock().await;
    order.retain(|id| id != room_id);
  }

  pub fn register_connection(&self, conn_id: String, room_id: String) {
    self.player_rooms.insert(conn_id, room_id);
  }

  pub fn unregister_connection(&self, conn_id: &str) {
    self.player_rooms.remove(conn_id);
  }

  pub fn room_of(&self, conn_id: &str) -> Option<Arc<Room>> {
    let room_id = self.player_rooms.get(conn_id)?.value().clone();
    self
      .rooms
      .get(&room_id)
      .map(|entry| Arc::clone(entry.value()))
  }

  pub fn stats(&self) -> RegistryStats {
    let mut rooms = 0;
    let mut players = 0;
    for entry in self.rooms.iter() {
      if entry.value().is_closed() {
        continue;
      }
      rooms += 1;
      players += entry.value().player_count();
    }
    RegistryStats { rooms, players }
  }
}
