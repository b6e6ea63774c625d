use crate::game::broadcast::ConnectionHandle;
use crate::game::grid::Dir;
use crate::game::input::parse_direction;
use crate::game::room::JoinError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::registry::Registry;
use crate::shared::names::validate_player_name;
use std::sync::Arc;

/// Translates socket events into registry and room calls. One gateway is
/// shared by every connection; all per-room state lives behind the room
/// inboxes.
#[derive(Clone)]
pub struct Gateway {
  registry: Arc<Registry>,
}

impl Gateway {
  pub fn new(registry: Arc<Registry>) -> Self {
    Self { registry }
  }

  pub async fn handle_message(&self, conn_id: &str, handle: &ConnectionHandle, text: &str) {
    let Ok(message) = serde_json::from_str::<ClientMessage>(text) else { return };
    match message {
      ClientMessage::Join { name } => self.join(conn_id, &name, handle).await,
      ClientMessage::DirectionChange { dir } => self.direction_change(conn_id, dir),
    }
  }

  async fn join(&self, conn_id: &str, raw_name: &str, handle: &ConnectionHandle) {
    if self.registry.room_of(conn_id).is_some() {
      // Already seated; repeated join intents are ignored.
      return;
    }

    let Some(name) = validate_player_name(raw_name) else {
      send_error(handle, "invalid name");
      return;
    };

    let room = self.registry.assign_room().await;
    match room.join(conn_id.to_string(), name, handle.clone()).await {
      Ok(reply) => {
        self
          .registry
          .register_connection(conn_id.to_string(), reply.room_id);
      }
      Err(JoinError::RoomFull) | Err(JoinError::RoomClosed) => {
        // A room that filled or closed between assignment and join; the next
        // join attempt is routed to a fresh room.
        send_error(handle, "room full");
      }
    }
  }

  fn direction_change(&self, conn_id: &str, dir: Dir) {
    let Some(dir) = parse_direction(dir) else { return };
    let Some(room) = self.registry.room_of(conn_id) else { return };
    room.set_direction(conn_id, dir);
  }

  pub async fn disconnect(&self, conn_id: &str) {
    let room = self.registry.room_of(conn_id);
    self.registry.unregister_connection(conn_id);
    let Some(room) = room else { return };

    let outcome = room.leave(conn_id).await;
    if outcome.now_empty {
      self.registry.remove_room(room.id()).await;
    }
  }
}

fn send_error(handle: &ConnectionHandle, message: &str) {
  let payload = ServerMessage::Error {
    message: message.to_string(),
  };
  if let Ok(text) = serde_json::to_string(&payload) {
    let _ = handle.send(text);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::sync::mpsc::{self, UnboundedReceiver};

  fn gateway() -> Gateway {
    Gateway::new(Arc::new(Registry::new()))
  }

  fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<serde_json::Value> {
    let mut out = Vec::new();
    while let Ok(payload) = rx.try_recv() {
      out.push(serde_json::from_str(&payload).expect("json"));
    }
    out
  }

  #[tokio::test]
  async fn blank_names_are_rejected_without_touching_the_registry() {
    let gateway = gateway();
    let (tx, mut rx) = mpsc::unbounded_channel();

    gateway
      .handle_message("conn-0", &tx, r#"{"type":"join","name":"   "}"#)
      .await;

    let messages = drain(&mut rx);
    assert_eq!(messages[0]["type"], "error");
    assert_eq!(messages[0]["message"], "invalid name");
    assert_eq!(gateway.registry.stats().rooms, 0);
  }

  #[tokio::test]
  async fn join_seats_the_connection_and_replies() {
    let gateway = gateway();
    let (tx, mut rx) = mpsc::unbounded_channel();

    gateway
      .handle_message("conn-0", &tx, r#"{"type":"join","name":"Ada"}"#)
      .await;

    let messages = drain(&mut rx);
    let types: Vec<&str> = messages
      .iter()
      .map(|message| message["type"].as_str().unwrap_or(""))
      .collect();
    assert_eq!(types, vec!["joined", "playerJoined", "state"]);
    assert_eq!(messages[0]["playerId"], "conn-0");
    assert_eq!(messages[0]["playerCount"], 1);
    assert!(gateway.registry.room_of("conn-0").is_some());
  }

  #[tokio::test]
  async fn second_join_from_the_same_connection_is_ignored() {
    let gateway = gateway();
    let (tx, mut rx) = mpsc::unbounded_channel();

    gateway
      .handle_message("conn-0", &tx, r#"{"type":"join","name":"Ada"}"#)
      .await;
    drain(&mut rx);

    gateway
      .handle_message("conn-0", &tx, r#"{"type":"join","name":"Ada again"}"#)
      .await;

    assert!(drain(&mut rx).is_empty());
    assert_eq!(gateway.registry.stats().players, 1);
  }

  #[tokio::test]
  async fn malformed_payloads_are_ignored() {
    let gateway = gateway();
    let (tx, mut rx) = mpsc::unbounded_channel();

    gateway.handle_message("conn-0", &tx, "not json").await;
    gateway
      .handle_message("conn-0", &tx, r#"{"type":"launchMissiles"}"#)
      .await;

    assert!(drain(&mut rx).is_empty());
  }

  #[tokio::test]
  async fn direction_intents_require_a_seat_and_a_valid_vector() {
    let gateway = gateway();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // No seat yet: silently dropped.
    gateway
      .handle_message("conn-0", &tx, r#"{"type":"directionChange","dir":{"x":0,"y":1}}"#)
      .await;

    gateway
      .handle_message("conn-0", &tx, r#"{"type":"join","name":"Ada"}"#)
      .await;
    drain(&mut rx);

    // Diagonals and zero vectors are dropped before reaching the room.
    gateway
      .handle_message("conn-0", &tx, r#"{"type":"directionChange","dir":{"x":1,"y":1}}"#)
      .await;
    gateway
      .handle_message("conn-0", &tx, r#"{"type":"directionChange","dir":{"x":0,"y":0}}"#)
      .await;
    gateway
      .handle_message("conn-0", &tx, r#"{"type":"directionChange","dir":{"x":0,"y":1}}"#)
      .await;

    assert!(drain(&mut rx).is_empty());
  }

  #[tokio::test]
  async fn disconnect_of_the_last_player_removes_the_room() {
    let gateway = gateway();
    let (tx, mut rx) = mpsc::unbounded_channel();

    gateway
      .handle_message("conn-0", &tx, r#"{"type":"join","name":"Ada"}"#)
      .await;
    drain(&mut rx);

    gateway.disconnect("conn-0").await;

    assert_eq!(gateway.registry.stats().rooms, 0);
    assert!(gateway.registry.room_of("conn-0").is_none());
  }

  #[tokio::test]
  async fn disconnect_with_players_remaining_keeps_the_room() {
    let gateway = gateway();
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();

    gateway
      .handle_message("conn-a", &tx_a, r#"{"type":"join","name":"Ada"}"#)
      .await;
    gateway
      .handle_message("conn-b", &tx_b, r#"{"type":"join","name":"Bob"}"#)
      .await;
    drain(&mut rx_a);
    drain(&mut rx_b);

    gateway.disconnect("conn-a").await;

    let messages = drain(&mut rx_b);
    assert_eq!(messages[0]["type"], "playerLeft");
    assert_eq!(messages[0]["playerName"], "Ada");
    assert_eq!(messages[0]["playerCount"], 1);
    assert_eq!(gateway.registry.stats().rooms, 1);
  }
}
