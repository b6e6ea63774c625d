use crate::protocol::ServerMessage;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

/// Handle to a connection's outbound transport queue. The simulation only
/// ever sees this handle; the websocket itself lives in the transport layer.
pub type ConnectionHandle = UnboundedSender<String>;

#[derive(Debug, Default)]
pub struct Broadcaster {
  connections: HashMap<String, ConnectionHandle>,
}

impl Broadcaster {
  pub fn new() -> Self {
    Self {
      connections: HashMap::new(),
    }
  }

  pub fn register(&mut self, conn_id: String, handle: ConnectionHandle) {
    self.connections.insert(conn_id, handle);
  }

  pub fn unregister(&mut self, conn_id: &str) {
    self.connections.remove(conn_id);
  }

  pub fn send_to(&self, conn_id: &str, message: &ServerMessage) {
    let Ok(payload) = serde_json::to_string(message) else { return };
    if let Some(handle) = self.connections.get(conn_id) {
      let _ = handle.send(payload);
    }
  }

  /// Fire-and-forget fan-out. A dead receiver is left in place; its entry is
  /// removed by that connection's own disconnect, never by the broadcaster.
  pub fn broadcast(&self, message: &ServerMessage) {
    let Ok(payload) = serde_json::to_string(message) else { return };
    for handle in self.connections.values() {
      let _ = handle.send(payload.clone());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::sync::mpsc;

  fn error_message(text: &str) -> ServerMessage {
    ServerMessage::Error {
      message: text.to_string(),
    }
  }

  #[test]
  fn broadcast_reaches_every_connection() {
    let mut broadcaster = Broadcaster::new();
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    broadcaster.register("a".to_string(), tx_a);
    broadcaster.register("b".to_string(), tx_b);

    broadcaster.broadcast(&error_message("hello"));

    assert!(rx_a.try_recv().expect("payload").contains("hello"));
    assert!(rx_b.try_recv().expect("payload").contains("hello"));
  }

  #[test]
  fn send_to_targets_one_connection() {
    let mut broadcaster = Broadcaster::new();
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    broadcaster.register("a".to_string(), tx_a);
    broadcaster.register("b".to_string(), tx_b);

    broadcaster.send_to("a", &error_message("only a"));

    assert!(rx_a.try_recv().is_ok());
    assert!(rx_b.try_recv().is_err());
  }

  #[test]
  fn dead_receiver_does_not_block_the_rest() {
    let mut broadcaster = Broadcaster::new();
    let (tx_a, rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    broadcaster.register("a".to_string(), tx_a);
    broadcaster.register("b".to_string(), tx_b);
    drop(rx_a);

    broadcaster.broadcast(&error_message("still delivered"));

    assert!(rx_b.try_recv().is_ok());
  }
}
