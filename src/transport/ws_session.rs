use crate::gateway::Gateway;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

pub async fn handle_socket(socket: WebSocket, gateway: Gateway) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let conn_id = Uuid::new_v4().to_string();

    let send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    tracing::debug!(conn_id = %conn_id, "connection opened");

    while let Some(result) = receiver.next().await {
        let Ok(message) = result else { break };
        match message {
            Message::Text(text) => {
                gateway.handle_message(&conn_id, &tx, &text).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    gateway.disconnect(&conn_id).await;
    tracing::debug!(conn_id = %conn_id, "connection closed");
    send_task.abort();
}
