use axum::{
  extract::{State, WebSocketUpgrade},
  http::Method,
  response::IntoResponse,
  routing::get,
  Json, Router,
};
use serde::Serialize;
use std::env;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

mod game;
mod gateway;
mod protocol;
mod registry;
mod shared;
mod transport;

use gateway::Gateway;
use registry::Registry;
use transport::ws_session::handle_socket;

#[derive(Clone)]
struct AppState {
  gateway: Gateway,
  registry: Arc<Registry>,
}

#[derive(Debug, Serialize)]
struct OkResponse {
  ok: bool,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
  rooms: usize,
  players: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let registry = Arc::new(Registry::new());
  let state = Arc::new(AppState {
    gateway: Gateway::new(Arc::clone(&registry)),
    registry,
  });

  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET, Method::POST])
    .allow_headers(Any);

  let app: Router = Router::new()
    .route("/api/health", get(health))
    .route("/api/stats", get(stats))
    .route("/api/ws", get(ws_handler))
    .layer(cors)
    .with_state(state);

  let port: u16 = env::var("PORT")
    .ok()
    .and_then(|value| value.parse().ok())
    .unwrap_or(8787);

  let address = format!("0.0.0.0:{port}");
  tracing::info!("listening on {address}");

  let listener = tokio::net::TcpListener::bind(&address).await?;
  axum::serve(listener, app).await?;

  Ok(())
}

async fn health() -> impl IntoResponse {
  Json(OkResponse { ok: true })
}

async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let stats = state.registry.stats();
  Json(StatsResponse {
    rooms: stats.rooms,
    players: stats.players,
  })
}

async fn ws_handler(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
  let gateway = state.gateway.clone();
  ws.on_upgrade(move |socket| handle_socket(socket, gateway))
}
