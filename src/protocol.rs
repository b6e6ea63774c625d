use crate::game::grid::{Cell, Dir};
use crate::game::types::GameSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
  #[serde(rename = "join")]
  Join { name: String },
  #[serde(rename = "directionChange")]
  DirectionChange { dir: Dir },
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreEntry {
  pub name: String,
  pub score: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
  #[serde(rename = "joined")]
  Joined {
    #[serde(rename = "playerId")]
    player_id: String,
    #[serde(rename = "roomId")]
    room_id: String,
    #[serde(rename = "playerCount")]
    player_count: usize,
  },
  #[serde(rename = "state")]
  State(GameSnapshot),
  #[serde(rename = "playerJoined")]
  PlayerJoined {
    #[serde(rename = "playerName")]
    player_name: String,
    #[serde(rename = "playerCount")]
    player_count: usize,
  },
  #[serde(rename = "playerLeft")]
  PlayerLeft {
    #[serde(rename = "playerName")]
    player_name: String,
    #[serde(rename = "playerCount")]
    player_count: usize,
  },
  #[serde(rename = "playerDied")]
  PlayerDied {
    #[serde(rename = "playerId")]
    player_id: String,
    #[serde(rename = "playerName")]
    player_name: String,
  },
  #[serde(rename = "foodEaten")]
  FoodEaten {
    #[serde(rename = "playerId")]
    player_id: String,
    #[serde(rename = "newFood")]
    new_food: Cell,
  },
  #[serde(rename = "gameEnded")]
  GameEnded {
    winner: Option<ScoreEntry>,
    scores: Vec<ScoreEntry>,
  },
  #[serde(rename = "error")]
  Error { message: String },
}
