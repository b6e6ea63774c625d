use super::grid::{Cell, Dir};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct Player {
  pub id: String,
  pub name: String,
  pub color: String,
  pub seat: usize,
  pub direction: Dir,
  pub pending_direction: Dir,
  pub snake: Vec<Cell>,
  pub score: i64,
  pub alive: bool,
}

impl Player {
  pub fn head(&self) -> Option<Cell> {
    self.snake.first().copied()
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
  pub id: String,
  pub name: String,
  pub color: String,
  pub snake: Vec<Cell>,
  pub score: i64,
  pub alive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
  pub players: Vec<PlayerSnapshot>,
  pub food: Cell,
  pub running: bool,
}
