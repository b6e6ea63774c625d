use super::broadcast::{Broadcaster, ConnectionHandle};
use super::constants::{
  COLOR_POOL, FOOD_SCORE, GRID_HEIGHT, GRID_WIDTH, MAX_FOOD_ATTEMPTS, MAX_PLAYERS_PER_ROOM,
  START_POSITIONS, TICK_MS,
};
use super::grid::{self, Cell, Dir};
use super::scheduler::TickScheduler;
use super::types::{GameSnapshot, Player, PlayerSnapshot};
use crate::protocol::{ScoreEntry, ServerMessage};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Handle to a running room. All mutation goes through the inbox; a single
/// worker task owns the state and applies commands serially, so no lock
/// guards the simulation itself.
#[derive(Debug)]
pub struct Room {
  id: String,
  inbox: mpsc::UnboundedSender<RoomCommand>,
  seats: AtomicUsize,
  closed: AtomicBool,
}

#[derive(Debug)]
pub enum RoomCommand {
  Join {
    conn_id: String,
    name: String,
    handle: ConnectionHandle,
    reply: oneshot::Sender<Result<JoinedReply, JoinError>>,
  },
  SetDirection {
    conn_id: String,
    dir: Dir,
  },
  Leave {
    conn_id: String,
    reply: oneshot::Sender<LeaveOutcome>,
  },
  Tick,
}

#[derive(Debug, Clone)]
pub struct JoinedReply {
  pub player_id: String,
  pub room_id: String,
  pub player_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
  RoomFull,
  RoomClosed,
}

#[derive(Debug, Clone, Copy)]
pub struct LeaveOutcome {
  pub now_empty: bool,
}

impl Room {
  pub fn spawn() -> Arc<Self> {
    let id = Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::unbounded_channel();
    let scheduler = TickScheduler::new(Duration::from_millis(TICK_MS), tx.clone());
    let state = RoomState::new(id.clone(), scheduler, &mut rand::thread_rng());
    let room = Arc::new(Self {
      id,
      inbox: tx,
      seats: AtomicUsize::new(0),
      closed: AtomicBool::new(false),
    });
    tokio::spawn(run_room(Arc::clone(&room), state, rx));
    tracing::info!(room_id = %room.id, "room created");
    room
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn player_count(&self) -> usize {
    self.seats.load(Ordering::SeqCst)
  }

  pub fn is_closed(&self) -> bool {
    self.closed.load(Ordering::SeqCst)
  }

  pub fn has_capacity(&self) -> bool {
    !self.is_closed() && self.player_count() < MAX_PLAYERS_PER_ROOM
  }

  pub async fn join(
    &self,
    conn_id: String,
    name: String,
    handle: ConnectionHandle,
  ) -> Result<JoinedReply, JoinError> {
    let (reply, rx) = oneshot::channel();
    let command = RoomCommand::Join {
      conn_id,
      name,
      handle,
      reply,
    };
    if self.inbox.send(command).is_err() {
      return Err(JoinError::RoomClosed);
    }
    rx.await.map_err(|_| JoinError::RoomClosed)?
  }

  pub fn set_direction(&self, conn_id: &str, dir: Dir) {
    let _ = self.inbox.send(RoomCommand::SetDirection {
      conn_id: conn_id.to_string(),
      dir,
    });
  }

  /// Removes the player behind `conn_id`. A dead inbox means the room has
  /// already torn itself down, which the caller treats the same as emptying
  /// it.
  pub async fn leave(&self, conn_id: &str) -> LeaveOutcome {
    let (reply, rx) = oneshot::channel();
    let command = RoomCommand::Leave {
      conn_id: conn_id.to_string(),
      reply,
    };
    if self.inbox.send(command).is_err() {
      return LeaveOutcome { now_empty: true };
    }
    rx.await.unwrap_or(LeaveOutcome { now_empty: true })
  }
}

async fn run_room(
  room: Arc<Room>,
  mut state: RoomState,
  mut inbox: mpsc::UnboundedReceiver<RoomCommand>,
) {
  while let Some(command) = inbox.recv().await {
    match command {
      RoomCommand::Join {
        conn_id,
        name,
        handle,
        reply,
      } => {
        let result = state.add_player(conn_id, name, handle);
        room.seats.store(state.players.len(), Ordering::SeqCst);
        let _ = reply.send(result);
      }
      RoomCommand::SetDirection { conn_id, dir } => {
        state.change_direction(&conn_id, dir);
      }
      RoomCommand::Tick => {
        state.tick(&mut rand::thread_rng());
      }
      RoomCommand::Leave { conn_id, reply } => {
        let outcome = state.remove_player(&conn_id);
        room.seats.store(state.players.len(), Ordering::SeqCst);
        if state.finished {
          room.closed.store(true, Ordering::SeqCst);
        }
        let _ = reply.send(outcome);
      }
    }
    if state.finished {
      break;
    }
  }
  room.closed.store(true, Ordering::SeqCst);
  room.seats.store(0, Ordering::SeqCst);
  state.scheduler.stop();
  tracing::debug!(room_id = %room.id, "room worker stopped");
}

#[derive(Debug)]
struct RoomState {
  room_id: String,
  players: HashMap<String, Player>,
  food: Cell,
  scheduler: TickScheduler,
  broadcaster: Broadcaster,
  finished: bool,
}

impl RoomState {
  fn new(room_id: String, scheduler: TickScheduler, rng: &mut impl Rng) -> Self {
    let mut state = Self {
      room_id,
      players: HashMap::new(),
      food: Cell { x: 0, y: 0 },
      scheduler,
      broadcaster: Broadcaster::new(),
      finished: false,
    };
    state.place_food(rng);
    state
  }

  fn add_player(
    &mut self,
    conn_id: String,
    name: String,
    handle: ConnectionHandle,
  ) -> Result<JoinedReply, JoinError> {
    if self.players.len() >= MAX_PLAYERS_PER_ROOM {
      return Err(JoinError::RoomFull);
    }

    let seat = self.next_free_seat();
    let (x, y) = START_POSITIONS[seat];
    let player = Player {
      id: conn_id.clone(),
      name: name.clone(),
      color: COLOR_POOL[seat].to_string(),
      seat,
      direction: grid::RIGHT,
      pending_direction: grid::RIGHT,
      snake: vec![Cell { x, y }],
      score: 0,
      alive: true,
    };
    self.players.insert(conn_id.clone(), player);
    self.broadcaster.register(conn_id.clone(), handle);

    let player_count = self.players.len();
    tracing::debug!(room_id = %self.room_id, player_id = %conn_id, seat, "player joined");

    self.broadcaster.send_to(
      &conn_id,
      &ServerMessage::Joined {
        player_id: conn_id.clone(),
        room_id: self.room_id.clone(),
        player_count,
      },
    );
    self.broadcaster.broadcast(&ServerMessage::PlayerJoined {
      player_name: name,
      player_count,
    });
    self.broadcast_state();

    if player_count == 1 {
      self.scheduler.start();
    }

    Ok(JoinedReply {
      player_id: conn_id,
      room_id: self.room_id.clone(),
      player_count,
    })
  }

  fn next_free_seat(&self) -> usize {
    let taken: HashSet<usize> = self.players.values().map(|player| player.seat).collect();
    (0..MAX_PLAYERS_PER_ROOM)
      .find(|seat| !taken.contains(seat))
      .unwrap_or(0)
  }

  fn change_direction(&mut self, conn_id: &str, dir: Dir) {
    let Some(player) = self.players.get_mut(conn_id) else { return };
    if !player.alive {
      return;
    }
    // A snake longer than one cell may not reverse into itself; a length-1
    // snake turns freely. The guard checks the direction in effect, not a
    // pending intent.
    if player.snake.len() > 1 && player.direction.is_opposite(dir) {
      return;
    }
    player.pending_direction = dir;
  }

  fn remove_player(&mut self, conn_id: &str) -> LeaveOutcome {
    let removed = self.players.remove(conn_id);
    self.broadcaster.unregister(conn_id);

    if self.players.is_empty() {
      self.scheduler.stop();
      self.finished = true;
      if removed.is_some() {
        tracing::info!(room_id = %self.room_id, "last player left, room emptied");
      }
      return LeaveOutcome { now_empty: true };
    }

    if let Some(player) = removed {
      tracing::debug!(room_id = %self.room_id, player_id = %conn_id, "player left");
      self.broadcaster.broadcast(&ServerMessage::PlayerLeft {
        player_name: player.name,
        player_count: self.players.len(),
      });
    }
    LeaveOutcome { now_empty: false }
  }

  fn tick(&mut self, rng: &mut impl Rng) {
    if self.finished {
      return;
    }

    // Every cell of every snake before anyone moves, dead players included.
    // A candidate head hitting this set dies, even against the mover's own
    // tail cell that this tick would otherwise vacate.
    let occupied: HashSet<Cell> = self
      .players
      .values()
      .flat_map(|player| player.snake.iter().copied())
      .collect();

    let order = self.seat_order();
    let mut candidates: Vec<(String, Cell)> = Vec::with_capacity(order.len());
    for id in &order {
      let Some(player) = self.players.get_mut(id) else { continue };
      if !player.alive {
        continue;
      }
      player.direction = player.pending_direction;
      let Some(head) = player.head() else { continue };
      candidates.push((id.clone(), head.step(player.direction)));
    }

    let mut entering: HashMap<Cell, usize> = HashMap::new();
    for (_, cell) in &candidates {
      *entering.entry(*cell).or_insert(0) += 1;
    }

    let mut events: Vec<ServerMessage> = Vec::new();
    for (id, candidate) in &candidates {
      let crowded = entering.get(candidate).copied().unwrap_or(0) > 1;
      let dies = !candidate.in_bounds() || occupied.contains(candidate) || crowded;

      let Some(player) = self.players.get_mut(id) else { continue };
      if dies {
        player.alive = false;
        events.push(ServerMessage::PlayerDied {
          player_id: player.id.clone(),
          player_name: player.name.clone(),
        });
        tracing::debug!(room_id = %self.room_id, player_id = %id, "player died");
        continue;
      }

      player.snake.insert(0, *candidate);
      if *candidate == self.food {
        player.score += FOOD_SCORE;
        self.place_food(rng);
        events.push(ServerMessage::FoodEaten {
          player_id: id.clone(),
          new_food: self.food,
        });
      } else {
        player.snake.pop();
      }
    }

    self.broadcast_state();
    for event in &events {
      self.broadcaster.broadcast(event);
    }

    let alive = self.players.values().filter(|player| player.alive).count();
    if alive == 0 && !self.players.is_empty() {
      self.end_game();
    }
  }

  fn end_game(&mut self) {
    self.scheduler.stop();

    let mut winner: Option<(&String, i64)> = None;
    let mut best: i64 = 0;
    for id in self.seat_order() {
      let Some(player) = self.players.get(&id) else { continue };
      if player.score > best {
        best = player.score;
        winner = Some((&player.name, player.score));
      }
    }
    let winner = winner.map(|(name, score)| ScoreEntry {
      name: name.clone(),
      score,
    });

    let mut scores: Vec<ScoreEntry> = self
      .seat_order()
      .iter()
      .filter_map(|id| self.players.get(id))
      .map(|player| ScoreEntry {
        name: player.name.clone(),
        score: player.score,
      })
      .collect();
    scores.sort_by(|a, b| b.score.cmp(&a.score));

    self
      .broadcaster
      .broadcast(&ServerMessage::GameEnded { winner, scores });
    tracing::info!(room_id = %self.room_id, "game ended");

    self.players.clear();
    self.finished = true;
  }

  fn seat_order(&self) -> Vec<String> {
    let mut ids: Vec<(usize, String)> = self
      .players
      .values()
      .map(|player| (player.seat, player.id.clone()))
      .collect();
    ids.sort_by_key(|(seat, _)| *seat);
    ids.into_iter().map(|(_, id)| id).collect()
  }

  fn cell_on_living_snake(&self, cell: Cell) -> bool {
    self
      .players
      .values()
      .filter(|player| player.alive)
      .any(|player| player.snake.contains(&cell))
  }

  fn place_food(&mut self, rng: &mut impl Rng) {
    let mut candidate = Self::random_cell(rng);
    let mut attempts = 1;
    while self.cell_on_living_snake(candidate) && attempts < MAX_FOOD_ATTEMPTS {
      candidate = Self::random_cell(rng);
      attempts += 1;
    }
    if self.cell_on_living_snake(candidate) {
      tracing::warn!(room_id = %self.room_id, "food placement attempts exhausted, accepting overlap");
    }
    self.food = candidate;
  }

  fn random_cell(rng: &mut impl Rng) -> Cell {
    Cell {
      x: rng.gen_range(0..GRID_WIDTH),
      y: rng.gen_range(0..GRID_HEIGHT),
    }
  }

  fn snapshot(&self) -> GameSnapshot {
    let players = self
      .seat_order()
      .iter()
      .filter_map(|id| self.players.get(id))
      .map(|player| PlayerSnapshot {
        id: player.id.clone(),
        name: player.name.clone(),
        color: player.color.clone(),
        snake: player.snake.clone(),
        score: player.score,
        alive: player.alive,
      })
      .collect();
    GameSnapshot {
      players,
      food: self.food,
      running: self.scheduler.is_running(),
    }
  }

  fn broadcast_state(&mut self) {
    let snapshot = self.snapshot();
    self.broadcaster.broadcast(&ServerMessage::State(snapshot));
  }
}
