pub const CELL_SIZE: i32 = 20;
pub const CANVAS_WIDTH: i32 = 400;
pub const CANVAS_HEIGHT: i32 = 400;
pub const GRID_WIDTH: i32 = CANVAS_WIDTH / CELL_SIZE;
pub const GRID_HEIGHT: i32 = CANVAS_HEIGHT / CELL_SIZE;
pub const MAX_PLAYERS_PER_ROOM: usize = 5;
pub const TICK_MS: u64 = 150;
pub const FOOD_SCORE: i64 = 10;
pub const MAX_FOOD_ATTEMPTS: usize = 100;

pub const START_POSITIONS: [(i32, i32); MAX_PLAYERS_PER_ROOM] = [
  (5, 5),
  (15, 5),
  (5, 15),
  (15, 15),
  (10, 10),
];

pub const COLOR_POOL: [&str; MAX_PLAYERS_PER_ROOM] = [
  "#27ae60",
  "#3498db",
  "#e74c3c",
  "#f39c12",
  "#9b59b6",
];
