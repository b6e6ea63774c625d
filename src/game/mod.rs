pub mod broadcast;
pub mod constants;
pub mod grid;
pub mod input;
pub mod room;
pub mod scheduler;
pub mod types;
