use super::room::RoomCommand;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Drives a room's fixed-interval tick by enqueueing `Tick` commands into the
/// room inbox. The scheduler never touches room state; start and stop are
/// both idempotent. Tests bypass it entirely and call `tick()` directly.
#[derive(Debug)]
pub struct TickScheduler {
  period: Duration,
  inbox: UnboundedSender<RoomCommand>,
  running: Arc<AtomicBool>,
}

impl TickScheduler {
  pub fn new(period: Duration, inbox: UnboundedSender<RoomCommand>) -> Self {
    Self {
      period,
      inbox,
      running: Arc::new(AtomicBool::new(false)),
    }
  }

  pub fn start(&self) {
    if self
      .running
      .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
      .is_err()
    {
      return;
    }

    let running = Arc::clone(&self.running);
    let inbox = self.inbox.clone();
    let period = self.period;
    tokio::spawn(async move {
      let mut interval = tokio::time::interval(period);
      // The first interval tick completes immediately; the game starts one
      // full period after the first join.
      interval.tick().await;
      loop {
        interval.tick().await;
        if !running.load(Ordering::SeqCst) {
          break;
        }
        if inbox.send(RoomCommand::Tick).is_err() {
          running.store(false, Ordering::SeqCst);
          break;
        }
      }
    });
  }

  pub fn stop(&self) {
    self.running.store(false, Ordering::SeqCst);
  }

  pub fn is_running(&self) -> bool {
    self.running.load(Ordering::SeqCst)
  }
}
