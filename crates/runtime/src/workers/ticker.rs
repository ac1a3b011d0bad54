//! Wall-clock driver that ticks the simulation at a fixed interval.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};

use skirmish_core::Timestamp;

use super::Command;

/// Sends a tick command every `period`, timestamped with the elapsed time
/// since the ticker started.
pub struct TickerWorker {
    command_tx: mpsc::Sender<Command>,
    period: Duration,
}

impl TickerWorker {
    pub fn new(command_tx: mpsc::Sender<Command>, period: Duration) -> Self {
        Self { command_tx, period }
    }

    pub async fn run(self) {
        let origin = Instant::now();
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let fired = interval.tick().await;
            let elapsed = fired.duration_since(origin).as_millis();
            let timestamp = Timestamp(u64::try_from(elapsed).unwrap_or(u64::MAX));

            let (reply, reply_rx) = oneshot::channel();
            if self
                .command_tx
                .send(Command::Tick { timestamp, reply })
                .await
                .is_err()
            {
                break;
            }
            // At most one tick in flight.
            if reply_rx.await.is_err() {
                break;
            }
        }
        tracing::debug!("ticker stopped");
    }
}
