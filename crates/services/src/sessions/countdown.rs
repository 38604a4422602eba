use std::time::Duration;

use quiz_core::model::ModuleId;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Cadence of the exam countdown.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// One beat of a running countdown.
///
/// `generation` identifies the countdown that sent it, so ticks still in the
/// channel after a countdown was replaced can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    pub module: ModuleId,
    pub generation: u64,
}

/// A repeating timer task that sends `TimerTick`s until it is dropped.
#[derive(Debug)]
pub struct Countdown {
    module: ModuleId,
    generation: u64,
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Spawn the countdown on the current tokio runtime.
    ///
    /// The first tick is sent one `period` after spawning. The task ends on its
    /// own once the receiving side of `ticks` is gone.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(
        module: ModuleId,
        generation: u64,
        period: Duration,
        ticks: UnboundedSender<TimerTick>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if ticks.send(TimerTick { module, generation }).is_err() {
                    break;
                }
            }
        });

        Self {
            module,
            generation,
            handle,
        }
    }

    #[must_use]
    pub fn module(&self) -> ModuleId {
        self.module
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn sends_one_tick_per_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let countdown = Countdown::spawn(ModuleId::ordinary(1), 3, DEFAULT_TICK_PERIOD, tx);

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let mut received = Vec::new();
        while let Ok(tick) = rx.try_recv() {
            received.push(tick);
        }
        assert_eq!(received.len(), 3);
        assert!(received.iter().all(|t| t.generation == 3));
        drop(countdown);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_stops_the_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let countdown = Countdown::spawn(ModuleId::RandomMix, 1, DEFAULT_TICK_PERIOD, tx);
        drop(countdown);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.recv().await.is_none());
    }
}
