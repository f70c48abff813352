use crate::application::commands::{tick_timer_impl, AppState};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Handle to the one-second tick driver. Stopping (or dropping) the
/// handle aborts the task, so no further ticks can reach the clock after
/// pause or reset has released it.
#[derive(Debug)]
pub struct TickerHandle {
    task: JoinHandle<()>,
}

impl TickerHandle {
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns the external scheduler that delivers `tick` once per elapsed
/// second. Missed ticks are skipped rather than replayed; a catch-up
/// burst after a stalled executor must not decrement the countdown more
/// than once per observed second.
pub fn spawn_ticker(state: Arc<AppState>) -> TickerHandle {
    let task = tokio::spawn(async move {
        let mut clock = interval(Duration::from_secs(1));
        clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first interval tick resolves immediately; consume it so the
        // countdown only moves on elapsed seconds.
        clock.tick().await;
        loop {
            clock.tick().await;
            if let Err(error) = tick_timer_impl(&state) {
                state.log_error("tick_timer", &error.to_string());
            }
        }
    });
    TickerHandle { task }
}
