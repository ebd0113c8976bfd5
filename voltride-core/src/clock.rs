use std::ops::ControlFlow;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("no async runtime is available to drive the timer")]
    NoRuntime,
    #[error("tick period must be non-zero")]
    ZeroPeriod,
}

/// Single repeating timer behind an active trip.
///
/// Each firing reports how many whole seconds of monotonic time have passed
/// since the previous report. The period only sets how often time is sampled.
/// A host that was suspended gets one catch-up
/// report instead of a burst, and the receiver clamps it.
///
/// Dropping the clock disarms it.
#[derive(Debug, Default)]
pub struct SessionClock {
    task: Option<JoinHandle<()>>,
}

impl SessionClock {
    /// Arm the timer, disarming any previous one first. `on_tick` receives the
    /// number of elapsed seconds and returns `Break` to stop the timer.
    pub fn start<F>(&mut self, period: Duration, mut on_tick: F) -> Result<(), ClockError>
    where
        F: FnMut(u64) -> ControlFlow<()> + Send + 'static,
    {
        self.stop();

        if period.is_zero() {
            return Err(ClockError::ZeroPeriod);
        }
        let runtime = Handle::try_current().map_err(|_| ClockError::NoRuntime)?;

        // Taken here, not inside the task, so time that passes before the
        // task is first polled still counts.
        let origin = Instant::now();

        let task = runtime.spawn(async move {
            let mut ticker = time::interval_at(origin + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut reported: u64 = 0;

            loop {
                ticker.tick().await;
                let due = Instant::now().saturating_duration_since(origin).as_secs();
                let elapsed = due.saturating_sub(reported);
                if elapsed == 0 {
                    continue;
                }
                reported = due;

                if on_tick(elapsed).is_break() {
                    break;
                }
            }
        });

        self.task = Some(task);
        tracing::debug!(?period, "Session clock armed");
        Ok(())
    }

    /// Disarm the timer. Safe to call when already stopped.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Session clock stopped");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        self.stop();
    }
}
