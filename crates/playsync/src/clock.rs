use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::time::FrameRate;

/// Cap for deadlines whose period overflows the monotonic clock.
pub const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Serially chained tick scheduler.
///
/// The next deadline is only computed after the previous tick's work has
/// finished. Deadlines are anchored on the previous deadline so the average
/// rate holds under jitter, but an overrun never produces a burst: at most
/// one tick is due at any time.
#[derive(Debug, Clone)]
pub struct FrameClock {
    rate: FrameRate,
    running: bool,
    last_deadline: Option<Instant>,
}

impl FrameClock {
    pub fn new(rate: FrameRate) -> Self {
        Self {
            rate,
            running: false,
            last_deadline: None,
        }
    }

    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    /// Changes the rate for ticks scheduled from now on.
    pub fn set_rate(&mut self, rate: FrameRate) {
        debug!(from = self.rate.fps(), to = rate.fps(), "frame clock rate changed");
        self.rate = rate;
    }

    pub fn period(&self) -> Duration {
        self.rate.frame_period()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        if !self.running {
            debug!(fps = self.rate.fps(), "frame clock started");
        }
        self.running = true;
        self.last_deadline = None;
    }

    pub fn stop(&mut self) {
        if self.running {
            debug!("frame clock stopped");
        }
        self.running = false;
    }

    /// Deadline of the next tick given the current time.
    ///
    /// The first tick after `start` fires one period from `now`. Periods too
    /// long for the monotonic clock are capped at [`FAR_FUTURE`] from `now`.
    pub fn next_deadline(&self, now: Instant) -> Instant {
        let base = self.last_deadline.unwrap_or(now);
        base.checked_add(self.period())
            .unwrap_or_else(|| now.checked_add(FAR_FUTURE).unwrap_or(now))
            .max(now)
    }

    /// Records that the tick scheduled for `deadline` has fired.
    pub fn mark_tick(&mut self, deadline: Instant) {
        self.last_deadline = Some(deadline);
    }
}
