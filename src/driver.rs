use crate::consts;
use crate::game::{GameSession, SessionError, TickOutcome};
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::trace;

/// Decides, once per frame, whether the simulation should advance
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct FrameDriver {
    interval: Duration,
    last_tick: Option<Instant>,
    scheduled: bool,
}

impl FrameDriver {
    pub(crate) fn new(interval: Duration) -> FrameDriver {
        FrameDriver {
            interval,
            last_tick: None,
            scheduled: false,
        }
    }

    /// Begin ticking.  The first tick happens one interval after `now`.
    pub(crate) fn start(&mut self, now: Instant) {
        if !self.scheduled {
            trace!("Frame driver started");
            self.last_tick = Some(now);
            self.scheduled = true;
        }
    }

    pub(crate) fn stop(&mut self) {
        if self.scheduled {
            trace!("Frame driver stopped");
        }
        self.scheduled = false;
    }

    pub(crate) fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub(crate) fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Advance `session` by one tick if the tick interval has elapsed since
    /// the previous tick.  Returns `None` if no tick was due.
    pub(crate) fn frame<R: Rng>(
        &mut self,
        session: &mut GameSession<R>,
        now: Instant,
    ) -> Option<Result<TickOutcome, SessionError>> {
        if !self.scheduled {
            return None;
        }
        let last = *self.last_tick.get_or_insert(now);
        if now.saturating_duration_since(last) < self.interval {
            return None;
        }
        self.last_tick = Some(now);
        let r = session.tick();
        if !session.is_running() {
            self.stop();
        }
        Some(r)
    }

    /// How long the event loop may wait for input before the next frame
    /// must be drawn, or `None` if it may wait indefinitely
    pub(crate) fn poll_timeout(&self) -> Option<Duration> {
        self.scheduled.then_some(consts::FRAME_PERIOD)
    }
}
