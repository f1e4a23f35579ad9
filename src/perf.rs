use crate::consts;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::info;

/// How much visual detail the renderer should draw
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) enum Fidelity {
    #[default]
    Full,

    /// Plain board background and a two-level snake gradient
    Reduced,
}

/// Rolling frame-rate estimate with one-way degradation
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct PerfMonitor {
    samples: VecDeque<Instant>,
    low_since: Option<Instant>,
    fidelity: Fidelity,
}

impl PerfMonitor {
    pub(crate) fn new() -> PerfMonitor {
        PerfMonitor::default()
    }

    /// Record that a frame was drawn at `now`.  Returns `true` if this frame
    /// caused fidelity to be reduced.
    pub(crate) fn record(&mut self, now: Instant) -> bool {
        if self.samples.len() >= consts::FPS_SAMPLE_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(now);
        if self.fidelity == Fidelity::Reduced || self.samples.len() < consts::MIN_FPS_SAMPLES {
            return false;
        }
        match self.fps() {
            Some(fps) if fps < consts::LOW_FPS_THRESHOLD => {
                let since = *self.low_since.get_or_insert(now);
                if now.saturating_duration_since(since) >= consts::LOW_FPS_GRACE {
                    info!(fps, "Frame rate too low; reducing fidelity");
                    self.fidelity = Fidelity::Reduced;
                    return true;
                }
            }
            _ => self.low_since = None,
        }
        false
    }

    /// Frames per second over the sample window, or `None` if there are too
    /// few samples or they span no time
    pub(crate) fn fps(&self) -> Option<f64> {
        let (first, last) = (self.samples.front()?, self.samples.back()?);
        let span = last.saturating_duration_since(*first).as_secs_f64();
        let frames = u32::try_from(self.samples.len().checked_sub(1)?).ok()?;
        (frames > 0 && span > 0.0).then_some(f64::from(frames) / span)
    }

    pub(crate) fn fidelity(&self) -> Fidelity {
        self.fidelity
    }

    /// Forget the frame history, e.g. after the frame loop has been idle
    pub(crate) fn clear(&mut self) {
        self.samples.clear();
        self.low_since = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn feed(monitor: &mut PerfMonitor, start: Instant, period: Duration, frames: u32) -> Instant {
        let mut now = start;
        for _ in 0..frames {
            monitor.record(now);
            now += period;
        }
        now
    }

    #[test]
    fn fps_estimate() {
        let mut monitor = PerfMonitor::new();
        assert_eq!(monitor.fps(), None);
        let start = Instant::now();
        monitor.record(start);
        assert_eq!(monitor.fps(), None);
        feed(&mut monitor, start + Duration::from_millis(20), Duration::from_millis(20), 10);
        let fps = monitor.fps().unwrap();
        assert!((fps - 50.0).abs() < 0.01, "fps = {fps}");
    }

    #[test]
    fn window_is_bounded() {
        let mut monitor = PerfMonitor::new();
        feed(&mut monitor, Instant::now(), Duration::from_millis(10), 100);
        assert_eq!(monitor.samples.len(), consts::FPS_SAMPLE_WINDOW);
    }

    #[test]
    fn fast_frames_keep_full_fidelity() {
        let mut monitor = PerfMonitor::new();
        feed(&mut monitor, Instant::now(), Duration::from_millis(16), 600);
        assert_eq!(monitor.fidelity(), Fidelity::Full);
    }

    #[test]
    fn brief_slowdown_is_tolerated() {
        let mut monitor = PerfMonitor::new();
        let start = Instant::now();
        let now = feed(&mut monitor, start, Duration::from_millis(50), 30);
        let now = feed(&mut monitor, now, Duration::from_millis(5), 200);
        feed(&mut monitor, now, Duration::from_millis(50), 10);
        assert_eq!(monitor.fidelity(), Fidelity::Full);
    }

    #[test]
    fn sustained_slowdown_degrades_once() {
        let mut monitor = PerfMonitor::new();
        let start = Instant::now();
        let mut now = start;
        let mut degraded = 0;
        for _ in 0..100 {
            if monitor.record(now) {
                degraded += 1;
            }
            now += Duration::from_millis(50);
        }
        assert_eq!(degraded, 1);
        assert_eq!(monitor.fidelity(), Fidelity::Reduced);
        feed(&mut monitor, now, Duration::from_millis(5), 200);
        assert_eq!(monitor.fidelity(), Fidelity::Reduced);
    }
}
