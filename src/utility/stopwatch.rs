/// Countdown timer driven by the simulation clock.
///
/// The world never reads wall-clock time. `SimClock` is advanced by the
/// tick loop and every stopwatch compares against it, which keeps AI
/// cadence deterministic under test.

/// Monotonic simulation time in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimClock {
    now_ms: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Advance by `dt_ms`, saturating at u64::MAX
    pub fn advance(&mut self, dt_ms: u64) -> u64 {
        self.now_ms = self.now_ms.saturating_add(dt_ms);
        self.now_ms
    }
}

/// Countdown gating movement and attack cadence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stopwatch {
    start_ms: u64,
    /// `None` while stopped
    end_ms: Option<u64>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now_ms: u64, duration_ms: u64) {
        self.start_ms = now_ms;
        self.end_ms = Some(now_ms.saturating_add(duration_ms));
    }

    pub fn stop(&mut self) {
        self.end_ms = None;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.end_ms.is_some()
    }

    /// Started and past its end time. A stopped watch is never elapsed.
    #[inline]
    pub fn is_elapsed(&self, now_ms: u64) -> bool {
        matches!(self.end_ms, Some(end) if now_ms >= end)
    }

    /// Ready for the next action: stopped or elapsed
    #[inline]
    pub fn is_zero(&self, now_ms: u64) -> bool {
        !self.is_running() || self.is_elapsed(now_ms)
    }

    pub fn elapsed(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.start_ms)
    }

    pub fn remaining(&self, now_ms: u64) -> u64 {
        self.end_ms.map_or(0, |end| end.saturating_sub(now_ms))
    }

    /// Fraction of the countdown still to run, in [0, 1]
    pub fn percent_remaining(&self, now_ms: u64) -> f32 {
        match self.end_ms {
            Some(end) if end > self.start_ms => {
                let total = (end - self.start_ms) as f32;
                (self.remaining(now_ms) as f32 / total).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_watch_is_zero() {
        let watch = Stopwatch::new();
        assert!(!watch.is_running());
        assert!(!watch.is_elapsed(0));
        assert!(watch.is_zero(0));
        assert_eq!(watch.percent_remaining(10), 0.0);
    }

    #[test]
    fn test_countdown() {
        let mut watch = Stopwatch::new();
        watch.start(100, 200);
        assert!(!watch.is_zero(100));
        assert!(!watch.is_zero(299));
        assert_eq!(watch.remaining(250), 50);
        assert_eq!(watch.elapsed(250), 150);
        assert!((watch.percent_remaining(200) - 0.5).abs() < f32::EPSILON);
        assert!(watch.is_elapsed(300));
        assert!(watch.is_zero(300));

        watch.stop();
        assert!(watch.is_zero(150));
    }

    #[test]
    fn test_clock_advances() {
        let mut clock = SimClock::new();
        clock.advance(16);
        clock.advance(16);
        assert_eq!(clock.now_ms(), 32);
    }
}
