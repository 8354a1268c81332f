//! Frame clock and interval timer, both in milliseconds

use std::time::Instant;

/// Longest frame delta accepted from the wall clock
const MAX_FRAME_MS: f64 = 250.0;

/// Tracks stage time.
///
/// Live hosts call [`FrameClock::tick`] once per frame; headless hosts and
/// tests call [`FrameClock::advance`] with an explicit delta.
pub struct FrameClock {
    /// Total elapsed stage time in milliseconds
    pub total_ms: f64,
    /// Time since last frame in milliseconds
    pub delta_ms: f64,
    /// Frames advanced so far
    pub frame: u64,
    last_instant: Instant,
    first_tick: bool,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            total_ms: 0.0,
            delta_ms: 0.0,
            frame: 0,
            last_instant: Instant::now(),
            first_tick: true,
        }
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by wall-clock time. Call once per frame.
    pub fn tick(&mut self) {
        let now = Instant::now();

        if self.first_tick {
            self.first_tick = false;
            self.last_instant = now;
            self.delta_ms = 0.0;
            self.frame += 1;
            return;
        }

        let elapsed = now.duration_since(self.last_instant).as_secs_f64() * 1000.0;
        self.last_instant = now;

        // A stalled host must not fast-forward every animation at once
        self.advance(elapsed.min(MAX_FRAME_MS));
    }

    /// Advance by an explicit delta; negative deltas are treated as zero
    pub fn advance(&mut self, delta_ms: f64) {
        self.delta_ms = delta_ms.max(0.0);
        self.total_ms += self.delta_ms;
        self.frame += 1;
    }

    pub fn now(&self) -> f64 {
        self.total_ms
    }
}

/// Fires once on the first poll, then every `period_ms`.
///
/// Missed periods do not queue up: after a long gap the timer fires once
/// and re-arms relative to that poll.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    period_ms: f64,
    next_fire: Option<f64>,
    fired: u64,
}

impl IntervalTimer {
    pub fn new(period_ms: f64) -> Self {
        Self {
            period_ms: period_ms.max(0.0),
            next_fire: None,
            fired: 0,
        }
    }

    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }

    pub fn poll(&mut self, now: f64) -> bool {
        let due = match self.next_fire {
            None => true,
            Some(next) => now >= next,
        };
        if !due {
            return false;
        }
        let scheduled = self.next_fire.unwrap_or(now) + self.period_ms;
        self.next_fire = Some(if scheduled <= now {
            now + self.period_ms
        } else {
            scheduled
        });
        self.fired += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_defaults() {
        let clock = FrameClock::new();
        assert_eq!(clock.total_ms, 0.0);
        assert_eq!(clock.delta_ms, 0.0);
        assert_eq!(clock.frame, 0);
    }

    #[test]
    fn test_first_tick_zero_delta() {
        let mut clock = FrameClock::new();
        clock.tick();
        assert_eq!(clock.delta_ms, 0.0);
        assert_eq!(clock.frame, 1);
    }

    #[test]
    fn test_advance_accumulates() {
        let mut clock = FrameClock::new();
        clock.advance(16.0);
        clock.advance(17.0);
        clock.advance(-5.0);
        assert_eq!(clock.now(), 33.0);
        assert_eq!(clock.delta_ms, 0.0);
        assert_eq!(clock.frame, 3);
    }

    #[test]
    fn test_interval_fires_immediately_then_periodically() {
        let mut timer = IntervalTimer::new(4000.0);
        assert!(timer.poll(0.0));
        assert!(!timer.poll(100.0));
        assert!(!timer.poll(3999.0));
        assert!(timer.poll(4000.0));
        assert!(!timer.poll(4001.0));
        assert!(timer.poll(8016.0));
        assert_eq!(timer.fired(), 3);
    }

    #[test]
    fn test_interval_does_not_burst_after_gap() {
        let mut timer = IntervalTimer::new(1000.0);
        assert!(timer.poll(0.0));
        assert!(timer.poll(10_500.0));
        assert!(!timer.poll(10_600.0));
        assert!(timer.poll(11_500.0));
    }
}
