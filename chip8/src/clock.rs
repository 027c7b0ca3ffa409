//! Timer clock.
//!
//! The delay and sound timers run off wall-clock time, not the number of
//! instructions executed. The driver measures the time since startup, and
//! the clock works out how many 60Hz ticks are owed since the last check.
use std::{
    thread,
    time::{Duration, Instant},
};

use crate::constants::*;

/// Accounting of the 60Hz ticks that have been applied so far.
#[derive(Debug, Default, Clone)]
pub struct TickClock {
    ticks_applied: u64,
}

impl TickClock {
    pub fn new() -> Self {
        Default::default()
    }

    /// Total ticks that should have elapsed after the given time.
    #[inline]
    pub fn ticks_at(elapsed: Duration) -> u64 {
        (elapsed.as_nanos() * TIMER_FREQUENCY as u128 / NANOS_IN_SECOND as u128) as u64
    }

    /// Number of ticks owed since the last call, which are then considered applied.
    ///
    /// Time going backwards yields zero ticks.
    pub fn pending(&mut self, elapsed: Duration) -> u32 {
        let total = Self::ticks_at(elapsed);
        let pending = total.saturating_sub(self.ticks_applied);
        self.ticks_applied = self.ticks_applied.max(total);
        pending.min(u32::MAX as u64) as u32
    }

    pub fn ticks_applied(&self) -> u64 {
        self.ticks_applied
    }

    /// Set the clock state back to zero.
    pub fn reset(&mut self) {
        self.ticks_applied = 0;
    }
}

/// Wall clock for drivers, pacing the main loop at 60 frames per second.
pub struct FrameClock {
    start: Instant,
    frames: u64,
}

impl FrameClock {
    /// Creates a new clock with the current time as origin.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frames: 0,
        }
    }

    /// Time since the clock started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Advance to the next frame, returning the instant it starts.
    pub fn next_frame(&mut self) -> Instant {
        self.frames += 1;
        self.start + Duration::from_nanos(self.frames * TICK_TIME)
    }

    /// Block the current thread until the next frame boundary.
    ///
    /// When the loop has fallen behind, it returns immediately
    /// and catches up on the next frames.
    pub fn wait(&mut self) {
        let deadline = self.next_frame();
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_half_second() {
        let mut clock = TickClock::new();
        assert_eq!(clock.pending(Duration::from_millis(500)), 30);
        assert_eq!(clock.pending(Duration::from_millis(500)), 0);
    }

    #[test]
    fn test_ticks_floor() {
        let mut clock = TickClock::new();
        assert_eq!(clock.pending(Duration::from_millis(16)), 0);
        assert_eq!(clock.pending(Duration::from_millis(17)), 1);
        assert_eq!(clock.pending(Duration::from_millis(33)), 0);
        assert_eq!(clock.pending(Duration::from_millis(34)), 1);
        assert_eq!(clock.ticks_applied(), 2);
    }

    #[test]
    fn test_accumulated_ticks() {
        let mut clock = TickClock::new();
        let total: u32 = (1..=100)
            .map(|ms| clock.pending(Duration::from_millis(ms * 10)))
            .sum();
        assert_eq!(total, 60);
    }

    #[test]
    fn test_frame_deadlines() {
        let mut clock = FrameClock::new();
        let first = clock.next_frame();
        let second = clock.next_frame();
        assert_eq!(second - first, Duration::from_nanos(TICK_TIME));
    }

    #[test]
    fn test_time_backwards() {
        let mut clock = TickClock::new();
        clock.pending(Duration::from_secs(1));
        assert_eq!(clock.pending(Duration::from_millis(100)), 0);
        assert_eq!(clock.ticks_applied(), 60);
    }
}
