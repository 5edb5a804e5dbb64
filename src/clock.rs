//! Monotonic time source for Chassis cycle timing.
//!
//! Mirrors the teacher's ESP32/host split time adapter, minus the
//! ESP-IDF-specific branch: concrete hardware timers are out of scope for
//! this crate, so only the host-side `Instant`-based implementation
//! survives, generalised behind a trait so tests can supply a manually
//! advanced clock instead of wall time.

use std::time::{Duration, Instant};

/// A monotonic microsecond clock.
pub trait Clock: Send + Sync {
    /// Microseconds since this clock's epoch (process start, typically).
    /// Wraps at `u64::MAX`, matching the original `esp_timer_get_time`
    /// contract of "monotonic, wrapping eventually, never going backwards".
    fn now_us(&self) -> u64;

    /// Block the calling thread until at least `duration` has elapsed.
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Wall-clock implementation backed by `std::time::Instant`.
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

/// A clock a test can advance deterministically. `sleep` is a no-op;
/// callers advance time explicitly with [`ManualClock::advance`].
pub struct ManualClock {
    now_us: std::sync::atomic::AtomicU64,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now_us: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.now_us
            .fetch_add(duration.as_micros() as u64, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_us(&self) -> u64 {
        self.now_us.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn sleep(&self, _duration: Duration) {}
}

/// Ties a Chassis's declared `scanRateMsec` / `scanRateMultiplier` pair to
/// an actual cycle period against a [`Clock`]. Several Chassis sharing a
/// base tick can run at different multiples of it by varying
/// `scan_rate_multiplier` while sharing `scan_rate_msec`.
pub struct TimingSource {
    period: Duration,
}

impl TimingSource {
    pub fn new(scan_rate_msec: u32, scan_rate_multiplier: u16) -> Self {
        let millis = u64::from(scan_rate_msec) * u64::from(scan_rate_multiplier.max(1));
        Self {
            period: Duration::from_millis(millis),
        }
    }

    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Sleep out the remainder of the cycle period given how long the
    /// cycle body (scan/execute/flush) actually took.
    pub fn sleep_remainder(&self, clock: &dyn Clock, cycle_elapsed: Duration) {
        if let Some(remainder) = self.period.checked_sub(cycle_elapsed) {
            if !remainder.is_zero() {
                clock.sleep(remainder);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_deterministically() {
        let clock = ManualClock::new();
        assert_eq!(clock.now_us(), 0);
        clock.advance(Duration::from_micros(1_500));
        assert_eq!(clock.now_us(), 1_500);
    }

    #[test]
    fn timing_source_combines_rate_and_multiplier() {
        let ts = TimingSource::new(10, 3);
        assert_eq!(ts.period(), Duration::from_millis(30));
    }
}
