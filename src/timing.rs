//! Rational media time and the capture timestamp clock
//!
//! Clip durations and timeline placement use rational arithmetic, never
//! floats, so accumulating many short clips cannot drift.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// Conventional movie timescale: 600 units per second divides evenly by
/// 24, 25, 30 and 60 fps.
pub const MOVIE_TIMESCALE: i32 = 600;

/// A duration or instant on a media timeline, expressed as
/// `value / timescale` seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MediaTime {
    value: i64,
    timescale: i32,
}

impl MediaTime {
    pub fn new(value: i64, timescale: i32) -> Self {
        Self {
            value,
            timescale: timescale.max(1),
        }
    }

    pub fn zero() -> Self {
        Self::new(0, MOVIE_TIMESCALE)
    }

    /// Nearest representable time at the movie timescale.
    pub fn from_seconds(seconds: f64) -> Self {
        Self::new(
            (seconds * MOVIE_TIMESCALE as f64).round() as i64,
            MOVIE_TIMESCALE,
        )
    }

    /// Nearest representable time at the movie timescale from a
    /// microsecond offset.
    pub fn from_micros(micros: u64) -> Self {
        let value = (micros as i128 * MOVIE_TIMESCALE as i128 + 500_000) / 1_000_000;
        Self::new(value as i64, MOVIE_TIMESCALE)
    }

    /// Duration of `frames` frames at `fps`, rounded once to the movie
    /// timescale. Integer frame rates that divide the timescale (24, 25,
    /// 30, 60) are exact.
    pub fn from_frames(frames: u64, fps: f64) -> Self {
        if fps <= 0.0 {
            return Self::zero();
        }
        let value = (frames as f64 * MOVIE_TIMESCALE as f64 / fps).round() as i64;
        Self::new(value, MOVIE_TIMESCALE)
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn timescale(&self) -> i32 {
        self.timescale
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    pub fn as_seconds(&self) -> f64 {
        self.value as f64 / self.timescale as f64
    }

    /// Exact sum. Equal timescales add directly; mixed timescales go
    /// through a common denominator reduced by gcd. Saturates at the i64
    /// range (half a billion years at timescale 600).
    pub fn add(self, other: MediaTime) -> MediaTime {
        if self.timescale == other.timescale {
            return MediaTime::new(self.value.saturating_add(other.value), self.timescale);
        }
        let ts = self.timescale as i128 * other.timescale as i128;
        let value =
            self.value as i128 * other.timescale as i128 + other.value as i128 * self.timescale as i128;
        let g = gcd(value.unsigned_abs().max(1), ts.unsigned_abs());
        let value = value / g as i128;
        let ts = ts / g as i128;
        if ts > i32::MAX as i128 || value > i64::MAX as i128 || value < i64::MIN as i128 {
            // Out of exact range; fall back to the movie timescale.
            return MediaTime::from_seconds(self.as_seconds() + other.as_seconds());
        }
        MediaTime::new(value as i64, ts as i32)
    }
}

impl PartialEq for MediaTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MediaTime {}

impl PartialOrd for MediaTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MediaTime {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.value as i128 * other.timescale as i128;
        let rhs = other.value as i128 * self.timescale as i128;
        lhs.cmp(&rhs)
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}

/// Monotonic clock stamping capture timestamps.
///
/// All frames in one session derive from the same clock, so per-clip
/// relative offsets are non-decreasing by construction.
#[derive(Debug, Clone)]
pub struct PtsClock {
    start: Arc<Instant>,
}

impl PtsClock {
    pub fn new() -> Self {
        Self {
            start: Arc::new(Instant::now()),
        }
    }

    /// Share an existing timebase between components.
    pub fn from_instant(start: Instant) -> Self {
        Self {
            start: Arc::new(start),
        }
    }

    /// Microseconds since the clock's time zero.
    #[inline]
    pub fn timestamp_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    pub fn start_instant(&self) -> Instant {
        *self.start
    }
}

impl Default for PtsClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_zero() {
        assert!(MediaTime::zero().is_zero());
        assert_eq!(MediaTime::zero().as_seconds(), 0.0);
    }

    #[test]
    fn equal_timescale_add_is_exact() {
        let a = MediaTime::new(1200, 600); // 2.0s
        let b = MediaTime::new(1800, 600); // 3.0s
        let sum = a.add(b);
        assert_eq!(sum.value(), 3000);
        assert_eq!(sum.as_seconds(), 5.0);
    }

    #[test]
    fn mixed_timescale_add_is_exact() {
        let a = MediaTime::new(1, 3); // 1/3 s
        let b = MediaTime::new(1, 6); // 1/6 s
        let sum = a.add(b);
        assert_eq!(sum, MediaTime::new(1, 2));
    }

    #[test]
    fn from_frames_exact_at_common_rates() {
        // 30 frames at 30fps is exactly one second.
        assert_eq!(MediaTime::from_frames(30, 30.0), MediaTime::new(600, 600));
        // 60 frames at 60fps likewise.
        assert_eq!(MediaTime::from_frames(60, 60.0), MediaTime::new(600, 600));
    }

    #[test]
    fn from_micros_rounds_to_timescale() {
        assert_eq!(MediaTime::from_micros(1_000_000), MediaTime::new(600, 600));
        assert_eq!(MediaTime::from_micros(500_000), MediaTime::new(300, 600));
    }

    #[test]
    fn ordering_crosses_timescales() {
        assert!(MediaTime::new(1, 2) > MediaTime::new(1, 3));
        assert_eq!(MediaTime::new(2, 4), MediaTime::new(1, 2));
    }

    #[test]
    fn accumulation_does_not_drift() {
        // 1000 clips of 1/30s each must sum to exactly 100/3 seconds.
        let frame = MediaTime::from_frames(1, 30.0);
        let mut total = MediaTime::zero();
        for _ in 0..1000 {
            total = total.add(frame);
        }
        assert_eq!(total, MediaTime::new(20_000, 600));
    }

    #[test]
    fn clock_is_monotonic() {
        let clock = PtsClock::new();
        let a = clock.timestamp_us();
        let b = clock.timestamp_us();
        assert!(b >= a);
    }

    #[test]
    fn clocks_can_share_a_timebase() {
        let clock = PtsClock::new();
        let other = PtsClock::from_instant(clock.start_instant());
        assert_eq!(clock.start_instant(), other.start_instant());
    }
}
