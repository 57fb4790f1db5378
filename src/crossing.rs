//! Threshold crossing counter
//!
//! Counts sample-to-sample transitions whose change exceeds a threshold. This is
//! the event detector behind both estimators: rising transitions for pulse
//! peaks, absolute transitions for breathing motion.

use serde::{Deserialize, Serialize};
use std::ops::Sub;

/// How a transition is compared against the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingMode {
    /// `s[i] - s[i-1] > threshold`
    Rising,
    /// `|s[i] - s[i-1]| > threshold`
    Absolute,
}

/// Numeric sample types the counter operates on
pub trait Sample: Copy + PartialOrd + Sub<Output = Self> {
    fn magnitude(self) -> Self;
}

impl Sample for i64 {
    fn magnitude(self) -> Self {
        self.saturating_abs()
    }
}

impl Sample for f32 {
    fn magnitude(self) -> Self {
        self.abs()
    }
}

impl Sample for f64 {
    fn magnitude(self) -> Self {
        self.abs()
    }
}

/// Count transitions in `series` exceeding `threshold`.
///
/// Series shorter than two samples have no transitions and yield 0.
pub fn count_crossings<T: Sample>(series: &[T], threshold: T, mode: CrossingMode) -> usize {
    series
        .windows(2)
        .filter(|pair| {
            let delta = pair[1] - pair[0];
            match mode {
                CrossingMode::Rising => delta > threshold,
                CrossingMode::Absolute => delta.magnitude() > threshold,
            }
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rising_counts_only_increases() {
        let series = vec![0i64, 600, 0, 600, 601];
        assert_eq!(count_crossings(&series, 500, CrossingMode::Rising), 2);
        assert_eq!(count_crossings(&series, 500, CrossingMode::Absolute), 3);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let series = vec![0i64, 500, 1000];
        assert_eq!(count_crossings(&series, 500, CrossingMode::Rising), 0);
    }

    #[test]
    fn test_float_absolute_mode() {
        let series = vec![1.0f32, 1.1, 1.0, 1.01];
        assert_eq!(count_crossings(&series, 0.0589, CrossingMode::Absolute), 2);
    }

    #[test]
    fn test_short_series() {
        assert_eq!(count_crossings::<f64>(&[], 0.0, CrossingMode::Absolute), 0);
        assert_eq!(count_crossings(&[5i64], 0, CrossingMode::Rising), 0);
    }

    #[test]
    fn test_rising_never_exceeds_absolute() {
        // Deterministic pseudo-random walk
        let mut state = 0x2545_f491_u64;
        let mut series = Vec::with_capacity(500);
        let mut value = 0i64;
        for _ in 0..500 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            value += (state % 2001) as i64 - 1000;
            series.push(value);
        }
        for threshold in [0i64, 100, 500, 900] {
            let rising = count_crossings(&series, threshold, CrossingMode::Rising);
            let absolute = count_crossings(&series, threshold, CrossingMode::Absolute);
            assert!(rising <= absolute);
        }
    }
}
