//! Moving-sum smoothing
//!
//! `b[i] = (a[i] + ... + a[i + window - 1]) / divisor` for `i in 0..n - window`.
//! The output is one element shorter than a full sliding window would give;
//! the last window is never emitted.

use crate::error::VitalsError;

/// Smooth an integer series with a fixed moving sum and divisor
pub fn smooth(series: &[i64], window: usize, divisor: i64) -> Result<Vec<i64>, VitalsError> {
    let required = window.saturating_add(1);
    if window == 0 || divisor == 0 || series.len() < required {
        return Err(VitalsError::InsufficientSamples {
            stage: "smoother",
            required,
            actual: series.len(),
        });
    }

    let smoothed = (0..series.len() - window)
        .map(|i| series[i..i + window].iter().sum::<i64>() / divisor)
        .collect();

    Ok(smoothed)
}
