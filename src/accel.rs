//! Accelerometer trace parsing and magnitude extraction
//!
//! Traces arrive as a single flat column of numbers. Axes are not separated by
//! structure but by value: every reading equal to exactly `0.0` starts the next
//! axis, and the delimiting `0.0` is kept as that axis's first sample. Readings
//! before the first `0.0` and after the third axis are discarded.
//!
//! A genuine `0.0` reading is indistinguishable from a delimiter under this
//! convention; traces are expected to be produced by the matching recorder.

use crate::error::VitalsError;
use crate::types::TriaxialSamples;
use std::ops::RangeInclusive;

/// Split a flat numeric trace into x, y and z series.
///
/// Lines that do not parse as a number are skipped. Fails only when no line
/// parses at all.
pub fn parse_axes(text: &str) -> Result<TriaxialSamples, VitalsError> {
    let mut samples = TriaxialSamples::default();
    let mut axis: i32 = -1;
    let mut parsed = 0usize;
    let mut skipped = 0usize;

    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        let value: f32 = match line.parse() {
            Ok(v) => v,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        parsed += 1;

        if value == 0.0 {
            axis += 1;
        }

        match axis {
            0 => samples.x.push(value),
            1 => samples.y.push(value),
            2 => samples.z.push(value),
            _ => {}
        }
    }

    if skipped > 0 {
        log::warn!("skipped {skipped} unparseable lines in accelerometer trace");
    }

    if parsed == 0 {
        return Err(VitalsError::MalformedInput(
            "accelerometer trace contains no numeric lines".to_string(),
        ));
    }

    log::debug!(
        "parsed accelerometer trace: x={} y={} z={} samples",
        samples.x.len(),
        samples.y.len(),
        samples.z.len()
    );

    Ok(samples)
}

/// Euclidean magnitude `sqrt(x² + y² + z²)` for every index in `window`.
///
/// Fails if any axis is too short to cover the window.
pub fn magnitudes(
    samples: &TriaxialSamples,
    window: RangeInclusive<usize>,
) -> Result<Vec<f32>, VitalsError> {
    samples.require(window.end().saturating_add(1))?;
    Ok(window
        .map(|i| {
            let (x, y, z) = (samples.x[i], samples.y[i], samples.z[i]);
            (z * z + x * x + y * y).sqrt()
        })
        .collect())
}
