//! Region aggregation
//!
//! Reduces each sampled frame to a single brightness value: the sum of the red,
//! green and blue channels over the bottom-right square block of the frame.
//! The block is located from the last frame's dimensions, so every frame must
//! share those dimensions; this is checked up front. A frame smaller than the
//! block is reported as `FrameTooSmall` ahead of any size mismatch.

use crate::error::VitalsError;
use crate::types::{Frame, SampledFrameSequence};

/// Sum R+G+B over the bottom-right `block_size` square of every frame
pub fn aggregate_regions(
    sequence: &SampledFrameSequence,
    block_size: u32,
) -> Result<Vec<i64>, VitalsError> {
    let last = sequence.last().ok_or(VitalsError::EmptyFrameSequence)?;
    let (width, height) = (last.width(), last.height());

    if let Some(small) = sequence
        .frames()
        .iter()
        .rev()
        .find(|frame| frame.width() < block_size || frame.height() < block_size)
    {
        return Err(VitalsError::FrameTooSmall {
            width: small.width(),
            height: small.height(),
            required: block_size,
        });
    }

    for (index, frame) in sequence.frames().iter().enumerate() {
        if frame.width() != width || frame.height() != height {
            return Err(VitalsError::FrameSizeMismatch {
                index,
                width: frame.width(),
                height: frame.height(),
                expected_width: width,
                expected_height: height,
            });
        }
    }

    let x_range = (width - block_size)..width;
    let y_range = (height - block_size)..height;

    let series: Vec<i64> = sequence
        .frames()
        .iter()
        .map(|frame| block_sum(frame, x_range.clone(), y_range.clone()))
        .collect();

    log::debug!(
        "aggregated {}x{} block over {} frames of {}x{}",
        block_size,
        block_size,
        series.len(),
        width,
        height
    );

    Ok(series)
}

fn block_sum(frame: &Frame, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> i64 {
    let mut total = 0i64;
    for y in ys {
        for x in xs.clone() {
            if let Some([r, g, b]) = frame.pixel(x, y) {
                total += i64::from(r) + i64::from(g) + i64::from(b);
            }
        }
    }
    total
}
