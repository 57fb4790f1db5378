//! Frame sampling
//!
//! Draws the sampled frame sequence from a video source: frame indices
//! `offset, offset + stride, ...` below `floor(duration) * frame_rate`, each
//! decoded at `index / frame_rate` seconds.

use crate::config::HeartRateConfig;
use crate::error::VitalsError;
use crate::source::VideoSource;
use crate::types::SampledFrameSequence;
use std::iter::StepBy;
use std::ops::Range;

/// Frame indices that will be requested from a clip.
///
/// The indices are produced lazily. Fails when the duration is not finite or
/// the frame count does not fit in a `u64`.
pub fn sample_indices(
    frame_rate: u32,
    duration_seconds: f64,
    config: &HeartRateConfig,
) -> Result<StepBy<Range<u64>>, VitalsError> {
    if !duration_seconds.is_finite() {
        return Err(VitalsError::MalformedInput(format!(
            "clip duration {duration_seconds} is not finite"
        )));
    }
    let whole_seconds = duration_seconds.trunc().max(0.0);
    if whole_seconds >= u64::MAX as f64 {
        return Err(frame_count_overflow(duration_seconds, frame_rate));
    }
    let total_frames = (whole_seconds as u64)
        .checked_mul(u64::from(frame_rate))
        .ok_or_else(|| frame_count_overflow(duration_seconds, frame_rate))?;

    let stride = config.frame_stride.max(1) as usize;
    Ok((u64::from(config.frame_offset)..total_frames).step_by(stride))
}

fn frame_count_overflow(duration_seconds: f64, frame_rate: u32) -> VitalsError {
    VitalsError::MalformedInput(format!(
        "clip of {duration_seconds}s at {frame_rate} fps has too many frames"
    ))
}

/// Extract the sampled frame sequence from a clip.
///
/// Frames that fail to decode are skipped. Fails when the clip has no video
/// track or when no sampled frame decodes.
pub fn extract_sampled_frames<S: VideoSource + ?Sized>(
    source: &S,
    config: &HeartRateConfig,
) -> Result<SampledFrameSequence, VitalsError> {
    let frame_rate = match source.nominal_frame_rate() {
        Some(rate) if rate > 0 => rate,
        _ => return Err(VitalsError::NoVideoTrack),
    };

    let indices = sample_indices(frame_rate, source.duration_seconds(), config)?;
    let mut frames = Vec::new();
    let mut requested = 0usize;
    let mut skipped = 0usize;

    for index in indices {
        requested += 1;
        let seconds = index as f64 / f64::from(frame_rate);
        match source.frame_at(seconds) {
            Ok(frame) => frames.push(frame),
            Err(e) => {
                skipped += 1;
                log::warn!("skipping frame {index} at {seconds:.3}s: {e}");
            }
        }
    }

    log::debug!(
        "sampled {} of {} requested frames ({} skipped)",
        frames.len(),
        requested,
        skipped
    );

    if frames.is_empty() {
        return Err(VitalsError::EmptyFrameSequence);
    }

    Ok(SampledFrameSequence::new(frames))
}
