//! Video sources
//!
//! A video source is the decoder collaborator of the heart-rate pipeline. It
//! reports the clip's nominal frame rate and duration and decodes a frame at a
//! requested timestamp. Streaming, caching and cancellation are the source's
//! concern; the engine only asks for individual frames.

mod image_sequence;
mod memory;

pub use image_sequence::ImageSequenceClip;
pub use memory::InMemoryClip;

use crate::error::VitalsError;
use crate::types::Frame;

/// Trait for clip decoders feeding the heart-rate pipeline
pub trait VideoSource {
    /// Nominal frames per second of the video track, `None` when the clip has no video track
    fn nominal_frame_rate(&self) -> Option<u32>;

    /// Total clip duration in seconds
    fn duration_seconds(&self) -> f64;

    /// Decode the frame displayed at `seconds` from the start of the clip
    fn frame_at(&self, seconds: f64) -> Result<Frame, VitalsError>;
}

/// Index of the frame shown at `seconds` for a clip running at `frame_rate`
pub(crate) fn frame_index(seconds: f64, frame_rate: u32) -> usize {
    (seconds * f64::from(frame_rate)).round().max(0.0) as usize
}
