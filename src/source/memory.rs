//! In-memory clip of already decoded frames

use super::{frame_index, VideoSource};
use crate::error::VitalsError;
use crate::types::Frame;

/// A clip whose frames are already decoded, e.g. handed over by a host decoder
#[derive(Debug, Clone)]
pub struct InMemoryClip {
    frames: Vec<Frame>,
    frame_rate: Option<u32>,
    duration_seconds: f64,
}

impl InMemoryClip {
    /// Create a clip from every frame of a video track running at `frame_rate`
    pub fn new(frames: Vec<Frame>, frame_rate: u32) -> Self {
        let duration_seconds = if frame_rate == 0 {
            0.0
        } else {
            frames.len() as f64 / f64::from(frame_rate)
        };
        Self {
            frames,
            frame_rate: Some(frame_rate),
            duration_seconds,
        }
    }

    /// A clip that has no video track at all
    pub fn without_video_track(duration_seconds: f64) -> Self {
        Self {
            frames: Vec::new(),
            frame_rate: None,
            duration_seconds,
        }
    }

    /// Override the reported duration (containers may report more or less than the decoded frames cover)
    pub fn with_duration(mut self, duration_seconds: f64) -> Self {
        self.duration_seconds = duration_seconds;
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl VideoSource for InMemoryClip {
    fn nominal_frame_rate(&self) -> Option<u32> {
        self.frame_rate
    }

    fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    fn frame_at(&self, seconds: f64) -> Result<Frame, VitalsError> {
        let frame_rate = self.frame_rate.ok_or(VitalsError::NoVideoTrack)?;
        let index = frame_index(seconds, frame_rate);
        self.frames.get(index).cloned().ok_or_else(|| {
            VitalsError::FrameDecode(format!(
                "no frame at {seconds:.3}s (index {index}, clip has {})",
                self.frames.len()
            ))
        })
    }
}
