//! Core types for the Synheart Vitals pipelines
//!
//! This module defines the data that flows through the two estimators:
//! decoded frames, the sampled frame sequence, and triaxial accelerometer samples.

use crate::error::VitalsError;
use serde::{Deserialize, Serialize};

/// Bytes per pixel in a frame's buffer
const RGB_CHANNELS: usize = 3;

/// A decoded video frame with an owned, immutable RGB8 pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Build a frame from tightly packed RGB bytes
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, VitalsError> {
        let expected = (width as usize) * (height as usize) * RGB_CHANNELS;
        if pixels.len() != expected {
            return Err(VitalsError::FrameDecode(format!(
                "RGB buffer holds {} bytes, expected {expected} for {width}x{height}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a frame from tightly packed RGBA bytes; alpha is dropped
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self, VitalsError> {
        let expected = (width as usize) * (height as usize) * 4;
        if rgba.len() != expected {
            return Err(VitalsError::FrameDecode(format!(
                "RGBA buffer holds {} bytes, expected {expected} for {width}x{height}",
                rgba.len()
            )));
        }
        let pixels = rgba
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A frame where every pixel has the same colour
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let count = (width as usize) * (height as usize);
        let pixels = std::iter::repeat(rgb).take(count).flatten().collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGB triple at (x, y), or `None` outside the frame
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y as usize) * (self.width as usize) + (x as usize)) * RGB_CHANNELS;
        self.pixels
            .get(offset..offset + RGB_CHANNELS)
            .map(|px| [px[0], px[1], px[2]])
    }
}

impl From<image::RgbImage> for Frame {
    fn from(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }
}

/// Frames drawn from a clip at a fixed stride, in capture order
#[derive(Debug, Clone, Default)]
pub struct SampledFrameSequence {
    frames: Vec<Frame>,
}

impl SampledFrameSequence {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The frame whose dimensions define the aggregation region
    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

impl From<Vec<Frame>> for SampledFrameSequence {
    fn from(frames: Vec<Frame>) -> Self {
        Self::new(frames)
    }
}

/// Accelerometer readings split into x, y and z series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriaxialSamples {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
}

impl TriaxialSamples {
    /// Length of the shortest axis
    pub fn min_len(&self) -> usize {
        self.x.len().min(self.y.len()).min(self.z.len())
    }

    /// Ensure every axis holds at least `required` samples
    pub fn require(&self, required: usize) -> Result<(), VitalsError> {
        let actual = self.min_len();
        if actual < required {
            return Err(VitalsError::InsufficientSamples {
                stage: "triaxial samples",
                required,
                actual,
            });
        }
        Ok(())
    }
}
