//! Error types for Synheart Vitals

use thiserror::Error;

/// Errors that can occur while estimating vital signs
#[derive(Debug, Error)]
pub enum VitalsError {
    #[error("Clip exposes no video track")]
    NoVideoTrack,

    #[error("No frames could be decoded from the clip")]
    EmptyFrameSequence,

    #[error("Frame is {width}x{height}, region requires at least {required}x{required}")]
    FrameTooSmall {
        width: u32,
        height: u32,
        required: u32,
    },

    #[error("Frame {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    FrameSizeMismatch {
        index: usize,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("Insufficient samples for {stage}: need {required}, got {actual}")]
    InsufficientSamples {
        stage: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Failed to decode frame: {0}")]
    FrameDecode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl VitalsError {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            VitalsError::NoVideoTrack => "NO_VIDEO_TRACK",
            VitalsError::EmptyFrameSequence => "EMPTY_FRAME_SEQUENCE",
            VitalsError::FrameTooSmall { .. } => "FRAME_TOO_SMALL",
            VitalsError::FrameSizeMismatch { .. } => "FRAME_SIZE_MISMATCH",
            VitalsError::InsufficientSamples { .. } => "INSUFFICIENT_SAMPLES",
            VitalsError::MalformedInput(_) => "MALFORMED_INPUT",
            VitalsError::FrameDecode(_) => "FRAME_DECODE",
            VitalsError::InvalidConfig(_) => "INVALID_CONFIG",
            VitalsError::InvalidRecord(_) => "INVALID_RECORD",
            VitalsError::Io(_) => "IO_ERROR",
            VitalsError::JsonError(_) => "JSON_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_samples_message() {
        let err = VitalsError::InsufficientSamples {
            stage: "smoother",
            required: 6,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient samples for smoother: need 6, got 3"
        );
        assert_eq!(err.code(), "INSUFFICIENT_SAMPLES");
    }
}
