//! Engine configuration
//!
//! Every calibration constant used by the two pipelines lives here with its
//! default set to the value the estimators were calibrated with. The constants
//! encode assumptions about capture duration and sampling rate, so recalibrating
//! for a different capture protocol is a config change rather than a code edit.

use crate::error::VitalsError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Calibration for the video (fingertip) heart-rate pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartRateConfig {
    /// First frame index sampled from the clip
    pub frame_offset: u32,
    /// Distance between sampled frame indices
    pub frame_stride: u32,
    /// Edge length of the bottom-right pixel block that is aggregated
    pub block_size: u32,
    /// Number of consecutive samples summed by the smoother
    pub smoothing_window: usize,
    /// Divisor applied to each smoothed sum.
    ///
    /// Deliberately differs from `smoothing_window`; the threshold below was
    /// tuned against this scaling.
    pub smoothing_divisor: i64,
    /// Minimum rise between consecutive smoothed samples counted as a beat
    pub rising_threshold: i64,
    /// Sample count the crossing count is assumed to span
    pub reference_samples: f64,
    /// Seconds per minute used to scale the count into a rate
    pub seconds_per_minute: f64,
    /// Final divisor applied to the per-minute crossing rate
    pub rate_divisor: f64,
}

impl Default for HeartRateConfig {
    fn default() -> Self {
        Self {
            frame_offset: 10,
            frame_stride: 5,
            block_size: 100,
            smoothing_window: 5,
            smoothing_divisor: 4,
            rising_threshold: 500,
            reference_samples: 45.0,
            seconds_per_minute: 60.0,
            rate_divisor: 2.0,
        }
    }
}

/// Calibration for the accelerometer respiratory-rate pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespiratoryRateConfig {
    /// First sample index analysed (inclusive)
    pub window_start: usize,
    /// Last sample index analysed (inclusive)
    pub window_end: usize,
    /// Minimum absolute magnitude change counted as a breath event
    pub change_threshold: f32,
    /// Reference magnitude the first sample in the window is compared against
    pub initial_reference: f32,
    /// Calibration count the number of events is divided by
    pub reference_samples: f32,
    /// Scale applied after division to obtain breaths per minute
    pub rate_scale: f32,
}

impl Default for RespiratoryRateConfig {
    fn default() -> Self {
        Self {
            window_start: 11,
            window_end: 450,
            change_threshold: 0.0589,
            initial_reference: 10.0,
            reference_samples: 45.0,
            rate_scale: 30.0,
        }
    }
}

impl RespiratoryRateConfig {
    /// Minimum number of samples each axis must hold
    pub fn required_samples(&self) -> usize {
        self.window_end.saturating_add(1)
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsConfig {
    pub heart: HeartRateConfig,
    pub respiratory: RespiratoryRateConfig,
}

impl VitalsConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, VitalsError> {
        let config: VitalsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_path(path: &Path) -> Result<Self, VitalsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize the configuration to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, VitalsError> {
        serde_json::to_string_pretty(self).map_err(VitalsError::JsonError)
    }

    /// Reject values that would make a pipeline undefined
    pub fn validate(&self) -> Result<(), VitalsError> {
        let heart = &self.heart;
        if heart.frame_stride == 0 {
            return Err(invalid("heart.frame_stride must be positive"));
        }
        if heart.block_size == 0 {
            return Err(invalid("heart.block_size must be positive"));
        }
        if heart.smoothing_window == 0 || heart.smoothing_window == usize::MAX {
            return Err(invalid(
                "heart.smoothing_window must be positive and leave room for one more sample",
            ));
        }
        if heart.smoothing_divisor == 0 {
            return Err(invalid("heart.smoothing_divisor must be non-zero"));
        }
        positive("heart.reference_samples", heart.reference_samples)?;
        positive("heart.seconds_per_minute", heart.seconds_per_minute)?;
        positive("heart.rate_divisor", heart.rate_divisor)?;

        let resp = &self.respiratory;
        if resp.window_start > resp.window_end {
            return Err(invalid(
                "respiratory.window_start must not exceed respiratory.window_end",
            ));
        }
        if resp.window_end == usize::MAX {
            return Err(invalid("respiratory.window_end is out of range"));
        }
        if !resp.change_threshold.is_finite() {
            return Err(invalid("respiratory.change_threshold must be finite"));
        }
        if !resp.initial_reference.is_finite() {
            return Err(invalid("respiratory.initial_reference must be finite"));
        }
        positive("respiratory.reference_samples", f64::from(resp.reference_samples))?;
        positive("respiratory.rate_scale", f64::from(resp.rate_scale))?;

        Ok(())
    }
}

fn positive(field: &str, value: f64) -> Result<(), VitalsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(&format!("{field} must be a positive finite number, got {value}")))
    }
}

fn invalid(msg: &str) -> VitalsError {
    VitalsError::InvalidConfig(msg.to_string())
}
