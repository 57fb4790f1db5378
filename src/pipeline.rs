//! Pipeline orchestration
//!
//! This module provides the public API for Synheart Vitals.
//! It wires the stages of both estimators together:
//!
//! - Heart rate: frame sampling → region aggregation → smoothing → rising
//!   crossings → rate conversion
//! - Respiratory rate: axis parsing → magnitude extraction → absolute
//!   crossings → rate conversion
//!
//! Every call is stateless; nothing is retained between invocations.

use crate::accel::{magnitudes, parse_axes};
use crate::config::{HeartRateConfig, RespiratoryRateConfig, VitalsConfig};
use crate::crossing::{count_crossings, CrossingMode};
use crate::error::VitalsError;
use crate::rate::{heart_rate_from_crossings, respiratory_rate_from_crossings};
use crate::region::aggregate_regions;
use crate::sampling::extract_sampled_frames;
use crate::smoothing::smooth;
use crate::source::VideoSource;
use crate::types::{SampledFrameSequence, TriaxialSamples};

/// Estimate heart rate (beats per minute) from a fingertip video clip
/// using the default calibration.
///
/// # Example
/// ```ignore
/// let clip = ImageSequenceClip::open(Path::new("frames/"), 30)?;
/// let bpm = heart_rate_from_clip(&clip)?;
/// ```
pub fn heart_rate_from_clip<S: VideoSource + ?Sized>(source: &S) -> Result<u32, VitalsError> {
    estimate_heart_rate(source, &HeartRateConfig::default())
}

/// Estimate respiratory rate (breaths per minute) from a flat accelerometer
/// trace using the default calibration.
///
/// # Example
/// ```ignore
/// let text = std::fs::read_to_string("breathing.csv")?;
/// let breaths = respiratory_rate_from_csv(&text)?;
/// ```
pub fn respiratory_rate_from_csv(text: &str) -> Result<u32, VitalsError> {
    estimate_respiratory_rate(text, &RespiratoryRateConfig::default())
}

fn estimate_heart_rate<S: VideoSource + ?Sized>(
    source: &S,
    config: &HeartRateConfig,
) -> Result<u32, VitalsError> {
    // Stage 1: Sample frames from the clip
    let sequence = extract_sampled_frames(source, config)?;
    heart_rate_from_sequence(&sequence, config)
}

fn heart_rate_from_sequence(
    sequence: &SampledFrameSequence,
    config: &HeartRateConfig,
) -> Result<u32, VitalsError> {
    // Stage 2: Reduce each frame to a channel sum
    let brightness = aggregate_regions(sequence, config.block_size)?;

    // Stage 3: Smooth
    let smoothed = smooth(&brightness, config.smoothing_window, config.smoothing_divisor)?;

    // Stage 4: Count rising crossings
    let crossings = count_crossings(&smoothed, config.rising_threshold, CrossingMode::Rising);

    // Stage 5: Convert to beats per minute
    let rate = heart_rate_from_crossings(crossings, config);

    log::debug!(
        "heart rate: {} frames, {} smoothed samples, {} crossings, {} bpm",
        sequence.len(),
        smoothed.len(),
        crossings,
        rate
    );

    Ok(rate)
}

fn estimate_respiratory_rate(
    text: &str,
    config: &RespiratoryRateConfig,
) -> Result<u32, VitalsError> {
    // Stage 1: Split the trace into axes
    let samples = parse_axes(text)?;
    respiratory_rate_from_axes(&samples, config)
}

fn respiratory_rate_from_axes(
    samples: &TriaxialSamples,
    config: &RespiratoryRateConfig,
) -> Result<u32, VitalsError> {
    // Stage 2: Magnitude over the analysis window, seeded with the reference value
    let window = magnitudes(samples, config.window_start..=config.window_end)?;
    let mut series = Vec::with_capacity(window.len() + 1);
    series.push(config.initial_reference);
    series.extend(window);

    // Stage 3: Count absolute changes
    let crossings = count_crossings(&series, config.change_threshold, CrossingMode::Absolute);

    // Stage 4: Convert to breaths per minute
    let rate = respiratory_rate_from_crossings(crossings, config);

    log::debug!(
        "respiratory rate: {} transitions, {} crossings, {} breaths/min",
        series.len() - 1,
        crossings,
        rate
    );

    Ok(rate)
}

/// Outcome of measuring both vital signs; each pipeline succeeds or fails on its own
#[derive(Debug)]
pub struct VitalsMeasurement {
    pub heart_rate: Result<u32, VitalsError>,
    pub respiratory_rate: Result<u32, VitalsError>,
}

/// Vital-sign estimator with a fixed calibration.
///
/// Use this when the default calibration does not fit the capture protocol.
#[derive(Debug, Clone, Default)]
pub struct VitalsProcessor {
    config: VitalsConfig,
}

impl VitalsProcessor {
    /// Create a processor with the default calibration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a processor with a validated calibration
    pub fn with_config(config: VitalsConfig) -> Result<Self, VitalsError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Load calibration from JSON
    pub fn from_config_json(json: &str) -> Result<Self, VitalsError> {
        Ok(Self {
            config: VitalsConfig::from_json(json)?,
        })
    }

    pub fn config(&self) -> &VitalsConfig {
        &self.config
    }

    /// Heart rate from a clip
    pub fn heart_rate<S: VideoSource + ?Sized>(&self, source: &S) -> Result<u32, VitalsError> {
        estimate_heart_rate(source, &self.config.heart)
    }

    /// Heart rate from frames that were already sampled by the caller
    pub fn heart_rate_from_frames(
        &self,
        sequence: &SampledFrameSequence,
    ) -> Result<u32, VitalsError> {
        heart_rate_from_sequence(sequence, &self.config.heart)
    }

    /// Respiratory rate from a flat accelerometer trace
    pub fn respiratory_rate(&self, text: &str) -> Result<u32, VitalsError> {
        estimate_respiratory_rate(text, &self.config.respiratory)
    }

    /// Respiratory rate from axes that were already parsed
    pub fn respiratory_rate_from_samples(
        &self,
        samples: &TriaxialSamples,
    ) -> Result<u32, VitalsError> {
        respiratory_rate_from_axes(samples, &self.config.respiratory)
    }

    /// Run both pipelines in parallel on their own threads
    pub fn measure<S: VideoSource + Sync + ?Sized>(
        &self,
        source: &S,
        accelerometer_csv: &str,
    ) -> VitalsMeasurement {
        std::thread::scope(|scope| {
            let heart = scope.spawn(|| self.heart_rate(source));
            let respiratory_rate = self.respiratory_rate(accelerometer_csv);
            let heart_rate = heart
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
            VitalsMeasurement {
                heart_rate,
                respiratory_rate,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryClip;
    use crate::types::Frame;

    /// 100x100 frames; `bright` frames sum to 30000, the rest to 0
    fn spike_sequence(len: usize, bright: &[usize]) -> SampledFrameSequence {
        let frames = (0..len)
            .map(|i| {
                let level = if bright.contains(&i) { 1 } else { 0 };
                Frame::filled(100, 100, [level, level, level])
            })
            .collect::<Vec<_>>();
        SampledFrameSequence::new(frames)
    }

    fn breathing_csv(x_len: usize) -> String {
        let mut lines = vec!["0.0".to_string()];
        for i in 1..x_len {
            lines.push(if i % 2 == 0 { "1.0" } else { "1.1" }.to_string());
        }
        for _axis in 0..2 {
            lines.push("0.0".to_string());
            lines.extend(std::iter::repeat("0.5".to_string()).take(x_len - 1));
        }
        lines.join("\n")
    }

    #[test]
    fn test_black_frames_give_zero() {
        let processor = VitalsProcessor::new();
        let sequence = SampledFrameSequence::new(vec![Frame::filled(200, 200, [0, 0, 0]); 50]);
        assert_eq!(processor.heart_rate_from_frames(&sequence).unwrap(), 0);
    }

    #[test]
    fn test_single_rising_transition_gives_zero() {
        let processor = VitalsProcessor::new();
        let sequence = spike_sequence(50, &[20]);
        let brightness = aggregate_regions(&sequence, 100).unwrap();
        let smoothed = smooth(&brightness, 5, 4).unwrap();
        assert_eq!(count_crossings(&smoothed, 500, CrossingMode::Rising), 1);
        assert_eq!(processor.heart_rate_from_frames(&sequence).unwrap(), 0);
    }

    #[test]
    fn test_periodic_spikes() {
        let processor = VitalsProcessor::new();
        // Spikes at 10, 20, 30, 40 enter the smoothing window once each; the
        // spike at 0 is already inside the first window.
        let sequence = spike_sequence(50, &[0, 10, 20, 30, 40]);
        // floor(floor(4 / 45 * 60) / 2) = floor(5 / 2)
        assert_eq!(processor.heart_rate_from_frames(&sequence).unwrap(), 2);
    }

    #[test]
    fn test_too_few_frames_for_smoother() {
        let processor = VitalsProcessor::new();
        let sequence = spike_sequence(5, &[]);
        assert!(matches!(
            processor.heart_rate_from_frames(&sequence),
            Err(VitalsError::InsufficientSamples {
                stage: "smoother",
                ..
            })
        ));
    }

    #[test]
    fn test_heart_rate_from_clip_is_deterministic() {
        let frames: Vec<Frame> = (0..300)
            .map(|i| {
                let level = ((i * 37) % 11) as u8;
                Frame::filled(120, 100, [level, level / 2, 0])
            })
            .collect();
        let clip = InMemoryClip::new(frames, 30);
        let first = heart_rate_from_clip(&clip).unwrap();
        let second = heart_rate_from_clip(&clip).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_clip_at_offset_boundary() {
        let clip = InMemoryClip::new(vec![Frame::filled(200, 200, [0, 0, 0]); 10], 10);
        assert!(matches!(
            heart_rate_from_clip(&clip),
            Err(VitalsError::EmptyFrameSequence)
        ));
    }

    #[test]
    fn test_small_frames_rejected() {
        let clip = InMemoryClip::new(vec![Frame::filled(80, 200, [0, 0, 0]); 90], 30);
        assert!(matches!(
            heart_rate_from_clip(&clip),
            Err(VitalsError::FrameTooSmall { .. })
        ));
    }

    #[test]
    fn test_infinite_clip_duration_is_an_error() {
        let clip = InMemoryClip::new(vec![Frame::filled(200, 200, [0, 0, 0]); 60], 30)
            .with_duration(f64::INFINITY);
        assert!(matches!(
            heart_rate_from_clip(&clip),
            Err(VitalsError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_constant_magnitude_gives_zero() {
        let processor = VitalsProcessor::new();
        let samples = TriaxialSamples {
            x: vec![1.0; 451],
            y: vec![0.0; 451],
            z: vec![0.0; 451],
        };
        // Only the first sample differs from the 10.0 reference
        assert_eq!(processor.respiratory_rate_from_samples(&samples).unwrap(), 0);
    }

    #[test]
    fn test_450_samples_insufficient() {
        let processor = VitalsProcessor::new();
        let samples = TriaxialSamples {
            x: vec![1.0; 450],
            y: vec![0.0; 450],
            z: vec![0.0; 450],
        };
        assert!(matches!(
            processor.respiratory_rate_from_samples(&samples),
            Err(VitalsError::InsufficientSamples {
                required: 451,
                actual: 450,
                ..
            })
        ));
    }

    #[test]
    fn test_respiratory_rate_from_csv() {
        // Every one of the 440 transitions exceeds the threshold
        let csv = breathing_csv(451);
        assert_eq!(respiratory_rate_from_csv(&csv).unwrap(), 293);
        assert_eq!(respiratory_rate_from_csv(&csv).unwrap(), 293);
    }

    #[test]
    fn test_respiratory_short_trace() {
        let csv = breathing_csv(300);
        assert!(matches!(
            respiratory_rate_from_csv(&csv),
            Err(VitalsError::InsufficientSamples { .. })
        ));
    }

    #[test]
    fn test_respiratory_garbage() {
        assert!(matches!(
            respiratory_rate_from_csv("no numbers here"),
            Err(VitalsError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_custom_calibration() {
        let processor =
            VitalsProcessor::from_config_json(r#"{"respiratory": {"window_start": 1, "window_end": 10}}"#)
                .unwrap();
        let csv = breathing_csv(11);
        // 10 transitions, all counted: 10 / 45 * 30 = 6.67
        assert_eq!(processor.respiratory_rate(&csv).unwrap(), 6);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = VitalsConfig::default();
        config.heart.smoothing_window = 0;
        assert!(matches!(
            VitalsProcessor::with_config(config),
            Err(VitalsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unbounded_window_config_rejected() {
        let result = VitalsProcessor::from_config_json(
            r#"{"respiratory": {"window_end": 18446744073709551615}}"#,
        );
        assert!(matches!(result, Err(VitalsError::InvalidConfig(_))));
    }

    #[test]
    fn test_measure_runs_both_pipelines() {
        let processor = VitalsProcessor::new();
        let clip = InMemoryClip::new(vec![Frame::filled(200, 200, [0, 0, 0]); 300], 30);
        let measurement = processor.measure(&clip, &breathing_csv(451));
        assert_eq!(measurement.heart_rate.unwrap(), 0);
        assert_eq!(measurement.respiratory_rate.unwrap(), 293);
    }

    #[test]
    fn test_measure_reports_failures_independently() {
        let processor = VitalsProcessor::new();
        let clip = InMemoryClip::without_video_track(10.0);
        let measurement = processor.measure(&clip, &breathing_csv(451));
        assert!(matches!(measurement.heart_rate, Err(VitalsError::NoVideoTrack)));
        assert_eq!(measurement.respiratory_rate.unwrap(), 293);
    }
}
