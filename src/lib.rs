//! Synheart Vitals - On-device vital-sign estimation
//!
//! Vitals turns raw captures into integer physiological rates through two
//! deterministic pipelines:
//!
//! - **Heart rate**: fingertip video clip → frame sampling → region aggregation
//!   → smoothing → rising-crossing count → beats per minute
//! - **Respiratory rate**: flat accelerometer trace → axis parsing → magnitude
//!   → change-crossing count → breaths per minute
//!
//! Both pipelines are pure and synchronous; failures are returned as
//! [`VitalsError`] values, never as a zero rate.

pub mod accel;
pub mod config;
pub mod crossing;
pub mod error;
pub mod pipeline;
pub mod rate;
pub mod record;
pub mod region;
pub mod sampling;
pub mod smoothing;
pub mod source;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{HeartRateConfig, RespiratoryRateConfig, VitalsConfig};
pub use error::VitalsError;
pub use pipeline::{
    heart_rate_from_clip, respiratory_rate_from_csv, VitalsMeasurement, VitalsProcessor,
};
pub use record::{Symptom, VitalsRecord};
pub use source::{ImageSequenceClip, InMemoryClip, VideoSource};
pub use types::{Frame, SampledFrameSequence, TriaxialSamples};

/// Vitals version embedded in every record
pub const VITALS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for records
pub const PRODUCER_NAME: &str = "synheart-vitals";
