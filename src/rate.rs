//! Rate conversion
//!
//! Maps a crossing count to a per-minute rate using calibration constants.
//! Neither conversion looks at how many samples were actually analysed: the
//! counts are assumed to span the reference capture the constants were tuned
//! on, so clips or traces that deviate from it lose accuracy.

use crate::config::{HeartRateConfig, RespiratoryRateConfig};

/// Beats per minute from the number of rising crossings in the smoothed series
pub fn heart_rate_from_crossings(crossings: usize, config: &HeartRateConfig) -> u32 {
    let per_minute =
        ((crossings as f64 / config.reference_samples) * config.seconds_per_minute).floor();
    (per_minute / config.rate_divisor).floor().max(0.0) as u32
}

/// Breaths per minute from the number of magnitude changes in the analysed window
pub fn respiratory_rate_from_crossings(crossings: usize, config: &RespiratoryRateConfig) -> u32 {
    ((crossings as f32 / config.reference_samples) * config.rate_scale).max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heart_rate_conversion() {
        let config = HeartRateConfig::default();
        assert_eq!(heart_rate_from_crossings(0, &config), 0);
        // floor(floor(60 / 45) / 2) = floor(1 / 2)
        assert_eq!(heart_rate_from_crossings(1, &config), 0);
        // floor(floor(2 * 60 / 45) / 2) = floor(2 / 2)
        assert_eq!(heart_rate_from_crossings(2, &config), 1);
        // 45 crossings => 60 per minute => 30
        assert_eq!(heart_rate_from_crossings(45, &config), 30);
        // floor(floor(100 * 60 / 45) / 2) = floor(133 / 2)
        assert_eq!(heart_rate_from_crossings(100, &config), 66);
    }

    #[test]
    fn test_respiratory_rate_conversion() {
        let config = RespiratoryRateConfig::default();
        assert_eq!(respiratory_rate_from_crossings(0, &config), 0);
        assert_eq!(respiratory_rate_from_crossings(1, &config), 0);
        // 30 / 45 * 30 = 20
        assert_eq!(respiratory_rate_from_crossings(30, &config), 20);
        // 440 / 45 * 30 = 293.33
        assert_eq!(respiratory_rate_from_crossings(440, &config), 293);
    }
}
