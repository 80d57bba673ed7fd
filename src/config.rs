// src/config.rs

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{AnalysisError, AnalysisResult};

/// Taper applied to each frame before it is transformed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Hann,
    /// Uses `AnalysisConfig::tukey_alpha`.
    Tukey,
}

/// Tunable parameters of the step-response and noise pipelines.
///
/// Every field has a default, so a JSON file only needs to list overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Length of each deconvolution frame in seconds
    pub framelen_s: f64,
    /// Length of the step response kept from each frame in seconds
    pub resplen_s: f64,
    /// Frequencies above this are treated as untrusted input
    pub cutfreq_hz: f64,
    /// Number of overlapping frames per frame length
    pub superpos: usize,
    /// Peak |setpoint| separating low-rate from high-rate frames
    pub threshold: f64,
    pub window: WindowKind,
    pub tukey_alpha: f64,
    /// Frames whose peak |setpoint| does not exceed this are ignored
    pub trusted_min_rate: f64,
    /// Fewer high-rate frames than this are folded out of the high-rate class
    pub min_high_frames: usize,
    pub bin_count: usize,
    pub value_range: [f64; 2],
    /// Gaussian sigma (in value bins) for the response histogram
    pub value_smoothing_bins: f64,
    /// Histogram cells above this count towards the uncertainty width
    pub density_threshold: f64,
    pub min_sample_rate_hz: f64,
    pub fft_block: usize,

    pub noise_framelen_s: f64,
    pub noise_superpos: usize,
    /// Trailing seconds of noise windows discarded (landing)
    pub noise_tail_s: f64,
    pub noise_smoothing_bins: f64,
    pub throttle_bins: usize,
    pub throttle_range: [f64; 2],
    pub noise_freq_decimation: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            framelen_s: FRAME_LENGTH_S,
            resplen_s: RESPONSE_LENGTH_S,
            cutfreq_hz: CUTOFF_FREQUENCY_HZ,
            superpos: SUPERPOSITION_FACTOR,
            threshold: SETPOINT_THRESHOLD,
            window: WindowKind::Hann,
            tukey_alpha: TUKEY_ALPHA,
            trusted_min_rate: MOVEMENT_THRESHOLD_DEG_S,
            min_high_frames: MIN_HIGH_RATE_FRAMES,
            bin_count: RESPONSE_VALUE_BINS,
            value_range: [RESPONSE_VALUE_MIN, RESPONSE_VALUE_MAX],
            value_smoothing_bins: RESPONSE_SMOOTHING_BINS,
            density_threshold: RESPONSE_DENSITY_THRESHOLD,
            min_sample_rate_hz: MIN_SAMPLE_RATE_HZ,
            fft_block: FFT_BLOCK_SAMPLES,
            noise_framelen_s: NOISE_FRAME_LENGTH_S,
            noise_superpos: NOISE_SUPERPOSITION_FACTOR,
            noise_tail_s: NOISE_EXCLUDE_END_S,
            noise_smoothing_bins: NOISE_SMOOTHING_BINS,
            throttle_bins: THROTTLE_BINS,
            throttle_range: [THROTTLE_MIN, THROTTLE_MAX],
            noise_freq_decimation: NOISE_FREQUENCY_DECIMATION,
        }
    }
}

impl AnalysisConfig {
    /// Loads overrides from a JSON document; missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Rejects values that would make the pipeline meaningless.
    pub fn validate(&self) -> AnalysisResult<()> {
        let positive = [
            ("framelen_s", self.framelen_s),
            ("resplen_s", self.resplen_s),
            ("cutfreq_hz", self.cutfreq_hz),
            ("noise_framelen_s", self.noise_framelen_s),
            ("min_sample_rate_hz", self.min_sample_rate_hz),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.resplen_s > self.framelen_s {
            return Err(AnalysisError::InvalidConfig(format!(
                "resplen_s ({}) exceeds framelen_s ({})",
                self.resplen_s, self.framelen_s
            )));
        }
        let counts = [
            ("superpos", self.superpos),
            ("bin_count", self.bin_count),
            ("fft_block", self.fft_block),
            ("noise_superpos", self.noise_superpos),
            ("throttle_bins", self.throttle_bins),
            ("noise_freq_decimation", self.noise_freq_decimation),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(AnalysisError::InvalidConfig(format!("{} must be non-zero", name)));
            }
        }
        for (name, [lo, hi]) in [("value_range", self.value_range), ("throttle_range", self.throttle_range)] {
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{} must be an increasing finite pair, got [{}, {}]",
                    name, lo, hi
                )));
            }
        }
        if self.value_smoothing_bins < 0.0 || self.noise_smoothing_bins < 0.0 || self.noise_tail_s < 0.0 {
            return Err(AnalysisError::InvalidConfig(
                "smoothing widths and noise_tail_s must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_parameters() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.framelen_s, 1.0);
        assert_eq!(cfg.resplen_s, 0.5);
        assert_eq!(cfg.superpos, 16);
        assert_eq!(cfg.threshold, 500.0);
        assert_eq!(cfg.bin_count, 1000);
        assert_eq!(cfg.value_range, [-1.5, 3.5]);
        assert_eq!(cfg.window, WindowKind::Hann);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn json_overrides_keep_other_defaults() {
        let cfg = AnalysisConfig::from_json_str(r#"{"threshold": 300.0, "window": "tukey"}"#).unwrap();
        assert_eq!(cfg.threshold, 300.0);
        assert_eq!(cfg.window, WindowKind::Tukey);
        assert_eq!(cfg.cutfreq_hz, 25.0);
    }

    #[test]
    fn validate_rejects_zero_superpos_and_empty_range() {
        let cfg = AnalysisConfig { superpos: 0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(AnalysisError::InvalidConfig(_))));

        let cfg = AnalysisConfig { value_range: [1.0, 1.0], ..Default::default() };
        assert!(matches!(cfg.validate(), Err(AnalysisError::InvalidConfig(_))));
    }
}
