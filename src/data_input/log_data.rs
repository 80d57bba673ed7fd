// src/data_input/log_data.rs

use crate::data_analysis::resample;
use crate::error::{AnalysisError, AnalysisResult};

/// Names of the decoded per-axis channels the analysis consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelKind {
    Setpoint,
    Measured,
    Throttle,
    DTermError,
    Debug,
}

impl ChannelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChannelKind::Setpoint => "setpoint",
            ChannelKind::Measured => "measured",
            ChannelKind::Throttle => "throttle",
            ChannelKind::DTermError => "d_term_error",
            ChannelKind::Debug => "debug",
        }
    }
}

/// Decoded time series for one control axis, all sampled at `time_s`.
///
/// This is the hand-off point from the log decoder: values are already
/// scaled (setpoint/measured in deg/s, throttle in percent).
#[derive(Debug, Default, Clone)]
pub struct AxisChannels {
    pub time_s: Vec<f64>,          // Timestamps in seconds, non-decreasing.
    pub setpoint: Vec<f64>,        // Commanded rate.
    pub measured: Vec<f64>,        // Measured rate (gyro).
    pub throttle: Vec<f64>,        // Throttle in [0, 100].
    pub d_term_error: Option<Vec<f64>>, // Enables the noise/filter analysis.
    pub debug: Option<Vec<f64>>,   // Unfiltered reference for filter transmission.
}

impl AxisChannels {
    pub fn new(time_s: Vec<f64>, setpoint: Vec<f64>, measured: Vec<f64>, throttle: Vec<f64>) -> Self {
        Self {
            time_s,
            setpoint,
            measured,
            throttle,
            d_term_error: None,
            debug: None,
        }
    }

    /// Builds channels from integer-microsecond timestamps.
    pub fn from_micros(time_us: &[i64], setpoint: Vec<f64>, measured: Vec<f64>, throttle: Vec<f64>) -> Self {
        let time_s = time_us.iter().map(|&t| t as f64 / 1_000_000.0).collect();
        Self::new(time_s, setpoint, measured, throttle)
    }

    pub fn with_d_term_error(mut self, d_term_error: Vec<f64>) -> Self {
        self.d_term_error = Some(d_term_error);
        self
    }

    pub fn with_debug(mut self, debug: Vec<f64>) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Replaces `kind` with `values` logged on their own timebase, linearly
    /// interpolated (and extrapolated at the ends) onto `time_s`.
    pub fn align_channel(&mut self, kind: ChannelKind, source_time_s: &[f64], values: &[f64]) -> AnalysisResult<()> {
        let aligned = resample::resample_onto(source_time_s, values, &self.time_s)?;
        match kind {
            ChannelKind::Setpoint => self.setpoint = aligned,
            ChannelKind::Measured => self.measured = aligned,
            ChannelKind::Throttle => self.throttle = aligned,
            ChannelKind::DTermError => self.d_term_error = Some(aligned),
            ChannelKind::Debug => self.debug = Some(aligned),
        }
        Ok(())
    }

    /// Present channels in a fixed order, paired with their kind.
    pub fn channels(&self) -> Vec<(ChannelKind, &[f64])> {
        let mut channels: Vec<(ChannelKind, &[f64])> = vec![
            (ChannelKind::Setpoint, self.setpoint.as_slice()),
            (ChannelKind::Measured, self.measured.as_slice()),
            (ChannelKind::Throttle, self.throttle.as_slice()),
        ];
        if let Some(d_err) = &self.d_term_error {
            channels.push((ChannelKind::DTermError, d_err.as_slice()));
        }
        if let Some(debug) = &self.debug {
            channels.push((ChannelKind::Debug, debug.as_slice()));
        }
        channels
    }

    /// Checks that every channel matches the timestamp count.
    pub fn check_lengths(&self) -> AnalysisResult<()> {
        let expected = self.time_s.len();
        for (kind, values) in self.channels() {
            if values.len() != expected {
                return Err(AnalysisError::ChannelLengthMismatch {
                    channel: kind.name().to_string(),
                    expected,
                    actual: values.len(),
                });
            }
        }
        Ok(())
    }
}
