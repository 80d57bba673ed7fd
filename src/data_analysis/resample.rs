// src/data_analysis/resample.rs

use std::collections::BTreeMap;

use log::debug;
use ndarray::Array1;

use crate::data_input::log_data::ChannelKind;
use crate::error::{AnalysisError, AnalysisResult};

/// All channels of one axis on a common, uniformly spaced time grid.
#[derive(Debug, Clone)]
pub struct UniformSeries {
    pub time: Array1<f64>,
    channels: BTreeMap<ChannelKind, Array1<f64>>,
    /// Nominal sample period `(t_end - t0) / N`, used for window sizing
    pub dt: f64,
}

impl UniformSeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn channel(&self, kind: ChannelKind) -> Option<&Array1<f64>> {
        self.channels.get(&kind)
    }

    pub fn has_channel(&self, kind: ChannelKind) -> bool {
        self.channels.contains_key(&kind)
    }

    /// Spacing between consecutive grid points.
    pub fn grid_step(&self) -> f64 {
        if self.time.len() < 2 {
            return 0.0;
        }
        self.time[1] - self.time[0]
    }

    pub fn sample_rate_hz(&self) -> f64 {
        1.0 / self.dt
    }

    /// Number of samples covering `duration_s` at the nominal sample period.
    pub fn samples_for(&self, duration_s: f64) -> usize {
        let samples = (duration_s / self.dt).round();
        if samples.is_finite() && samples > 0.0 {
            samples as usize
        } else {
            0
        }
    }
}

fn check_time(time: &[f64]) -> AnalysisResult<()> {
    if time.len() < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "need at least 2 samples, got {}",
            time.len()
        )));
    }
    if let Some(index) = time.iter().position(|t| !t.is_finite()) {
        return Err(AnalysisError::InsufficientData(format!(
            "non-finite timestamp at sample {}",
            index
        )));
    }
    if let Some(index) = (1..time.len()).find(|&i| time[i] < time[i - 1]) {
        return Err(AnalysisError::NonMonotonicTime { index });
    }
    Ok(())
}

/// Linear interpolation of (`src_time`, `src_values`) at sorted `dst_time`.
/// Points outside the source span are extrapolated from the end segments;
/// zero-length segments (duplicate timestamps) take the left value.
fn interpolate_sorted(src_time: &[f64], src_values: &[f64], dst_time: &[f64]) -> Vec<f64> {
    let n = src_time.len();
    let mut out = Vec::with_capacity(dst_time.len());
    let mut j = 0;
    for &t in dst_time {
        while j + 2 < n && src_time[j + 1] <= t {
            j += 1;
        }
        let (t0, t1) = (src_time[j], src_time[j + 1]);
        let (v0, v1) = (src_values[j], src_values[j + 1]);
        let span = t1 - t0;
        if span > 0.0 {
            out.push(v0 + (v1 - v0) * (t - t0) / span);
        } else {
            out.push(v0);
        }
    }
    out
}

/// Resamples every channel onto `linspace(time[0], time[-1], N)`.
pub fn resample_uniform(time: &[f64], channels: &[(ChannelKind, &[f64])]) -> AnalysisResult<UniformSeries> {
    check_time(time)?;
    let n = time.len();
    for (kind, values) in channels {
        if values.is_empty() {
            return Err(AnalysisError::InsufficientData(format!("channel '{}' is empty", kind.name())));
        }
        if values.len() != n {
            return Err(AnalysisError::ChannelLengthMismatch {
                channel: kind.name().to_string(),
                expected: n,
                actual: values.len(),
            });
        }
    }

    let t0 = time[0];
    let t_end = time[n - 1];
    let uniform_time = Array1::linspace(t0, t_end, n);
    let dt = (t_end - t0) / n as f64;

    let mut resampled = BTreeMap::new();
    for (kind, values) in channels {
        let grid = uniform_time.as_slice().unwrap_or(&[]);
        resampled.insert(*kind, Array1::from(interpolate_sorted(time, values, grid)));
    }
    debug!(
        "Resampled {} channels onto {} samples (dt = {:.6} s, {:.1} Hz)",
        resampled.len(),
        n,
        dt,
        1.0 / dt
    );

    Ok(UniformSeries {
        time: uniform_time,
        channels: resampled,
        dt,
    })
}

/// Interpolates one channel logged on `source_time` onto `target_time`,
/// extrapolating linearly beyond the source span.
pub fn resample_onto(source_time: &[f64], values: &[f64], target_time: &[f64]) -> AnalysisResult<Vec<f64>> {
    check_time(source_time)?;
    if values.len() != source_time.len() {
        return Err(AnalysisError::ChannelLengthMismatch {
            channel: "aligned channel".to_string(),
            expected: source_time.len(),
            actual: values.len(),
        });
    }
    check_time(target_time)?;
    Ok(interpolate_sorted(source_time, values, target_time))
}
