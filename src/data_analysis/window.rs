// src/data_analysis/window.rs

use std::collections::BTreeMap;
use std::ops::Range;

use log::debug;
use ndarray::{s, Array1, Array2, Axis};

use crate::config::WindowKind;
use crate::data_analysis::resample::UniformSeries;
use crate::data_input::log_data::ChannelKind;
use crate::error::{AnalysisError, AnalysisResult};

/// Hann window, `0.5 - 0.5 cos(2 pi n / (M - 1))`.
pub fn hann(num: usize) -> Array1<f64> {
    if num == 1 {
        return Array1::ones(1);
    }
    let denom = (num as f64 - 1.0).max(1.0);
    Array1::from_shape_fn(num, |i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / denom).cos())
}

/// Makes a Tukey window for enveloping.
/// `alpha <= 0` is rectangular, `alpha >= 1` is Hann.
pub fn tukeywin(num: usize, alpha: f64) -> Array1<f64> {
    if alpha <= 0.0 {
        return Array1::ones(num);
    } else if alpha >= 1.0 {
        return hann(num);
    }
    let denom = (num as f64 - 1.0).max(1.0);
    Array1::from_shape_fn(num, |i| {
        let x = i as f64 / denom;
        if x < alpha / 2.0 {
            0.5 * (1.0 + (2.0 * std::f64::consts::PI / alpha * (x - alpha / 2.0)).cos())
        } else if x >= 1.0 - alpha / 2.0 {
            0.5 * (1.0 + (2.0 * std::f64::consts::PI / alpha * (x - 1.0 + alpha / 2.0)).cos())
        } else {
            1.0
        }
    })
}

pub fn taper(kind: WindowKind, num: usize, tukey_alpha: f64) -> Array1<f64> {
    match kind {
        WindowKind::Hann => hann(num),
        WindowKind::Tukey => tukeywin(num, tukey_alpha),
    }
}

/// Placement of overlapping frames over a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub frame_len: usize,
    pub stride: usize,
    pub count: usize,
}

impl FrameGeometry {
    /// `stride = frame_len / superpos`, `count = (total - frame_len) / stride`.
    pub fn new(total_len: usize, frame_len: usize, superpos: usize) -> AnalysisResult<Self> {
        if frame_len == 0 || frame_len >= total_len {
            return Err(AnalysisError::WindowTooLarge { frame_len, available: total_len });
        }
        if superpos == 0 {
            return Err(AnalysisError::InvalidConfig("superposition factor must be non-zero".to_string()));
        }
        let stride = frame_len / superpos;
        if stride == 0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "frame of {} samples cannot be split into {} sub-windows",
                frame_len, superpos
            )));
        }
        let count = (total_len - frame_len) / stride;
        if count == 0 {
            return Err(AnalysisError::WindowTooLarge { frame_len, available: total_len });
        }
        Ok(Self { frame_len, stride, count })
    }

    pub fn range(&self, index: usize) -> Range<usize> {
        let start = index * self.stride;
        start..start + self.frame_len
    }
}

/// Frames of several channels, one row per frame. Rows are owned copies.
#[derive(Debug, Clone)]
pub struct FrameStack {
    pub geometry: FrameGeometry,
    pub time: Array2<f64>,
    frames: BTreeMap<ChannelKind, Array2<f64>>,
}

impl FrameStack {
    /// Copies every frame of `kinds` (and of the time axis) out of `series`.
    /// Channels missing from the series are skipped.
    pub fn from_series(series: &UniformSeries, kinds: &[ChannelKind], geometry: FrameGeometry) -> Self {
        let stack = |data: &Array1<f64>| {
            let mut rows = Array2::<f64>::zeros((geometry.count, geometry.frame_len));
            for (i, mut row) in rows.axis_iter_mut(Axis(0)).enumerate() {
                let range = geometry.range(i);
                row.assign(&data.slice(s![range.start..range.end]));
            }
            rows
        };
        let mut frames = BTreeMap::new();
        for kind in kinds {
            if let Some(data) = series.channel(*kind) {
                frames.insert(*kind, stack(data));
            }
        }
        debug!(
            "Stacked {} frames of {} samples (stride {}) for {} channels",
            geometry.count,
            geometry.frame_len,
            geometry.stride,
            frames.len()
        );
        Self {
            geometry,
            time: stack(&series.time),
            frames,
        }
    }

    pub fn len(&self) -> usize {
        self.time.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn raw(&self, kind: ChannelKind) -> Option<&Array2<f64>> {
        self.frames.get(&kind)
    }

    /// Frames of `kind` multiplied row-wise by `window`.
    pub fn windowed(&self, kind: ChannelKind, window: &Array1<f64>) -> Option<Array2<f64>> {
        self.frames.get(&kind).map(|frames| frames * window)
    }

    /// Discards the last `n` frames (all of them if fewer remain).
    pub fn drop_trailing(&mut self, n: usize) {
        let keep = self.len().saturating_sub(n);
        self.time = self.time.slice(s![..keep, ..]).to_owned();
        for frames in self.frames.values_mut() {
            *frames = frames.slice(s![..keep, ..]).to_owned();
        }
        self.geometry.count = keep;
    }
}
