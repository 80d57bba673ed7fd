// src/data_analysis/frame_classifier.rs

use log::info;
use ndarray::{Array1, Array2, Axis};
use ndarray_stats::QuantileExt;

/// Scalars derived once per frame from the windowed frame stacks.
#[derive(Debug, Clone)]
pub struct FrameStats {
    /// Peak |setpoint|
    pub max_in: Array1<f64>,
    /// Mean |setpoint|
    pub avr_in: Array1<f64>,
    /// Peak |throttle|
    pub max_thr: Array1<f64>,
    /// Mean frame time
    pub avr_t: Array1<f64>,
    /// Every setpoint and measured sample of the frame is finite
    pub finite: Array1<bool>,
}

fn row_abs_max(frames: &Array2<f64>) -> Array1<f64> {
    frames.map_axis(Axis(1), |row| *row.mapv(f64::abs).max_skipnan())
}

impl FrameStats {
    pub fn compute(
        windowed_input: &Array2<f64>,
        windowed_output: &Array2<f64>,
        windowed_throttle: &Array2<f64>,
        time: &Array2<f64>,
    ) -> Self {
        let avr_in = windowed_input
            .mapv(f64::abs)
            .mean_axis(Axis(1))
            .unwrap_or_else(|| Array1::zeros(windowed_input.nrows()));
        let avr_t = time.mean_axis(Axis(1)).unwrap_or_else(|| Array1::zeros(time.nrows()));
        let finite = Array1::from_iter(
            windowed_input
                .axis_iter(Axis(0))
                .zip(windowed_output.axis_iter(Axis(0)))
                .map(|(inp, out)| inp.iter().chain(out.iter()).all(|v| v.is_finite())),
        );
        Self {
            max_in: row_abs_max(windowed_input),
            avr_in,
            max_thr: row_abs_max(windowed_throttle),
            avr_t,
            finite,
        }
    }

    pub fn len(&self) -> usize {
        self.max_in.len()
    }

    pub fn is_empty(&self) -> bool {
        self.max_in.is_empty()
    }
}

/// Per-frame class tags. `low` and `high` partition the frames unless the
/// high class was folded out for having too few members.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMasks {
    pub low: Array1<bool>,
    pub high: Array1<bool>,
    pub trusted: Array1<bool>,
}

impl FrameMasks {
    pub fn classify(max_in: &Array1<f64>, threshold: f64, trusted_min_rate: f64, min_high_frames: usize) -> Self {
        let low = max_in.mapv(|m| m <= threshold);
        let mut high = low.mapv(|is_low| !is_low);
        let high_count = high.iter().filter(|&&h| h).count();
        if high_count < min_high_frames {
            high.fill(false);
        }
        let trusted = max_in.mapv(|m| m > trusted_min_rate);
        let masks = Self { low, high, trusted };
        info!(
            "Classified {} frames: {} low-rate, {} high-rate{}, {} trusted",
            max_in.len(),
            masks.low_count(),
            masks.high_count(),
            if high_count > 0 && high_count < min_high_frames { " (folded out)" } else { "" },
            masks.trusted.iter().filter(|&&t| t).count()
        );
        masks
    }

    /// Withdraws trust from frames not marked `usable`. Class membership is
    /// unchanged. Returns how many trusted frames were withdrawn.
    pub fn distrust(&mut self, usable: &Array1<bool>) -> usize {
        let mut withdrawn = 0;
        for (trusted, &ok) in self.trusted.iter_mut().zip(usable.iter()) {
            if *trusted && !ok {
                *trusted = false;
                withdrawn += 1;
            }
        }
        withdrawn
    }

    pub fn low_count(&self) -> usize {
        self.low.iter().filter(|&&l| l).count()
    }

    pub fn high_count(&self) -> usize {
        self.high.iter().filter(|&&h| h).count()
    }

    /// 1.0 for trusted low-rate frames, 0.0 otherwise.
    pub fn low_weights(&self) -> Array1<f64> {
        combine(&self.low, &self.trusted)
    }

    /// 1.0 for trusted high-rate frames, 0.0 otherwise.
    pub fn high_weights(&self) -> Array1<f64> {
        combine(&self.high, &self.trusted)
    }
}

fn combine(class: &Array1<bool>, trusted: &Array1<bool>) -> Array1<f64> {
    Array1::from_iter(class.iter().zip(trusted.iter()).map(|(&c, &t)| if c && t { 1.0 } else { 0.0 }))
}
