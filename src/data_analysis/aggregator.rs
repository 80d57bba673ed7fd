// src/data_analysis/aggregator.rs

use log::debug;
use ndarray::{Array1, Array2, Axis};

use crate::config::AnalysisConfig;
use crate::data_analysis::histogram::{BinAxis, Histogram2d};
use crate::data_analysis::smoothing::{gaussian_filter_axis, EdgeMode};

/// Whether a curve carries an estimate or is an all-zero placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveStatus {
    Estimated,
    /// No frame contributed histogram mass; the curve is all zeros.
    NoData,
}

/// Column-normalized density image of the per-frame responses,
/// indexed `[value bin, time sample]`.
#[derive(Debug, Clone)]
pub struct ResponseHistogram {
    pub time: Array1<f64>,
    pub value_axis: Array1<f64>,
    pub density: Array2<f64>,
}

/// Representative step response of one frame class.
#[derive(Debug, Clone)]
pub struct RepresentativeCurve {
    pub time: Array1<f64>,
    pub value: Array1<f64>,
    /// Spread of the raw histogram per time sample, in response units
    pub width: Array1<f64>,
    pub histogram: ResponseHistogram,
    /// Total weighted histogram mass
    pub mass: f64,
    /// Frames with non-zero weight
    pub frames: usize,
    pub status: CurveStatus,
}

impl RepresentativeCurve {
    pub fn is_no_data(&self) -> bool {
        self.status == CurveStatus::NoData
    }

    /// First time the curve crosses 1.0, linearly interpolated between samples.
    /// `None` without data, without a crossing, or if the crossing is later than `max_s`.
    pub fn response_time(&self, max_s: f64) -> Option<f64> {
        if self.is_no_data() {
            return None;
        }
        let idx = self.value.iter().position(|&v| v > 1.0)?;
        if idx == 0 {
            return None;
        }
        let (t0, t1) = (self.time[idx - 1], self.time[idx]);
        let (y0, y1) = (self.value[idx - 1] - 1.0, self.value[idx] - 1.0);
        let crossing = t0 - y0 * (t0 - t1) / (y0 - y1);
        (crossing < max_s).then_some(crossing)
    }
}

/// Histogram binning and smoothing parameters for `aggregate_responses`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationParams {
    pub value_range: [f64; 2],
    pub bins: usize,
    pub smoothing_bins: f64,
    pub density_threshold: f64,
}

impl From<&AnalysisConfig> for AggregationParams {
    fn from(cfg: &AnalysisConfig) -> Self {
        Self {
            value_range: cfg.value_range,
            bins: cfg.bin_count,
            smoothing_bins: cfg.value_smoothing_bins,
            density_threshold: cfg.density_threshold,
        }
    }
}

/// Finds the most common response curve across weighted frames.
///
/// `responses` holds one step response per row, sampled at `time`. Each
/// sample of each frame lands in the `[value bin, time sample]` cell with
/// the frame's weight. The curve is the per-column average of bin centers
/// weighted by the squared, smoothed, column-normalized density.
pub fn aggregate_responses(
    responses: &Array2<f64>,
    weights: &Array1<f64>,
    time: &Array1<f64>,
    params: AggregationParams,
) -> RepresentativeCurve {
    let rlen = time.len();
    let value_axis = BinAxis::new(params.value_range[0], params.value_range[1], params.bins);
    let time_axis = BinAxis::new(0.0, rlen as f64, rlen);
    let mut hist = Histogram2d::new(value_axis, time_axis);

    let mut frames = 0;
    for (row, &w) in responses.axis_iter(Axis(0)).zip(weights.iter()) {
        if w == 0.0 {
            continue;
        }
        frames += 1;
        for (col, &v) in row.iter().take(rlen).enumerate() {
            hist.add_to_column(v, col, w);
        }
    }

    let centers = value_axis.centers();
    let mass = hist.total();
    let (value, density, status) = if mass > 0.0 {
        let mut smoothed = gaussian_filter_axis(&hist.counts, params.smoothing_bins, Axis(0), EdgeMode::Constant);
        for mut column in smoothed.axis_iter_mut(Axis(1)) {
            let peak = column.iter().cloned().fold(0.0, f64::max);
            if peak > 0.0 {
                column.mapv_inplace(|d| d / peak);
            }
        }
        let value = Array1::from_iter(smoothed.axis_iter(Axis(1)).map(|column| {
            let (num, den) = column
                .iter()
                .zip(centers.iter())
                .fold((0.0, 0.0), |(num, den), (&d, &c)| (num + c * d * d, den + d * d));
            if den > 0.0 {
                num / den
            } else {
                0.0
            }
        }));
        (value, smoothed, CurveStatus::Estimated)
    } else {
        debug!("No frame contributed to the response histogram; reporting an empty curve.");
        (Array1::zeros(rlen), hist.counts.clone(), CurveStatus::NoData)
    };

    let marked = value_axis.width() / 2.0;
    let width = hist
        .counts
        .mapv(|c| if c > params.density_threshold { marked } else { 0.0 })
        .sum_axis(Axis(0));

    RepresentativeCurve {
        time: time.clone(),
        value,
        width,
        histogram: ResponseHistogram {
            time: time.clone(),
            value_axis: centers,
            density,
        },
        mass,
        frames,
        status,
    }
}
