// src/data_analysis/noise_analysis.rs

use log::{debug, warn};
use ndarray::{Array1, Array2, Axis};
use realfft::RealFftPlanner;

use crate::config::AnalysisConfig;
use crate::constants::NOISE_PEAK_SEARCH_MIN_HZ;
use crate::data_analysis::aggregator::CurveStatus;
use crate::data_analysis::fft_utils;
use crate::data_analysis::histogram::{histogram1d, BinAxis, Histogram2d};
use crate::data_analysis::resample::UniformSeries;
use crate::data_analysis::smoothing::{gaussian_filter_axis, EdgeMode};
use crate::data_analysis::window::{taper, FrameGeometry, FrameStack};
use crate::data_input::log_data::ChannelKind;
use crate::error::AnalysisResult;

/// Spectral energy of one channel binned by throttle and frequency,
/// indexed `[frequency bin, throttle bin]`.
#[derive(Debug, Clone)]
pub struct ThrottleSpectrogram {
    pub frequency_axis: Array1<f64>,
    pub throttle_axis: Array1<f64>,
    /// Windows per throttle bin
    pub throttle_counts: Array1<f64>,
    pub histogram: Array2<f64>,
    /// `histogram` divided by the window count of its throttle bin
    pub normalized: Array2<f64>,
    pub smoothed: Array2<f64>,
    /// Largest smoothed value at or above 100 Hz, for colour scaling
    pub peak_above_100hz: f64,
}

/// Estimated output-filter transmission per frequency bin.
#[derive(Debug, Clone)]
pub struct FilterTransmission {
    pub frequency: Array1<f64>,
    pub attenuation: Array1<f64>,
    pub status: CurveStatus,
}

#[derive(Debug, Clone)]
pub struct NoiseAnalysis {
    pub windows: usize,
    pub gyro: ThrottleSpectrogram,
    pub d_term: ThrottleSpectrogram,
    pub debug: Option<ThrottleSpectrogram>,
    pub transmission: FilterTransmission,
}

struct SpectrogramBuilder<'a> {
    config: &'a AnalysisConfig,
    planner: RealFftPlanner<f64>,
    window: Array1<f64>,
    padded_len: usize,
    freq: Array1<f64>,
    freq_axis: BinAxis,
    throttle_axis: BinAxis,
    throttle: Array1<f64>,
}

impl<'a> SpectrogramBuilder<'a> {
    fn build(&mut self, frames: &Array2<f64>) -> ThrottleSpectrogram {
        let mut hist = Histogram2d::new(self.freq_axis, self.throttle_axis);
        let norm = 1.0 / (self.padded_len as f64).sqrt();
        for (frame, &thr) in frames.axis_iter(Axis(0)).zip(self.throttle.iter()) {
            let windowed = &frame * &self.window;
            let padded = fft_utils::zero_pad(windowed.view(), self.padded_len);
            let spectrum = fft_utils::fft_forward(&mut self.planner, &padded);
            for (&f, c) in self.freq.iter().zip(spectrum.iter()) {
                hist.add(f, thr, c.norm() * norm);
            }
        }

        let throttle_counts = histogram1d(self.throttle.iter(), self.throttle_axis);
        let divisor = throttle_counts.mapv(|c| c + 1e-9);
        let normalized = &hist.counts / &divisor;
        let smoothed = gaussian_filter_axis(&normalized, self.config.noise_smoothing_bins, Axis(0), EdgeMode::Constant);

        let frequency_axis = self.freq_axis.centers();
        let peak_above_100hz = smoothed
            .axis_iter(Axis(0))
            .zip(frequency_axis.iter())
            .filter(|(_, &f)| f >= NOISE_PEAK_SEARCH_MIN_HZ)
            .flat_map(|(row, _)| row.to_vec())
            .fold(0.0, f64::max);

        ThrottleSpectrogram {
            frequency_axis,
            throttle_axis: self.throttle_axis.centers(),
            throttle_counts,
            histogram: hist.counts,
            normalized,
            smoothed,
            peak_above_100hz,
        }
    }
}

/// Throttle-occupancy-weighted ratio of the filtered to the reference
/// histogram, per frequency bin.
fn filter_transmission(
    gyro: &ThrottleSpectrogram,
    reference: Option<&ThrottleSpectrogram>,
) -> FilterTransmission {
    let frequency = gyro.frequency_axis.clone();
    let reference = match reference {
        Some(r) if r.histogram.sum() > 0.0 => r,
        _ => {
            debug!("No reference spectrum mass; filter transmission left empty.");
            return FilterTransmission {
                attenuation: Array1::zeros(frequency.len()),
                frequency,
                status: CurveStatus::NoData,
            };
        }
    };
    let occupied = gyro.throttle_counts.mapv(|c| c.clamp(0.0, 1.0));
    let filtered = gyro.histogram.dot(&occupied);
    let unfiltered = reference.histogram.dot(&occupied);
    let attenuation = Array1::from_iter(
        filtered
            .iter()
            .zip(unfiltered.iter())
            .map(|(&g, &r)| if r > 0.0 { g / r } else { 0.0 }),
    );
    FilterTransmission {
        frequency,
        attenuation,
        status: CurveStatus::Estimated,
    }
}

/// Runs the narrow-window spectral pass. Returns `Ok(None)` when the series
/// has no D-term error channel.
pub fn analyze_noise(series: &UniformSeries, config: &AnalysisConfig) -> AnalysisResult<Option<NoiseAnalysis>> {
    if !series.has_channel(ChannelKind::DTermError) {
        debug!("No D-term error channel; skipping noise analysis.");
        return Ok(None);
    }
    let win_len = series.samples_for(config.noise_framelen_s);
    let geometry = FrameGeometry::new(series.len(), win_len, config.noise_superpos)?;
    let mut stack = FrameStack::from_series(
        series,
        &[
            ChannelKind::Measured,
            ChannelKind::Throttle,
            ChannelKind::DTermError,
            ChannelKind::Debug,
        ],
        geometry,
    );
    // slicing off the tail to get rid of landing
    let tail = (config.noise_superpos as f64 * config.noise_tail_s / config.noise_framelen_s) as usize;
    stack.drop_trailing(tail);
    if stack.is_empty() {
        warn!(
            "All {} noise windows fall into the discarded {:.1} s tail.",
            geometry.count, config.noise_tail_s
        );
    }

    let window = taper(config.window, win_len, config.tukey_alpha);
    let throttle = match stack.windowed(ChannelKind::Throttle, &window) {
        Some(thr) => thr.map_axis(Axis(1), |row| row.iter().fold(0.0, |m: f64, v| m.max(v.abs()))),
        None => Array1::zeros(stack.len()),
    };

    let padded_len = fft_utils::padded_len(win_len, config.fft_block);
    let freq = fft_utils::fft_rfftfreq(padded_len, series.grid_step());
    let freq_bins = (freq.len() / config.noise_freq_decimation).max(1);
    let freq_axis = BinAxis::new(freq[0], freq[freq.len() - 1], freq_bins);

    let mut builder = SpectrogramBuilder {
        config,
        planner: RealFftPlanner::new(),
        window,
        padded_len,
        freq,
        freq_axis,
        throttle_axis: BinAxis::new(config.throttle_range[0], config.throttle_range[1], config.throttle_bins),
        throttle,
    };

    let empty = Array2::<f64>::zeros((0, win_len));
    let gyro = builder.build(stack.raw(ChannelKind::Measured).unwrap_or(&empty));
    let d_term = builder.build(stack.raw(ChannelKind::DTermError).unwrap_or(&empty));
    let debug = stack.raw(ChannelKind::Debug).map(|f| builder.build(f));
    let transmission = filter_transmission(&gyro, debug.as_ref());

    debug!(
        "Noise analysis over {} windows of {} samples, {} frequency bins",
        stack.len(),
        win_len,
        freq_bins
    );
    Ok(Some(NoiseAnalysis {
        windows: stack.len(),
        gyro,
        d_term,
        debug,
        transmission,
    }))
}
