// src/data_analysis/deconvolution.rs

use ndarray::{s, Array1, Array2, ArrayView1, Axis};
use num_complex::Complex64;
use realfft::RealFftPlanner;

use crate::constants::DECONVOLUTION_SIGNAL_TO_NOISE;
use crate::data_analysis::fft_utils;
use crate::data_analysis::smoothing::{gaussian_filter1d, EdgeMode};
use crate::error::{AnalysisError, AnalysisResult};

/// Shifts `values` to start at 0 and scales the maximum to 1 (if non-zero).
fn to_mask(values: &mut Array1<f64>) {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    values.mapv_inplace(|v| v - min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max > 1e-10 {
        values.mapv_inplace(|v| v / max);
    }
}

/// Signal-to-noise prior `sn(f)` over the non-negative FFT bins of a
/// `padded_n`-sample transform with sample spacing `step_s`.
///
/// A hard stop mask (0 below `cutfreq_hz`, 1 above) is Gaussian-smoothed over
/// the two-sided spectrum with sigma equal to a sixth of the passband width in
/// bins, renormalized, and mapped to `10 * (1 - mask)`: large in the passband,
/// near zero in the stopband.
pub fn regularization_profile(padded_n: usize, step_s: f64, cutfreq_hz: f64) -> Array1<f64> {
    let freq = Array1::from_shape_fn(padded_n, |k| {
        let signed = if k <= (padded_n - 1) / 2 {
            k as f64
        } else {
            k as f64 - padded_n as f64
        };
        (signed / (padded_n as f64 * step_s)).abs()
    });
    let mut mask = freq.mapv(|f| f.clamp(cutfreq_hz - 1e-9, cutfreq_hz));
    to_mask(&mut mask);

    let passband_bins: f64 = mask.iter().map(|m| 1.0 - m).sum();
    let mut smoothed = gaussian_filter1d(mask.view(), passband_bins / 6.0, EdgeMode::Reflect);
    to_mask(&mut smoothed);

    smoothed
        .slice(s![0..padded_n / 2 + 1])
        .mapv(|m| DECONVOLUTION_SIGNAL_TO_NOISE * (1.0 - m + 1e-9))
}

/// Frequency-domain Wiener deconvolution of frames of a fixed length.
///
/// The padded length, FFT plans and regularization profile are computed once
/// and reused for every frame.
pub struct WienerDeconvolver {
    planner: RealFftPlanner<f64>,
    frame_len: usize,
    padded_len: usize,
    response_len: usize,
    noise_to_signal: Array1<f64>,
}

impl WienerDeconvolver {
    /// `step_s` is the grid spacing used for the frequency axis and
    /// `sample_rate_hz` the effective rate checked against `min_sample_rate_hz`.
    pub fn new(
        frame_len: usize,
        response_len: usize,
        step_s: f64,
        sample_rate_hz: f64,
        cutfreq_hz: f64,
        min_sample_rate_hz: f64,
        fft_block: usize,
    ) -> AnalysisResult<Self> {
        if !sample_rate_hz.is_finite() || sample_rate_hz < min_sample_rate_hz || !(step_s > 0.0) {
            return Err(AnalysisError::InsufficientSampleRate {
                sample_rate_hz,
                min_hz: min_sample_rate_hz,
            });
        }
        if frame_len == 0 || response_len == 0 {
            return Err(AnalysisError::InsufficientData(
                "frame or response length is zero samples".to_string(),
            ));
        }
        let padded_len = fft_utils::padded_len(frame_len, fft_block);
        let noise_to_signal = regularization_profile(padded_len, step_s, cutfreq_hz).mapv(|sn| 1.0 / sn);
        Ok(Self {
            planner: RealFftPlanner::new(),
            frame_len,
            padded_len,
            response_len: response_len.min(padded_len),
            noise_to_signal,
        })
    }

    pub fn padded_len(&self) -> usize {
        self.padded_len
    }

    pub fn response_len(&self) -> usize {
        self.response_len
    }

    /// Estimated impulse response of one frame, truncated to the response length.
    pub fn impulse_response(&mut self, input: ArrayView1<f64>, output: ArrayView1<f64>) -> Array1<f64> {
        let h_spec = fft_utils::fft_forward(&mut self.planner, &fft_utils::zero_pad(input, self.padded_len));
        let g_spec = fft_utils::fft_forward(&mut self.planner, &fft_utils::zero_pad(output, self.padded_len));

        let mut deconvolved_spec = Array1::<Complex64>::zeros(h_spec.len());
        for (i, d) in deconvolved_spec.iter_mut().enumerate() {
            let h = h_spec[i];
            let h_conj = h.conj();
            // G * H* / (|H|^2 + 1/sn)
            let denominator = (h * h_conj).re + self.noise_to_signal[i];
            *d = g_spec[i] * h_conj / denominator;
        }

        let impulse = fft_utils::fft_inverse(&mut self.planner, &deconvolved_spec, self.padded_len);
        impulse.slice(s![0..self.response_len]).to_owned()
    }

    /// Step responses (cumulative impulse responses) for every row of the
    /// windowed input/output frame stacks, one row per frame.
    pub fn step_responses(&mut self, inputs: &Array2<f64>, outputs: &Array2<f64>) -> AnalysisResult<Array2<f64>> {
        if inputs.dim() != outputs.dim() || inputs.ncols() != self.frame_len {
            return Err(AnalysisError::InsufficientData(format!(
                "frame stacks {:?} and {:?} do not match frame length {}",
                inputs.dim(),
                outputs.dim(),
                self.frame_len
            )));
        }
        let mut responses = Array2::<f64>::zeros((inputs.nrows(), self.response_len));
        for ((input, output), mut row) in inputs
            .axis_iter(Axis(0))
            .zip(outputs.axis_iter(Axis(0)))
            .zip(responses.axis_iter_mut(Axis(0)))
        {
            let impulse = self.impulse_response(input, output);
            row.assign(&cumulative_sum(&impulse));
        }
        Ok(responses)
    }
}

/// Cumulative sum; non-finite samples contribute nothing.
pub fn cumulative_sum(data: &Array1<f64>) -> Array1<f64> {
    let mut current_sum = 0.0;
    data.mapv(|val| {
        if val.is_finite() {
            current_sum += val;
        }
        current_sum
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_analysis::window::hann;

    #[test]
    fn profile_trusts_passband_and_suppresses_stopband() {
        let sn = regularization_profile(1024, 0.001, 25.0);
        assert_eq!(sn.len(), 513);
        // DC is deep in the passband, Nyquist deep in the stopband
        assert!((sn[0] - 10.0).abs() < 1e-6);
        assert!(sn[512] < 1e-6);
        for w in sn.as_slice().unwrap().windows(2) {
            assert!(w[1] <= w[0] + 1e-12);
        }
    }

    #[test]
    fn sample_rate_below_minimum_is_rejected() {
        let err = WienerDeconvolver::new(50, 25, 0.02, 50.0, 25.0, 100.0, 1024).err();
        assert_eq!(
            err,
            Some(AnalysisError::InsufficientSampleRate { sample_rate_hz: 50.0, min_hz: 100.0 })
        );
        let err = WienerDeconvolver::new(50, 25, 0.0, f64::INFINITY, 25.0, 100.0, 1024).err();
        assert!(matches!(err, Some(AnalysisError::InsufficientSampleRate { .. })));
    }

    #[test]
    fn delayed_copy_yields_delayed_step() {
        let n = 1000;
        let delay = 20;
        let window = hann(n);
        // deterministic broadband input
        let mut state = 12345u64;
        let raw: Vec<f64> = (0..n + delay)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5
            })
            .map(|v| v * 400.0)
            .collect();
        let input = Array1::from_shape_fn(n, |i| raw[i + delay] * window[i]);
        let output = Array1::from_shape_fn(n, |i| raw[i] * window[i]);

        let mut deconvolver = WienerDeconvolver::new(n, 500, 0.001, 1000.0, 25.0, 100.0, 1024).unwrap();
        let impulse = deconvolver.impulse_response(input.view(), output.view());
        let peak = impulse
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });
        assert!((peak.0 as isize - delay as isize).abs() <= 2, "peak at {}", peak.0);

        let step = cumulative_sum(&impulse);
        assert!(step[5] < 0.2);
        assert!(step[400] > 0.8 && step[400] < 1.2, "settled at {}", step[400]);
    }

    #[test]
    fn cumulative_sum_skips_non_finite() {
        let data = Array1::from(vec![1.0, f64::NAN, 2.0, 3.0]);
        assert_eq!(cumulative_sum(&data).to_vec(), vec![1.0, 1.0, 3.0, 6.0]);
    }
}
