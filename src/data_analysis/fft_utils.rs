// src/data_analysis/fft_utils.rs

use ndarray::{s, Array1, ArrayView1};
use realfft::num_complex::Complex64;
use realfft::RealFftPlanner;

/// Length a frame of `n` samples is zero-padded to before transforming:
/// the next multiple of `block` strictly above `n`.
pub fn padded_len(n: usize, block: usize) -> usize {
    (n / block + 1) * block
}

/// Copies `data` into a zero buffer of `padded_n` samples.
pub fn zero_pad(data: ArrayView1<f64>, padded_n: usize) -> Array1<f64> {
    let mut padded = Array1::<f64>::zeros(padded_n);
    let n = data.len().min(padded_n);
    padded.slice_mut(s![0..n]).assign(&data.slice(s![0..n]));
    padded
}

/// Computes the Fast Fourier Transform (FFT) of a real-valued signal.
/// Returns the `n/2 + 1` non-negative frequency bins.
pub fn fft_forward(planner: &mut RealFftPlanner<f64>, data: &Array1<f64>) -> Array1<Complex64> {
    if data.is_empty() {
        return Array1::zeros(0);
    }
    let n = data.len();
    let mut input = data.to_vec();
    let fft = planner.plan_fft_forward(n);
    let mut output = fft.make_output_vec();
    if fft.process(&mut input, &mut output).is_err() {
        log::warn!("FFT forward processing failed for {} samples.", n);
        return Array1::zeros(n / 2 + 1);
    }
    Array1::from(output)
}

/// Computes the Inverse Fast Fourier Transform (IFFT) of a half spectrum.
/// Requires the original signal length N and normalizes by 1/N.
pub fn fft_inverse(planner: &mut RealFftPlanner<f64>, data: &Array1<Complex64>, original_length_n: usize) -> Array1<f64> {
    if data.is_empty() || original_length_n == 0 {
        return Array1::zeros(original_length_n);
    }
    let expected_complex_len = original_length_n / 2 + 1;
    if data.len() != expected_complex_len {
        log::warn!(
            "FFT inverse length mismatch. Expected complex length {}, got {}. Returning zeros.",
            expected_complex_len,
            data.len()
        );
        return Array1::zeros(original_length_n);
    }

    let mut input = data.to_vec();
    // DC (and Nyquist for even N) of a real signal carry no imaginary part.
    input[0].im = 0.0;
    if original_length_n % 2 == 0 {
        input[expected_complex_len - 1].im = 0.0;
    }
    let fft = planner.plan_fft_inverse(original_length_n);
    let mut output = fft.make_output_vec();
    if fft.process(&mut input, &mut output).is_err() {
        log::warn!("FFT inverse processing failed. Returning zeros.");
        return Array1::zeros(original_length_n);
    }
    let scale = 1.0 / original_length_n as f64;
    let mut output_arr = Array1::from(output);
    output_arr.mapv_inplace(|x| x * scale);
    output_arr
}

/// Frequencies of the real FFT bins for `n` samples spaced `d` seconds.
pub fn fft_rfftfreq(n: usize, d: f64) -> Array1<f64> {
    if n == 0 || d <= 0.0 {
        return Array1::zeros(0);
    }
    Array1::from_shape_fn(n / 2 + 1, |i| i as f64 / (n as f64 * d))
}
