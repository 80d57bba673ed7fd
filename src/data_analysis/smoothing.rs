// src/data_analysis/smoothing.rs

use ndarray::{Array1, Array2, ArrayView1, Axis, Zip};

use crate::constants::GAUSSIAN_TRUNCATE_SIGMAS;

/// How samples beyond either edge are filled during convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMode {
    /// Mirror including the edge sample: `d c b a | a b c d | d c b a`.
    Reflect,
    /// Zeros outside the data.
    Constant,
}

/// Normalized Gaussian kernel truncated at `GAUSSIAN_TRUNCATE_SIGMAS`.
pub fn gaussian_kernel(sigma: f64) -> Array1<f64> {
    let radius = (GAUSSIAN_TRUNCATE_SIGMAS * sigma + 0.5) as usize;
    let mut kernel = Array1::from_shape_fn(2 * radius + 1, |i| {
        let x = i as f64 - radius as f64;
        (-0.5 * x * x / (sigma * sigma)).exp()
    });
    let sum = kernel.sum();
    kernel.mapv_inplace(|w| w / sum);
    kernel
}

fn reflect_index(index: isize, len: usize) -> usize {
    let period = 2 * len as isize;
    let mut i = index.rem_euclid(period);
    if i >= len as isize {
        i = period - i - 1;
    }
    i as usize
}

/// One-dimensional Gaussian smoothing. `sigma <= 0` returns the input unchanged.
pub fn gaussian_filter1d(data: ArrayView1<f64>, sigma: f64, mode: EdgeMode) -> Array1<f64> {
    let n = data.len();
    if n == 0 || !(sigma > 0.0) {
        return data.to_owned();
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    Array1::from_shape_fn(n, |i| {
        let mut acc = 0.0;
        for (k, w) in kernel.iter().enumerate() {
            let j = i as isize + k as isize - radius;
            let sample = if j >= 0 && (j as usize) < n {
                data[j as usize]
            } else {
                match mode {
                    EdgeMode::Constant => 0.0,
                    EdgeMode::Reflect => data[reflect_index(j, n)],
                }
            };
            acc += w * sample;
        }
        acc
    })
}

/// Applies `gaussian_filter1d` to every lane of `data` along `axis`.
pub fn gaussian_filter_axis(data: &Array2<f64>, sigma: f64, axis: Axis, mode: EdgeMode) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros(data.raw_dim());
    Zip::from(out.lanes_mut(axis))
        .and(data.lanes(axis))
        .for_each(|mut dst, src| dst.assign(&gaussian_filter1d(src, sigma, mode)));
    out
}
